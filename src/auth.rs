//! Bearer token suppliers for Microsoft Graph.
//!
//! The fetcher asks a [`TokenSupplier`] for a token before every request and
//! never caches tokens itself. Exactly one supplier is chosen at startup by
//! [`supplier_from_options`]:
//!
//! 1. A pre-acquired token (`--token`, `GRAPH_TOKEN` or `GRAPH_TOKEN_FILE`)
//! 2. The OAuth2 client-credentials flow (`AZURE_TENANT_ID`,
//!    `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET`, optional `AZURE_AUTHORITY_HOST`)

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::env;
use std::fs;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::AuthError;
use crate::graph_api::DEFAULT_TIMEOUT;

/// Default Graph scope for application permissions.
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Default Entra ID authority.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Produces a bearer token for a scope.
#[async_trait]
pub trait TokenSupplier: Send + Sync {
    async fn bearer_token(&self, scope: &str) -> Result<String, AuthError>;
}

/// Hands out the same pre-acquired token for every scope.
#[derive(Clone)]
pub struct StaticTokenSupplier {
    token: String,
}

impl StaticTokenSupplier {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenSupplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenSupplier")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl TokenSupplier for StaticTokenSupplier {
    async fn bearer_token(&self, _scope: &str) -> Result<String, AuthError> {
        Ok(self.token.clone())
    }
}

/// App registration used for the client-credentials flow.
#[derive(Clone)]
pub struct ClientCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    scope: String,
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_usable(&self, scope: &str, grace_period: Duration) -> bool {
        self.scope == scope && Utc::now() + grace_period < self.expires_at
    }
}

/// Client-credentials supplier with an in-memory token cache.
#[derive(Debug)]
pub struct ClientCredentialsSupplier {
    credentials: ClientCredentials,
    authority: String,
    http_client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
    /// Refresh this long before the token expires.
    grace_period: Duration,
}

impl ClientCredentialsSupplier {
    pub fn new(credentials: ClientCredentials, authority: &str) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| AuthError::TokenRequest(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            authority: authority.trim_end_matches('/').to_string(),
            http_client,
            cached: Mutex::new(None),
            grace_period: Duration::minutes(5),
        })
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority, self.credentials.tenant_id
        )
    }

    async fn acquire(&self, scope: &str) -> Result<CachedToken, AuthError> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", scope),
        ];

        let response = self
            .http_client
            .post(self.token_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::TokenRequest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenRequest(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::TokenRequest(format!("invalid token response: {}", e)))?;

        let expires_at = Duration::try_seconds(token.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::TokenRequest(format!("invalid expires_in: {}", token.expires_in))
            })?;
        tracing::debug!(
            "acquired Graph token, expires at {}",
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        Ok(CachedToken {
            scope: scope.to_string(),
            access_token: token.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenSupplier for ClientCredentialsSupplier {
    async fn bearer_token(&self, scope: &str) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_usable(scope, self.grace_period) {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.acquire(scope).await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }
}

/// Where the bearer token comes from, before any network call.
#[derive(Debug, Clone)]
pub enum TokenSource {
    Static(String),
    ClientCredentials {
        credentials: ClientCredentials,
        authority: String,
    },
}

impl TokenSource {
    /// Resolve a token source from a CLI flag and an environment lookup.
    ///
    /// A flag wins over `GRAPH_TOKEN`, which wins over `GRAPH_TOKEN_FILE`,
    /// which wins over the client-credentials variables.
    pub fn resolve<F>(token_flag: Option<&str>, lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = token_flag.filter(|t| !t.trim().is_empty()) {
            return Ok(Self::Static(token.trim().to_string()));
        }

        if let Some(token) = non_empty("GRAPH_TOKEN") {
            return Ok(Self::Static(token.trim().to_string()));
        }

        if let Some(path) = non_empty("GRAPH_TOKEN_FILE") {
            let token = fs::read_to_string(&path)
                .map_err(|source| AuthError::TokenFile {
                    path: path.clone(),
                    source,
                })?
                .trim()
                .to_string();
            return Ok(Self::Static(token));
        }

        match (
            non_empty("AZURE_TENANT_ID"),
            non_empty("AZURE_CLIENT_ID"),
            non_empty("AZURE_CLIENT_SECRET"),
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                Ok(Self::ClientCredentials {
                    credentials: ClientCredentials {
                        tenant_id,
                        client_id,
                        client_secret,
                    },
                    authority: non_empty("AZURE_AUTHORITY_HOST")
                        .unwrap_or_else(|| DEFAULT_AUTHORITY.to_string()),
                })
            }
            _ => Err(AuthError::MissingCredentials(
                "provide a token via:\n\
                 - Command-line: --token eyJ0eXAi...\n\
                 - Environment variable: export GRAPH_TOKEN=eyJ0eXAi...\n\
                 - Token file: export GRAPH_TOKEN_FILE=/path/to/token\n\
                 - App registration: AZURE_TENANT_ID, AZURE_CLIENT_ID and AZURE_CLIENT_SECRET"
                    .to_string(),
            )),
        }
    }

    pub fn into_supplier(self) -> Result<Arc<dyn TokenSupplier>, AuthError> {
        let supplier: Arc<dyn TokenSupplier> = match self {
            Self::Static(token) => Arc::new(StaticTokenSupplier::new(token)),
            Self::ClientCredentials {
                credentials,
                authority,
            } => Arc::new(ClientCredentialsSupplier::new(credentials, &authority)?),
        };
        Ok(supplier)
    }
}

/// Pick the token supplier for this run from the CLI flag and process environment.
pub fn supplier_from_options(
    token_flag: Option<&str>,
) -> Result<Arc<dyn TokenSupplier>, AuthError> {
    TokenSource::resolve(token_flag, |name| env::var(name).ok())?.into_supplier()
}
