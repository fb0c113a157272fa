//! Microsoft Graph client with retrying, paginated collection reads.
//!
//! [`GraphClient::fetch_all`] walks an OData collection by following
//! `@odata.nextLink`. The `$select` query is sent on the first request only;
//! continuation links already carry it and are fetched verbatim. A page that
//! cannot be retrieved ends the walk early, and the objects gathered so far
//! are returned alongside the reason.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{TokenSupplier, GRAPH_SCOPE};
use crate::diagnostics::Diagnostics;
use crate::error::{AuthError, FetchError, ScanError, ScanResult};
use crate::scanner::types::ServicePrincipal;

/// Default Graph API root.
pub const GRAPH_API_URL: &str = "https://graph.microsoft.com/v1.0";

/// Collection holding the service principals.
pub const SERVICE_PRINCIPALS_ENDPOINT: &str = "/servicePrincipals";

/// Fields needed to audit service principal credentials.
pub const SERVICE_PRINCIPAL_FIELDS: &[&str] = &[
    "id",
    "appId",
    "displayName",
    "passwordCredentials",
    "keyCredentials",
];

/// Per-call retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per HTTP call, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each retry after that.
    pub backoff_factor: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_factor: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_factor
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Server errors worth another try.
    pub fn is_retryable_status(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::INTERNAL_SERVER_ERROR
                | StatusCode::BAD_GATEWAY
                | StatusCode::GATEWAY_TIMEOUT
        )
    }
}

/// Per-request timeout for Graph and token endpoint calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`GraphClient`].
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub base_url: String,
    pub scope: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: GRAPH_API_URL.to_string(),
            scope: GRAPH_SCOPE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl GraphConfig {
    /// Build a config from CLI options, falling back to `GRAPH_API_URL` and
    /// `GRAPH_SCOPE` in the environment, then to the public cloud defaults.
    pub fn from_options(graph_url: Option<&str>) -> Self {
        let base_url = graph_url
            .map(|s| s.to_string())
            .or_else(|| env::var("GRAPH_API_URL").ok())
            .unwrap_or_else(|| GRAPH_API_URL.to_string());
        let scope = env::var("GRAPH_SCOPE").unwrap_or_else(|_| GRAPH_SCOPE.to_string());

        Self {
            base_url,
            scope,
            ..Self::default()
        }
    }
}

/// One page of an OData collection.
#[derive(Debug, Deserialize)]
pub struct ODataPage<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ODataError {
    error: ODataErrorBody,
}

#[derive(Debug, Deserialize)]
struct ODataErrorBody {
    code: String,
    message: String,
}

/// Objects gathered by a collection walk.
#[derive(Debug)]
pub struct PageWalk<T> {
    pub items: Vec<T>,
    /// Pages successfully decoded.
    pub pages: usize,
    /// Why the walk stopped early, if it did.
    pub truncation: Option<FetchError>,
}

impl<T> PageWalk<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            pages: 0,
            truncation: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.truncation.is_none()
    }
}

enum CallError {
    Auth(AuthError),
    Fetch(FetchError),
}

/// A failed attempt that may be retried.
enum RetryableFailure {
    Transport(reqwest::Error),
    Status(StatusCode, String),
}

impl RetryableFailure {
    fn describe(&self) -> String {
        match self {
            Self::Transport(e) => e.to_string(),
            Self::Status(status, _) => format!("server returned {}", status),
        }
    }

    fn into_error(self, attempts: u32) -> FetchError {
        match self {
            Self::Transport(source) => FetchError::Transport { attempts, source },
            Self::Status(status, message) => FetchError::Status {
                status,
                attempts,
                message,
            },
        }
    }
}

/// Graph API client
pub struct GraphClient {
    base_url: String,
    scope: String,
    retry: RetryPolicy,
    client: Client,
    tokens: Arc<dyn TokenSupplier>,
}

impl GraphClient {
    pub fn new(config: GraphConfig, tokens: Arc<dyn TokenSupplier>) -> ScanResult<Self> {
        if config.retry.max_attempts == 0 {
            return Err(ScanError::Config(
                "retry policy needs at least one attempt".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScanError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            scope: config.scope,
            retry: config.retry,
            client,
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Obtain a token once, so bad credentials fail before any output.
    pub async fn verify_credentials(&self) -> ScanResult<()> {
        self.tokens.bearer_token(&self.scope).await?;
        Ok(())
    }

    /// Walk every page of `endpoint` (relative to the base URL).
    ///
    /// Returns `Err` only when the token supplier fails. Any other failure
    /// stops the walk and is recorded in [`PageWalk::truncation`].
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        select: &[&str],
        diagnostics: &dyn Diagnostics,
    ) -> ScanResult<PageWalk<T>> {
        let mut url = format!("{}{}", self.base_url, endpoint);
        let select_query = [("$select", select.join(","))];
        let mut query = (!select.is_empty()).then_some(&select_query[..]);
        let mut walk = PageWalk::new();

        loop {
            match self.get_page::<T>(&url, query.take(), diagnostics).await {
                Ok(page) => {
                    walk.pages += 1;
                    diagnostics.page_fetched(walk.pages, page.value.len());
                    walk.items.extend(page.value);

                    match page.next_link.filter(|link| !link.is_empty()) {
                        Some(next) => url = next,
                        None => break,
                    }
                }
                Err(CallError::Auth(e)) => return Err(e.into()),
                Err(CallError::Fetch(e)) => {
                    diagnostics.fetch_truncated(walk.items.len(), &e);
                    walk.truncation = Some(e);
                    break;
                }
            }
        }

        Ok(walk)
    }

    /// Walk `/servicePrincipals` with the credential field selection.
    pub async fn service_principals(
        &self,
        diagnostics: &dyn Diagnostics,
    ) -> ScanResult<PageWalk<ServicePrincipal>> {
        tracing::info!("fetching service principals from {}", self.base_url);
        let walk = self
            .fetch_all(SERVICE_PRINCIPALS_ENDPOINT, SERVICE_PRINCIPAL_FIELDS, diagnostics)
            .await?;
        tracing::info!("total service principals fetched: {}", walk.items.len());
        Ok(walk)
    }

    /// GET one page, retrying transport failures and retryable statuses.
    async fn get_page<T: DeserializeOwned>(
        &self,
        url: &str,
        query: Option<&[(&str, String)]>,
        diagnostics: &dyn Diagnostics,
    ) -> Result<ODataPage<T>, CallError> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let token = self
                .tokens
                .bearer_token(&self.scope)
                .await
                .map_err(CallError::Auth)?;

            let mut request = self.client.get(url).bearer_auth(&token);
            if let Some(query) = query {
                request = request.query(query);
            }

            let failure = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.text().await {
                            Ok(body) => {
                                return serde_json::from_str(&body).map_err(|source| {
                                    CallError::Fetch(FetchError::Decode {
                                        url: url.to_string(),
                                        source,
                                    })
                                });
                            }
                            Err(e) => RetryableFailure::Transport(e),
                        }
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        let message = error_message(status, &body);
                        if !RetryPolicy::is_retryable_status(status) {
                            return Err(CallError::Fetch(FetchError::Status {
                                status,
                                attempts: attempt,
                                message,
                            }));
                        }
                        RetryableFailure::Status(status, message)
                    }
                }
                // Malformed URLs and the like will not improve on retry
                Err(e) if e.is_builder() => {
                    return Err(CallError::Fetch(FetchError::Transport {
                        attempts: attempt,
                        source: e,
                    }));
                }
                Err(e) => RetryableFailure::Transport(e),
            };

            if attempt >= self.retry.max_attempts {
                return Err(CallError::Fetch(failure.into_error(attempt)));
            }

            let delay = self.retry.delay_after(attempt);
            diagnostics.retry_scheduled(url, attempt, &failure.describe(), delay);
            tokio::time::sleep(delay).await;
        }
    }
}

/// Prefer the OData error code and message over the raw body.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(odata) = serde_json::from_str::<ODataError>(body) {
        return format!("{}: {}", odata.error.code, odata.error.message);
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string()
    } else {
        body.to_string()
    }
}
