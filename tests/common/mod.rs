//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sp_secret_audit::auth::TokenSupplier;
use sp_secret_audit::diagnostics::Diagnostics;
use sp_secret_audit::error::{AuthError, FetchError};
use sp_secret_audit::graph_api::{GraphClient, GraphConfig, RetryPolicy};
use sp_secret_audit::scanner::types::CredentialKind;

/// Selection string the fetcher sends on the first page.
pub const SELECT: &str = "id,appId,displayName,passwordCredentials,keyCredentials";

/// Hands out numbered tokens and counts how often it was asked.
#[derive(Default)]
pub struct CountingSupplier {
    calls: AtomicUsize,
}

impl CountingSupplier {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSupplier for CountingSupplier {
    async fn bearer_token(&self, _scope: &str) -> Result<String, AuthError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("token-{}", n))
    }
}

/// Succeeds `ok_calls` times, then fails every call.
pub struct FailingSupplier {
    ok_calls: usize,
    calls: AtomicUsize,
}

impl FailingSupplier {
    pub fn after(ok_calls: usize) -> Self {
        Self {
            ok_calls,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TokenSupplier for FailingSupplier {
    async fn bearer_token(&self, _scope: &str) -> Result<String, AuthError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.ok_calls {
            Ok("token".to_string())
        } else {
            Err(AuthError::TokenRequest("AADSTS7000215: Invalid client secret".to_string()))
        }
    }
}

/// Records the events a scan reports.
#[derive(Default)]
pub struct RecordingDiagnostics {
    pub pages: Mutex<Vec<(usize, usize)>>,
    pub retries: Mutex<Vec<u32>>,
    pub truncations: Mutex<Vec<usize>>,
    pub dropped: Mutex<Vec<String>>,
}

impl Diagnostics for RecordingDiagnostics {
    fn page_fetched(&self, page: usize, objects: usize) {
        self.pages.lock().unwrap().push((page, objects));
    }

    fn retry_scheduled(&self, _url: &str, attempt: u32, _reason: &str, _delay: Duration) {
        self.retries.lock().unwrap().push(attempt);
    }

    fn fetch_truncated(&self, objects_so_far: usize, _error: &FetchError) {
        self.truncations.lock().unwrap().push(objects_so_far);
    }

    fn credential_dropped(&self, _object_id: &str, key_id: &str, _kind: CredentialKind) {
        self.dropped.lock().unwrap().push(key_id.to_string());
    }
}

/// Client against a mock server with a near-zero backoff.
pub fn client_for(server_uri: &str, tokens: Arc<dyn TokenSupplier>) -> GraphClient {
    let config = GraphConfig {
        base_url: format!("{}/v1.0", server_uri),
        retry: RetryPolicy {
            max_attempts: 3,
            backoff_factor: Duration::from_millis(1),
        },
        ..GraphConfig::default()
    };
    GraphClient::new(config, tokens).unwrap()
}

/// A service principal with one password credential.
pub fn create_test_sp(id: &str, end_date_time: &str) -> Value {
    json!({
        "id": id,
        "appId": format!("app-{}", id),
        "displayName": format!("SP {}", id),
        "passwordCredentials": [{"keyId": format!("{}-pw", id), "endDateTime": end_date_time}],
        "keyCredentials": []
    })
}

/// Wraps items in an OData page.
pub fn create_odata_page(items: Vec<Value>, next_link: Option<&str>) -> Value {
    let mut page = json!({ "value": items });
    if let Some(link) = next_link {
        page["@odata.nextLink"] = json!(link);
    }
    page
}
