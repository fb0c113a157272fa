//! Diagnostics handle threaded through the scan pipeline.
//!
//! Components never log through a global; they report events to whatever
//! [`Diagnostics`] the caller hands in. The CLI uses [`TracingDiagnostics`],
//! tests can record events, and library users can route them anywhere.

use std::time::Duration;

use crate::error::FetchError;
use crate::scanner::types::CredentialKind;

/// Receiver for pipeline events.
///
/// Every method has an empty default so implementors only override what
/// they care about.
pub trait Diagnostics: Send + Sync {
    /// A page was decoded. `page` is 1-based.
    fn page_fetched(&self, _page: usize, _objects: usize) {}

    /// A request failed in a retryable way and will be attempted again.
    fn retry_scheduled(&self, _url: &str, _attempt: u32, _reason: &str, _delay: Duration) {}

    /// The walk stopped early and the scan continues on partial data.
    fn fetch_truncated(&self, _objects_so_far: usize, _error: &FetchError) {}

    /// A credential entry was skipped because its expiry was absent or unparseable.
    fn credential_dropped(&self, _object_id: &str, _key_id: &str, _kind: CredentialKind) {}

    /// Aggregation finished.
    fn scan_complete(&self, _objects: usize, _records: usize) {}
}

/// Forwards pipeline events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn page_fetched(&self, page: usize, objects: usize) {
        tracing::debug!(page, objects, "fetched page of service principals");
    }

    fn retry_scheduled(&self, url: &str, attempt: u32, reason: &str, delay: Duration) {
        tracing::warn!(%url, attempt, ?delay, "retrying request: {reason}");
    }

    fn fetch_truncated(&self, objects_so_far: usize, error: &FetchError) {
        tracing::warn!(
            objects_so_far,
            "error fetching service principals, continuing with partial results: {error}"
        );
    }

    fn credential_dropped(&self, object_id: &str, key_id: &str, kind: CredentialKind) {
        tracing::debug!(object_id, key_id, %kind, "skipping credential without a usable expiry");
    }

    fn scan_complete(&self, objects: usize, records: usize) {
        tracing::info!(objects, records, "analysis complete");
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {}
