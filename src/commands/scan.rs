//! Service principal secret expiry scan.
//!
//! Fetches every service principal from Microsoft Graph, classifies each
//! password and certificate credential by how soon it expires, and prints
//! or exports the ranked result.
//!
//! # Usage
//!
//! ```bash
//! # Console table (default)
//! sp-secret-audit scan
//!
//! # Only expired or critical (<= 30 days) credentials, exported as CSV
//! sp-secret-audit scan --critical-only --output risks.csv
//!
//! # Markdown report with the format inferred from the extension
//! sp-secret-audit scan --output report.md
//! ```
//!
//! # Requirements
//!
//! A Graph token with `Application.Read.All`, supplied by `--token`,
//! `GRAPH_TOKEN`, `GRAPH_TOKEN_FILE`, or an app registration
//! (`AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET`).
//!
//! # Output
//!
//! Records are sorted by days remaining, most urgent first:
//! - `EXPIRED` - already past expiry
//! - `CRITICAL` - 0 to 30 days left
//! - `WARNING` - 31 to 60 days left
//! - `HEALTHY` - more than 60 days left

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{supplier_from_options, TokenSupplier};
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::FetchError;
use crate::graph_api::{GraphClient, GraphConfig};
use crate::report::{self, ReportFormat};
use crate::scanner::{self, types::CredentialKind};
use crate::utils::format::format_number;
use crate::utils::progress::FetchSpinner;

/// Options for the `scan` command.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub format: ReportFormat,
    pub output: Option<String>,
    pub critical_only: bool,
    pub graph_url: Option<String>,
    pub token: Option<String>,
    pub show_progress: bool,
}

/// Logs through tracing and advances the fetch spinner.
struct CliDiagnostics {
    spinner: FetchSpinner,
    inner: TracingDiagnostics,
}

impl Diagnostics for CliDiagnostics {
    fn page_fetched(&self, page: usize, objects: usize) {
        self.spinner.add(objects);
        self.inner.page_fetched(page, objects);
    }

    fn retry_scheduled(&self, url: &str, attempt: u32, reason: &str, delay: Duration) {
        self.inner.retry_scheduled(url, attempt, reason, delay);
    }

    fn fetch_truncated(&self, objects_so_far: usize, error: &FetchError) {
        self.spinner.finish_and_clear();
        self.inner.fetch_truncated(objects_so_far, error);
    }

    fn credential_dropped(&self, object_id: &str, key_id: &str, kind: CredentialKind) {
        self.inner.credential_dropped(object_id, key_id, kind);
    }

    fn scan_complete(&self, objects: usize, records: usize) {
        self.spinner.finish_and_clear();
        self.inner.scan_complete(objects, records);
    }
}

pub async fn run(options: ScanOptions) -> Result<()> {
    let tokens = supplier_from_options(options.token.as_deref())
        .context("Authentication failed. Exiting.")?;
    run_with_tokens(options, tokens).await
}

/// Run the scan with an already chosen token supplier.
///
/// `options.token` is ignored here.
pub async fn run_with_tokens(options: ScanOptions, tokens: Arc<dyn TokenSupplier>) -> Result<()> {
    let client = GraphClient::new(GraphConfig::from_options(options.graph_url.as_deref()), tokens)?;

    tracing::info!("attempting authentication against {}", client.base_url());
    client
        .verify_credentials()
        .await
        .context("Authentication failed. Exiting.")?;
    tracing::info!("authentication successful");

    let spinner = if options.show_progress {
        FetchSpinner::new("Fetching service principals")
    } else {
        FetchSpinner::hidden()
    };
    let diagnostics = CliDiagnostics {
        spinner,
        inner: TracingDiagnostics,
    };

    // One evaluation instant for the whole report
    let now = Utc::now();
    let scan = scanner::scan(&client, now, &diagnostics).await?;

    if let Some(truncation) = &scan.truncation {
        tracing::warn!(
            attempts = truncation.attempts(),
            "report is incomplete: only {} service principals were retrieved ({})",
            format_number(scan.objects_scanned),
            truncation
        );
    }

    let mut records = scan.records;
    if options.critical_only {
        records.retain(|r| r.severity.is_actionable());
    }

    if options.format == ReportFormat::Table || options.output.is_none() {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        report::write_table(&mut handle, &records)?;
    }

    if let Some(path) = options.output.as_deref() {
        let (format, inferred_default) = ReportFormat::for_output_file(options.format, path);
        if inferred_default {
            tracing::warn!("unknown output format inferred from {}, defaulting to CSV", path);
        }
        report::export(path, format, &records, now)?;
        tracing::info!("{:?} report saved to {}", format, path);
    }

    Ok(())
}
