//! The classify-and-rank half of the scan pipeline.
//!
//! - [`types`] - Directory object payloads and risk records
//! - [`extract`] - Credential discovery on one object
//! - [`severity`] - Days-remaining to severity mapping
//!
//! [`aggregate`] ties them together: it walks every object, drops
//! credentials without a usable expiry, classifies the rest against a single
//! evaluation instant and ranks the result by urgency. [`scan`] runs the
//! fetch in front of it.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use sp_secret_audit::diagnostics::NoopDiagnostics;
//! use sp_secret_audit::scanner::aggregate;
//! use sp_secret_audit::scanner::types::{Severity, ServicePrincipal};
//!
//! let objects: Vec<ServicePrincipal> = serde_json::from_str(r#"[{
//!     "id": "sp-1",
//!     "displayName": "Billing",
//!     "passwordCredentials": [{"keyId": "k1", "endDateTime": "2025-01-10T00:00:00Z"}]
//! }]"#).unwrap();
//!
//! let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
//! let records = aggregate(&objects, now, &NoopDiagnostics);
//! assert_eq!(records[0].days_remaining, 9);
//! assert_eq!(records[0].severity, Severity::Critical);
//! ```

pub mod extract;
pub mod severity;
pub mod types;

use chrono::{DateTime, Utc};

use crate::diagnostics::Diagnostics;
use crate::error::{FetchError, ScanResult};
use crate::graph_api::GraphClient;
use crate::utils::time::{days_remaining, parse_timestamp};
use types::{RiskRecord, ServicePrincipal, Severity, UNKNOWN};

/// Build risk records for every credential in `objects`, ranked by days remaining.
///
/// `now` is the single evaluation instant for the whole run. Credentials whose
/// expiry is absent or unparseable are skipped. Ties keep discovery order.
pub fn aggregate(
    objects: &[ServicePrincipal],
    now: DateTime<Utc>,
    diagnostics: &dyn Diagnostics,
) -> Vec<RiskRecord> {
    let mut records = Vec::new();

    for sp in objects {
        for entry in extract::extract(sp) {
            let key_id = entry.key_id.unwrap_or(UNKNOWN);
            let Some(expiry) = entry.raw_expiry.and_then(parse_timestamp) else {
                diagnostics.credential_dropped(sp.id_or_unknown(), key_id, entry.kind);
                continue;
            };

            let days = days_remaining(&expiry, &now);
            records.push(RiskRecord {
                sp_name: sp.display_name_or_unknown().to_string(),
                app_id: sp.app_id_or_unknown().to_string(),
                sp_object_id: sp.id_or_unknown().to_string(),
                secret_id: key_id.to_string(),
                secret_type: entry.kind,
                expiry_date: expiry,
                days_remaining: days,
                severity: severity::classify(days),
            });
        }
    }

    // sort_by_key is stable
    records.sort_by_key(|record| record.days_remaining);

    diagnostics.scan_complete(objects.len(), records.len());
    records
}

/// Outcome of one scan run.
#[derive(Debug)]
pub struct ScanReport {
    pub records: Vec<RiskRecord>,
    pub objects_scanned: usize,
    pub evaluated_at: DateTime<Utc>,
    /// Set when pagination stopped early; `records` then covers only the
    /// objects retrieved before the failure.
    pub truncation: Option<FetchError>,
}

impl ScanReport {
    pub fn is_complete(&self) -> bool {
        self.truncation.is_none()
    }

    pub fn summary(&self) -> SeveritySummary {
        SeveritySummary::from_records(&self.records)
    }
}

/// Fetch every service principal and rank its credentials against `now`.
///
/// Only authentication failures are returned as errors; a truncated fetch is
/// reported through [`ScanReport::truncation`].
pub async fn scan(
    client: &GraphClient,
    now: DateTime<Utc>,
    diagnostics: &dyn Diagnostics,
) -> ScanResult<ScanReport> {
    let walk = client.service_principals(diagnostics).await?;
    let records = aggregate(&walk.items, now, diagnostics);

    Ok(ScanReport {
        records,
        objects_scanned: walk.items.len(),
        evaluated_at: now,
        truncation: walk.truncation,
    })
}

/// Record counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeveritySummary {
    pub expired: usize,
    pub critical: usize,
    pub warning: usize,
    pub healthy: usize,
}

impl SeveritySummary {
    pub fn from_records(records: &[RiskRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.severity {
                Severity::Expired => summary.expired += 1,
                Severity::Critical => summary.critical += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Healthy => summary.healthy += 1,
            }
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Expired => self.expired,
            Severity::Critical => self.critical,
            Severity::Warning => self.warning,
            Severity::Healthy => self.healthy,
        }
    }

    pub fn total(&self) -> usize {
        self.expired + self.critical + self.warning + self.healthy
    }
}
