//! Days-remaining to severity mapping.

use super::types::Severity;

/// Last day (inclusive) that still counts as critical.
pub const CRITICAL_DAYS: i64 = 30;
/// Last day (inclusive) that still counts as a warning.
pub const WARNING_DAYS: i64 = 60;

/// Classify a signed day count. Total over `i64`.
pub fn classify(days_remaining: i64) -> Severity {
    if days_remaining < 0 {
        Severity::Expired
    } else if days_remaining <= CRITICAL_DAYS {
        Severity::Critical
    } else if days_remaining <= WARNING_DAYS {
        Severity::Warning
    } else {
        Severity::Healthy
    }
}
