use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Naive layouts accepted when the text carries no offset. These are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO 8601 timestamp into UTC.
///
/// A trailing `Z` is the same as `+00:00`, and text without an offset is
/// assumed to be UTC. Anything unparseable yields `None`; callers treat that
/// as "no usable expiry" rather than an error.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let ts = raw.trim();
    if ts.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }

    // Offsets without a colon, e.g. "+0000"
    if let Ok(dt) = DateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(ts, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(ts, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Whole days from `now` until `expiry`, rounded toward negative infinity.
///
/// Half a day left is 0; half a day overdue is -1.
pub fn days_remaining(expiry: &DateTime<Utc>, now: &DateTime<Utc>) -> i64 {
    let delta = expiry.signed_duration_since(*now);
    let days = delta.num_days();
    if delta < Duration::days(days) {
        days - 1
    } else {
        days
    }
}

/// Format a timestamp for display
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
