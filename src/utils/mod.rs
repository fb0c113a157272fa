//! Utility functions and helpers.
//!
//! - [`time`] - Timestamp normalization and day arithmetic
//! - [`format`] - Number and column formatting for reports
//! - [`progress`] - Spinner shown while pages are fetched
//!
//! # Examples
//!
//! ```
//! use sp_secret_audit::utils::time::{days_remaining, parse_timestamp};
//!
//! let now = parse_timestamp("2025-10-01T00:00:00Z").unwrap();
//! let expiry = parse_timestamp("2025-10-31T12:00:00Z").unwrap();
//! assert_eq!(days_remaining(&expiry, &now), 30);
//! ```

pub mod format;
pub mod progress;
pub mod time;
