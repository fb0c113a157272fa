//! Command implementations.
//!
//! - [`scan`] - Audit service principal secrets and certificates for upcoming expiry

pub mod scan;
