//! # SP Secret Audit
//!
//! Audits Microsoft Entra ID service principals for client secrets and
//! certificates that are near or past expiry, and ranks them by urgency.
//!
//! ## Overview
//!
//! A scan is a straight pipeline:
//!
//! 1. A [`auth::TokenSupplier`] hands out a Graph bearer token
//! 2. [`graph_api::GraphClient`] walks `/servicePrincipals` page by page,
//!    retrying transient failures
//! 3. [`scanner::extract`] lists each object's password and certificate
//!    credentials
//! 4. [`scanner::severity`] classifies each credential by days remaining
//! 5. [`scanner::aggregate`] ranks every record, most urgent first
//!
//! The evaluation instant is captured once per scan and passed in
//! explicitly, so a whole report is classified against the same "now".
//!
//! ## Severity Levels
//!
//! | Days remaining | Severity |
//! |---|---|
//! | below 0 | `EXPIRED` |
//! | 0 to 30 | `CRITICAL` |
//! | 31 to 60 | `WARNING` |
//! | above 60 | `HEALTHY` |
//!
//! ## Failure Handling
//!
//! - Token acquisition failures abort the scan before any output
//! - A page that fails after its retries stops pagination; the scan
//!   continues on the objects already fetched and reports the truncation
//! - Credentials with a missing or unparseable expiry are skipped
//!
//! ## Architecture
//!
//! - [`auth`] - Token suppliers (static token, client credentials)
//! - [`graph_api`] - Graph client with retry and pagination
//! - [`scanner`] - Credential extraction, classification and ranking
//! - [`report`] - Table, CSV, JSON and Markdown renderers
//! - [`diagnostics`] - Injectable event sink for the pipeline
//! - [`commands`] - CLI command implementations
//! - [`utils`] - Shared time and formatting helpers
//!
//! ## Example Usage
//!
//! ```bash
//! # Console table of every credential
//! sp-secret-audit scan
//!
//! # Only expired or critical credentials, exported as JSON
//! sp-secret-audit scan --critical-only --format json --output risks.json
//!
//! # Verbose logging, token from the environment
//! GRAPH_TOKEN=eyJ0eXAi... sp-secret-audit scan --verbose
//! ```

pub mod auth;
pub mod commands;
pub mod diagnostics;
pub mod error;
pub mod graph_api;
pub mod report;
pub mod scanner;
pub mod utils;
