//! Error types for the scan pipeline.
//!
//! Only authentication problems are fatal. Fetch failures are carried as a
//! [`FetchError`] value inside the walk result so a scan can still report on
//! whatever was retrieved before the failure.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure to obtain a bearer token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token source was configured.
    #[error("no Graph credentials configured: {0}")]
    MissingCredentials(String),

    /// The token endpoint could not be reached or rejected the request.
    #[error("token request failed: {0}")]
    TokenRequest(String),

    /// The token file could not be read.
    #[error("failed to read token file {path}: {source}")]
    TokenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Why a paginated walk stopped before the collection was exhausted.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or body-read failure that outlived the retry budget.
    #[error("transport error after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("Graph API request failed with status {status} after {attempts} attempt(s): {message}")]
    Status {
        status: StatusCode,
        attempts: u32,
        message: String,
    },

    /// The body was not a valid collection page.
    #[error("failed to decode page from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Number of HTTP attempts spent before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Transport { attempts, .. } | Self::Status { attempts, .. } => *attempts,
            Self::Decode { .. } => 1,
        }
    }
}

/// Fatal scan error.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type ScanResult<T> = Result<T, ScanError>;
