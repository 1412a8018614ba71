//! Error types for spending lookups.
//!
//! Everything below the CLI returns [`ApiError`]; `main` wraps it in
//! `anyhow` for reporting.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while talking to the spending API or loading the directory.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with something other than HTTP 200.
    #[error("USAspending API returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// The body was not the JSON shape we expected.
    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read agency directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed agency directory: {0}")]
    Csv(#[from] csv::Error),

    #[error("agency directory: {0}")]
    Directory(String),

    #[error("invalid fiscal year range {first}-{last}")]
    InvalidRange { first: i32, last: i32 },

    #[error("unknown agency: {0}")]
    UnknownAgency(String),

    #[error("In order to compare, you have to choose a different agency!")]
    SameAgency,

    #[error("Sorry, no data was found for {0}!")]
    NoData(String),
}

impl ApiError {
    /// True when the error means "nothing to show" rather than a failure.
    pub fn is_no_data(&self) -> bool {
        matches!(self, ApiError::Status { .. } | ApiError::NoData(_))
    }
}
