//! Error types for fetching, decoding, notifying and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from turning a payload body into a snapshot.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Body is not the expected JSON shape.
    #[error("Malformed status payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The year-less `UTC` field could not be read.
    #[error("Unrecognised status timestamp: '{0}'")]
    Timestamp(String),

    /// An allow-listed detector does not appear in the payload.
    #[error("Detector '{0}' missing from status payload")]
    MissingDetector(String),

    /// A detector label was found but no status cell follows it.
    #[error("No status follows detector '{0}'")]
    MissingStatus(String),
}

/// Failure of a single upstream request, before any retry decision.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Worth retrying: rate limiting, server errors, timeouts, dropped connections.
    #[error("{0}")]
    Transient(String),

    /// Not worth retrying.
    #[error("{0}")]
    Fatal(String),
}

/// Outcome of a fetch that did not produce a snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every attempt failed transiently; the caller may try again later.
    #[error("Status source unavailable after {attempts} attempt(s): {reason}")]
    Retryable { attempts: u32, reason: String },

    /// The request cannot succeed as configured.
    #[error("Status fetch failed: {0}")]
    Fatal(String),

    /// The body arrived but could not be decoded.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Retryable { .. })
    }
}

/// Errors from delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Webhook request failed: {0}")]
    Http(String),

    #[error("Webhook rejected message: HTTP {status}")]
    Rejected { status: u16 },
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Http(err.to_string())
    }
}

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
