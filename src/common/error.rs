//! Error types for booker-verify
//!
//! Timeouts and field mismatches are normally returned as data by the
//! poller and the comparator. The variants here exist for callers that
//! escalate those results into failures, and for everything around them
//! (HTTP, configuration, scenario files).

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for booker-verify
#[derive(Error, Debug)]
pub enum Error {
    // === HTTP / API Errors ===
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    ApiStatus { status: u16, body: String },

    #[error("Unexpected API response: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid request: {0}")]
    InvalidInput(String),

    // === Polling Errors ===
    #[error("condition not met within {secs} seconds; last observed: {last_observed}")]
    ConditionTimeout { secs: u64, last_observed: String },

    #[error("Probe failed: {0}")]
    Probe(String),

    // === Comparison Errors ===
    #[error("{count} field(s) differ:\n{report}")]
    Mismatch { count: usize, report: String },

    // === Token Errors ===
    #[error("Token '{0}' was already issued during this run")]
    DuplicateToken(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Test Errors ===
    #[error("Invalid test scenario: {0}")]
    Scenario(String),

    #[error("Test assertion failed: {0}")]
    TestAssertion(String),
}

impl Error {
    /// Create a condition timeout error from the configured wait and the
    /// last value the probe produced
    pub fn condition_timeout(max_wait: Duration, last_observed: impl Into<String>) -> Self {
        Self::ConditionTimeout {
            secs: max_wait.as_secs(),
            last_observed: last_observed.into(),
        }
    }

    /// Create an API status error
    pub fn api_status(status: u16, body: &str) -> Self {
        Self::ApiStatus {
            status,
            body: body.to_string(),
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Whether this error is worth retrying from inside a polling loop.
    ///
    /// Network failures and server-side statuses are; bad requests and
    /// local problems are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_) | Error::Probe(_) | Error::UnexpectedResponse(_) => true,
            Error::ApiStatus { status, .. } => *status >= 500 || *status == 404,
            Error::Json(_) => true,
            _ => false,
        }
    }
}
