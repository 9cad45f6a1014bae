//! Fetch error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when fetching from the network.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Failed to send the request.
    #[error("Request failed: {0}")]
    Request(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Could not connect to the remote host.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Deadline exceeded.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Failed to parse the response body.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e.to_string())
    }
}
