//! HTTP client error types

use thiserror::Error;

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, HttpError>;

/// HTTP client errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network request failed
    #[error("Network request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid proxy configuration
    #[error("Invalid proxy configuration: {0}")]
    InvalidProxy(String),

    /// HTTP error status
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        status: reqwest::StatusCode,
        message: String,
    },

    /// Request body could not be encoded
    #[error("Failed to encode request body: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client build error
    #[error("Failed to build HTTP client: {0}")]
    BuildError(String),

    /// No host was configured to send the request to
    #[error("No hosts configured")]
    NoHosts,
}

impl HttpError {
    /// Check if the request never reached a server.
    ///
    /// Only these failures are worth sending to another host: once a server has
    /// answered, the request may already have been applied.
    pub fn is_connect(&self) -> bool {
        match self {
            HttpError::RequestFailed(e) => e.is_connect(),
            _ => false,
        }
    }

    /// Status code reported by the server, if any
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            HttpError::HttpStatus { status, .. } => Some(*status),
            HttpError::RequestFailed(e) => e.status(),
            _ => None,
        }
    }
}
