//! Error types for the origin client

use std::time::Duration;
use thiserror::Error;

/// Result type alias for origin operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Origin client errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed before a complete response arrived
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The upstream did not answer within the deadline
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if this error is a deadline overrun
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Request(e) => e.is_timeout(),
            Self::Config(_) | Self::InvalidUrl(_) => false,
        }
    }

    /// Classify a reqwest error against the configured deadline
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Request(err)
        }
    }
}
