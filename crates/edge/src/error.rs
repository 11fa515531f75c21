//! Failure taxonomy for one interception.
//!
//! None of these ever escape the dispatcher as a fault. Each one maps to a
//! [`Disposition`] that says what the platform gets back instead.

use edgepix_image::ImageError;
use edgepix_origin_client::FetchError;
use thiserror::Error;

/// What the dispatcher does with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Return nothing; the platform proceeds on its own
    NoOp,
    /// Return the original request
    PassThrough,
    /// Return the fixed 504 response
    GatewayTimeout,
    /// Log and continue with a safer intermediate result
    Degrade,
}

/// Everything that can go wrong while intercepting a request.
#[derive(Debug, Error)]
pub enum EdgeError {
    #[error("Event carries no usable request: {0}")]
    MalformedEvent(String),

    #[error("Unsupported origin: {0}")]
    UnsupportedOrigin(String),

    #[error("Request is not eligible for transformation: {0}")]
    IneligibleRequest(&'static str),

    #[error("Upstream fetch failed: {0}")]
    FetchTimeout(#[from] FetchError),

    #[error("Unusable origin response (status {status}, content-type {content_type:?})")]
    UnusableOriginResponse {
        status: u16,
        content_type: Option<String>,
    },

    #[error("Resize failed: {0}")]
    ResizeFailure(#[source] ImageError),

    #[error("Optimization failed: {0}")]
    OptimizeFailure(String),

    #[error("Output of {size} bytes exceeds the {limit} byte ceiling")]
    OversizeOutput { size: usize, limit: usize },

    /// Anything not anticipated above
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EdgeError {
    /// How this failure surfaces to the platform.
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::MalformedEvent(_) => Disposition::NoOp,
            Self::UnsupportedOrigin(_)
            | Self::IneligibleRequest(_)
            | Self::UnusableOriginResponse { .. }
            | Self::OversizeOutput { .. }
            | Self::Internal(_) => Disposition::PassThrough,
            Self::FetchTimeout(_) => Disposition::GatewayTimeout,
            Self::ResizeFailure(_) | Self::OptimizeFailure(_) => Disposition::Degrade,
        }
    }

    /// Short machine-friendly label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedEvent(_) => "malformed_event",
            Self::UnsupportedOrigin(_) => "unsupported_origin",
            Self::IneligibleRequest(_) => "ineligible_request",
            Self::FetchTimeout(_) => "fetch_timeout",
            Self::UnusableOriginResponse { .. } => "unusable_origin_response",
            Self::ResizeFailure(_) => "resize_failure",
            Self::OptimizeFailure(_) => "optimize_failure",
            Self::OversizeOutput { .. } => "oversize_output",
            Self::Internal(_) => "internal",
        }
    }
}
