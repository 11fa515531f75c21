//! Failures surfaced by decode and encode.

use crate::OutputFormat;
use thiserror::Error;

/// Shorthand used across this crate.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Why an image operation did not produce pixels or bytes.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Leading bytes match no known container
    #[error("unrecognized image container")]
    UnknownFormat,

    /// Input is too short or otherwise not an image
    #[error("not an image: {0}")]
    InvalidData(String),

    /// Encoder for this format was not compiled in
    #[error("no {0:?} encoder in this build")]
    Unsupported(OutputFormat),

    /// Encoder ran and failed
    #[error("{format:?} encoding failed: {message}")]
    Encode {
        /// Format that was attempted
        format: OutputFormat,
        /// Encoder message
        message: String,
    },

    /// Decoder rejected the container contents
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
}
