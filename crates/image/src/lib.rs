//! Image codec capability for edgepix.
//!
//! This crate provides:
//! - Format detection from magic bytes
//! - EXIF orientation-aware decoding
//! - Bounding-box fit math and aspect-preserving resize
//! - Alpha channel removal (three-channel conversion)
//! - Encoding to AVIF, WebP and PNG with per-format failure reporting
//!
//! It holds no policy: which steps run, and in which order, is decided by
//! the caller.

#![warn(missing_docs)]

mod alpha;
mod detect;
mod encode;
mod error;
mod fit;
mod orientation;
mod resize;

pub use alpha::{flatten_onto, to_rgb, WHITE};
pub use detect::{detect_format, ImageFormat};
pub use encode::{encode, EncodeOptions, OutputFormat};
pub use error::{ImageError, Result};
pub use fit::{fit_within, target_box};
pub use orientation::{decode_oriented, Orientation};
pub use resize::{resize_to_box, resize_to_fit};

pub use image::DynamicImage;
