//! Encoding to the output formats the interceptor can serve.

use crate::{ImageError, ImageFormat, Result};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageEncoder};
use std::borrow::Cow;

/// Output encodings, listed from most to least preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// AVIF (requires the `avif` feature)
    Avif,
    /// Lossless WebP
    WebP,
    /// PNG with best compression and adaptive filtering
    Png,
    /// PNG tuned for speed, used for intermediate payloads
    PngFast,
}

impl OutputFormat {
    /// The container format produced.
    pub fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Avif => ImageFormat::Avif,
            OutputFormat::WebP => ImageFormat::WebP,
            OutputFormat::Png | OutputFormat::PngFast => ImageFormat::Png,
        }
    }

    /// MIME type of the encoded bytes.
    pub fn mime_type(&self) -> &'static str {
        self.image_format().mime_type()
    }

    /// Whether this build carries the encoder.
    pub fn is_available(&self) -> bool {
        match self {
            OutputFormat::Avif => cfg!(feature = "avif"),
            OutputFormat::WebP | OutputFormat::Png | OutputFormat::PngFast => true,
        }
    }
}

/// Encoder tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// AVIF speed, 1 (slowest) to 10 (fastest)
    pub avif_speed: u8,
    /// AVIF quality, 1 to 100
    pub avif_quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            avif_speed: 8,
            avif_quality: 70,
        }
    }
}

/// Encode a DynamicImage to bytes.
pub fn encode(img: &DynamicImage, format: OutputFormat, options: &EncodeOptions) -> Result<Vec<u8>> {
    if !format.is_available() {
        return Err(ImageError::Unsupported(format));
    }

    let pixels = to_8bit(img);
    let (width, height) = (pixels.width(), pixels.height());
    let color = pixels.color();
    let mut buffer = Vec::new();

    let written = match format {
        OutputFormat::Png => PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, FilterType::Adaptive)
            .write_image(pixels.as_bytes(), width, height, color),
        OutputFormat::PngFast => PngEncoder::new_with_quality(&mut buffer, CompressionType::Fast, FilterType::Sub)
            .write_image(pixels.as_bytes(), width, height, color),
        OutputFormat::WebP => WebPEncoder::new_lossless(&mut buffer).write_image(pixels.as_bytes(), width, height, color),
        OutputFormat::Avif => encode_avif(&mut buffer, &pixels, options),
    };

    written.map_err(|e| ImageError::Encode {
        format,
        message: e.to_string(),
    })?;

    if buffer.is_empty() {
        return Err(ImageError::Encode {
            format,
            message: "encoder produced no output".to_string(),
        });
    }

    Ok(buffer)
}

#[cfg(feature = "avif")]
fn encode_avif(buffer: &mut Vec<u8>, img: &DynamicImage, options: &EncodeOptions) -> image::ImageResult<()> {
    image::codecs::avif::AvifEncoder::new_with_speed_quality(buffer, options.avif_speed, options.avif_quality)
        .write_image(img.as_bytes(), img.width(), img.height(), img.color())
}

#[cfg(not(feature = "avif"))]
fn encode_avif(_buffer: &mut Vec<u8>, _img: &DynamicImage, _options: &EncodeOptions) -> image::ImageResult<()> {
    Err(image::ImageError::Unsupported(image::error::UnsupportedError::from(
        image::error::ImageFormatHint::Exact(image::ImageFormat::Avif),
    )))
}

/// Encoders here only accept 8-bit gray or RGB(A) buffers.
fn to_8bit(img: &DynamicImage) -> Cow<'_, DynamicImage> {
    match img {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => Cow::Borrowed(img),
        other if other.color().has_alpha() => Cow::Owned(DynamicImage::ImageRgba8(other.to_rgba8())),
        other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    }
}
