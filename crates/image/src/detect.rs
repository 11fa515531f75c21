//! Container sniffing from leading bytes.

use crate::{ImageError, Result};

/// Image containers this crate can identify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG / JFIF
    Jpeg,
    /// PNG
    Png,
    /// GIF
    Gif,
    /// WebP (RIFF container)
    WebP,
    /// AVIF (ISO-BMFF container)
    Avif,
}

impl ImageFormat {
    /// MIME type used in `Content-Type`.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Avif => "image/avif",
        }
    }
}

impl From<ImageFormat> for image::ImageFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Gif => image::ImageFormat::Gif,
            ImageFormat::WebP => image::ImageFormat::WebP,
            ImageFormat::Avif => image::ImageFormat::Avif,
        }
    }
}

/// Fixed-offset signatures: (offset, bytes, format).
const SIGNATURES: &[(usize, &[u8], ImageFormat)] = &[
    (0, &[0xFF, 0xD8, 0xFF], ImageFormat::Jpeg),
    (0, b"\x89PNG\r\n\x1a\n", ImageFormat::Png),
    (0, b"GIF87a", ImageFormat::Gif),
    (0, b"GIF89a", ImageFormat::Gif),
    (8, b"WEBP", ImageFormat::WebP),
    (4, b"ftypavif", ImageFormat::Avif),
    (4, b"ftypavis", ImageFormat::Avif),
];

/// Identify the container from its leading bytes.
///
/// ```
/// use edgepix_image::{detect_format, ImageFormat};
///
/// let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
/// assert_eq!(detect_format(png).unwrap(), ImageFormat::Png);
/// ```
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < 4 {
        return Err(ImageError::InvalidData(format!(
            "{} bytes is too short to identify",
            data.len()
        )));
    }

    SIGNATURES
        .iter()
        .find(|(offset, magic, format)| {
            // WebP also needs the RIFF header in front of the brand
            let riff_ok = *format != ImageFormat::WebP || data.starts_with(b"RIFF");
            riff_ok && data.get(*offset..offset + magic.len()) == Some(*magic)
        })
        .map(|(_, _, format)| *format)
        .ok_or(ImageError::UnknownFormat)
}
