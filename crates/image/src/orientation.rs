//! EXIF orientation handling.

use crate::{detect_format, Result};
use image::DynamicImage;
use std::io::Cursor;

/// Pixel transform described by the EXIF `Orientation` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// 1: stored upright
    Normal,
    /// 2: mirrored left to right
    FlipHorizontal,
    /// 3: upside down
    Rotate180,
    /// 4: mirrored top to bottom
    FlipVertical,
    /// 5: mirrored along the main diagonal
    Transpose,
    /// 6: needs a quarter turn clockwise
    Rotate90,
    /// 7: mirrored along the anti-diagonal
    Transverse,
    /// 8: needs a quarter turn counter-clockwise
    Rotate270,
}

impl Orientation {
    /// Map a raw tag value; anything outside 1..=8 is ignored.
    pub fn from_exif(value: u32) -> Option<Self> {
        match value {
            1 => Some(Orientation::Normal),
            2 => Some(Orientation::FlipHorizontal),
            3 => Some(Orientation::Rotate180),
            4 => Some(Orientation::FlipVertical),
            5 => Some(Orientation::Transpose),
            6 => Some(Orientation::Rotate90),
            7 => Some(Orientation::Transverse),
            8 => Some(Orientation::Rotate270),
            _ => None,
        }
    }

    /// Whether width and height trade places.
    pub fn swaps_dimensions(&self) -> bool {
        matches!(
            self,
            Orientation::Transpose | Orientation::Rotate90 | Orientation::Transverse | Orientation::Rotate270
        )
    }

    /// Return the image as it is meant to be viewed.
    pub fn apply(&self, img: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Normal => img,
            Orientation::FlipHorizontal => img.fliph(),
            Orientation::Rotate180 => img.rotate180(),
            Orientation::FlipVertical => img.flipv(),
            Orientation::Transpose => img.rotate90().fliph(),
            Orientation::Rotate90 => img.rotate90(),
            Orientation::Transverse => img.rotate270().fliph(),
            Orientation::Rotate270 => img.rotate270(),
        }
    }
}

/// Read the orientation tag from an encoded image, if it has one.
pub(crate) fn read_orientation(data: &[u8]) -> Option<Orientation> {
    let mut cursor = Cursor::new(data);
    let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;

    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .and_then(Orientation::from_exif)
}

/// Decode an image and apply its EXIF orientation.
///
/// The decoded pixels carry no EXIF, so decoding the re-encoded output again
/// does not rotate twice.
pub fn decode_oriented(data: &[u8]) -> Result<DynamicImage> {
    let format = detect_format(data)?;
    let img = image::load_from_memory_with_format(data, format.into())?;

    Ok(match read_orientation(data) {
        Some(orientation) => orientation.apply(img),
        None => img,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    fn marked() -> DynamicImage {
        // 3x2, red pixel in the top-left corner
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        DynamicImage::ImageRgb8(img)
    }

    fn red_at(img: &DynamicImage) -> (u32, u32) {
        let rgb = img.to_rgb8();
        let (x, y, _) = rgb
            .enumerate_pixels()
            .find(|(_, _, p)| p.0 == [255, 0, 0])
            .unwrap();
        (x, y)
    }

    #[test]
    fn test_from_exif_range() {
        assert_eq!(Orientation::from_exif(1), Some(Orientation::Normal));
        assert_eq!(Orientation::from_exif(6), Some(Orientation::Rotate90));
        assert_eq!(Orientation::from_exif(0), None);
        assert_eq!(Orientation::from_exif(9), None);
    }

    #[test]
    fn test_quarter_turns_swap_dimensions() {
        for value in 1..=8 {
            let orientation = Orientation::from_exif(value).unwrap();
            let (w, h) = orientation.apply(marked()).dimensions();
            if orientation.swaps_dimensions() {
                assert_eq!((w, h), (2, 3), "orientation {}", value);
            } else {
                assert_eq!((w, h), (3, 2), "orientation {}", value);
            }
        }
    }

    #[test]
    fn test_corner_moves_where_expected() {
        assert_eq!(red_at(&Orientation::Normal.apply(marked())), (0, 0));
        assert_eq!(red_at(&Orientation::FlipHorizontal.apply(marked())), (2, 0));
        assert_eq!(red_at(&Orientation::Rotate180.apply(marked())), (2, 1));
        assert_eq!(red_at(&Orientation::FlipVertical.apply(marked())), (0, 1));
        assert_eq!(red_at(&Orientation::Transpose.apply(marked())), (0, 0));
        assert_eq!(red_at(&Orientation::Rotate90.apply(marked())), (1, 0));
        assert_eq!(red_at(&Orientation::Transverse.apply(marked())), (1, 2));
        assert_eq!(red_at(&Orientation::Rotate270.apply(marked())), (0, 2));
    }

    #[test]
    fn test_decode_without_exif() {
        let mut png = Vec::new();
        marked()
            .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();

        assert_eq!(read_orientation(&png), None);
        let decoded = decode_oriented(&png).unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(decode_oriented(b"not an image at all").is_err());
    }
}
