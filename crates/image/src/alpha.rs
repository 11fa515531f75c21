//! Flattening to three channels.

use image::{DynamicImage, Rgb, RgbImage};

/// Matte used under transparent pixels.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Composite `img` over a solid `matte`, dropping the alpha channel.
pub fn flatten_onto(img: &DynamicImage, matte: Rgb<u8>) -> RgbImage {
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([
            blend(r, matte[0], a),
            blend(g, matte[1], a),
            blend(b, matte[2], a),
        ])
    })
}

/// Convert to 8-bit RGB, flattening any alpha over white.
pub fn to_rgb(img: &DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) => img.clone(),
        other if other.color().has_alpha() => DynamicImage::ImageRgb8(flatten_onto(other, WHITE)),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

// Integer "over" with rounding.
fn blend(fg: u8, bg: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    let mixed = u32::from(fg) * a + u32::from(bg) * (255 - a);
    ((mixed + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba, RgbaImage};

    #[test]
    fn test_flatten_over_white() {
        let img = RgbaImage::from_fn(2, 2, |x, y| match (x, y) {
            (0, 0) => Rgba([255, 0, 0, 255]),
            (0, 1) => Rgba([0, 255, 0, 128]),
            (1, 0) => Rgba([0, 0, 255, 0]),
            _ => Rgba([255, 255, 0, 255]),
        });

        let flat = flatten_onto(&DynamicImage::ImageRgba8(img), WHITE);

        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(flat.get_pixel(0, 1), &Rgb([127, 255, 127]));
        assert_eq!(flat.get_pixel(1, 0), &WHITE);
        assert_eq!(flat.get_pixel(1, 1), &Rgb([255, 255, 0]));
    }

    #[test]
    fn test_blend_extremes() {
        assert_eq!(blend(10, 200, 255), 10);
        assert_eq!(blend(10, 200, 0), 200);
    }

    #[test]
    fn test_to_rgb_is_three_channel() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
        assert!(matches!(to_rgb(&rgba), DynamicImage::ImageRgb8(_)));

        let gray = image::GrayImage::from_pixel(1, 1, Luma([42]));
        let converted = to_rgb(&DynamicImage::ImageLuma8(gray)).to_rgb8();
        assert_eq!(converted.get_pixel(0, 0), &Rgb([42, 42, 42]));
    }
}
