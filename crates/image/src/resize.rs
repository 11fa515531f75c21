//! Image resizing with the image crate.

use crate::fit::{fit_within, target_box};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

/// Shrink an image to fit inside `max_width` x `max_height`, keeping its
/// aspect ratio. Images that already fit are returned unchanged.
pub fn resize_to_fit(img: &DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let (current_width, current_height) = img.dimensions();
    let (new_width, new_height) = fit_within(current_width, current_height, max_width, max_height);

    if (new_width, new_height) == (current_width, current_height) {
        img.clone()
    } else {
        img.resize_exact(new_width, new_height, FilterType::Lanczos3)
    }
}

/// Shrink to a box where either side may be unset; an unset side takes
/// the image's own dimension.
pub fn resize_to_box(img: &DynamicImage, box_width: Option<u32>, box_height: Option<u32>) -> DynamicImage {
    let (width, height) = img.dimensions();
    let (max_width, max_height) = target_box(width, height, box_width, box_height);
    resize_to_fit(img, max_width, max_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_shrinks_to_box() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(200, 100));
        let resized = resize_to_fit(&img, 50, 100);
        assert_eq!(resized.dimensions(), (50, 25));
    }

    #[test]
    fn test_never_upscales() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(40, 30));
        let resized = resize_to_fit(&img, 400, 300);
        assert_eq!(resized.dimensions(), (40, 30));
    }

    #[test]
    fn test_box_with_one_side() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(2000, 1000));
        assert_eq!(resize_to_box(&img, Some(500), None).dimensions(), (500, 250));
        assert_eq!(resize_to_box(&img, None, Some(100)).dimensions(), (200, 100));
        assert_eq!(resize_to_box(&img, Some(4000), None).dimensions(), (2000, 1000));
    }
}
