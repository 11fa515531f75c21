//! Bounding-box dimension math.

/// Largest `(width, height)` that fits inside `max_width` x `max_height`
/// while keeping the source aspect ratio.
///
/// Never grows the source; a source that already fits is returned as is.
/// Each side is at least 1 pixel.
///
/// # Example
/// ```
/// use edgepix_image::fit_within;
///
/// assert_eq!(fit_within(2000, 1000, 500, 1000), (500, 250));
/// assert_eq!(fit_within(300, 200, 500, 500), (300, 200));
/// ```
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let max_width = max_width.max(1);
    let max_height = max_height.max(1);

    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );

    let new_width = (f64::from(width) * scale).round() as u32;
    let new_height = (f64::from(height) * scale).round() as u32;

    (new_width.clamp(1, max_width), new_height.clamp(1, max_height))
}

/// Fill unset box sides with the source dimension.
pub fn target_box(width: u32, height: u32, box_width: Option<u32>, box_height: Option<u32>) -> (u32, u32) {
    (box_width.unwrap_or(width), box_height.unwrap_or(height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_bound() {
        assert_eq!(fit_within(2000, 1000, 500, 1000), (500, 250));
    }

    #[test]
    fn test_height_bound() {
        assert_eq!(fit_within(1000, 2000, 1000, 500), (250, 500));
    }

    #[test]
    fn test_tighter_side_wins() {
        // 4000x3000 into 800x800 is width-limited
        assert_eq!(fit_within(4000, 3000, 800, 800), (800, 600));
    }

    #[test]
    fn test_no_upscale() {
        assert_eq!(fit_within(500, 400, 800, 800), (500, 400));
    }

    #[test]
    fn test_extreme_ratio_keeps_one_pixel() {
        assert_eq!(fit_within(10_000, 1, 100, 100), (100, 1));
    }

    #[test]
    fn test_zero_box_clamps() {
        assert_eq!(fit_within(100, 100, 0, 0), (1, 1));
    }

    #[test]
    fn test_target_box_defaults() {
        assert_eq!(target_box(2000, 1000, Some(500), None), (500, 1000));
        assert_eq!(target_box(2000, 1000, None, Some(10)), (2000, 10));
        assert_eq!(target_box(2000, 1000, None, None), (2000, 1000));
    }
}
