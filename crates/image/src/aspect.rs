//! Aspect-ratio arithmetic for locked resizes.
//!
//! The resize dialog keeps the ratio of the image it was opened with, so the
//! paired dimension is always computed from the original size rather than
//! from the previous edit. This avoids rounding drift across repeated edits.

/// Height matching `new_width` at the original aspect ratio.
///
/// Computes `round(new_width * height / width)`, never less than 1.
///
/// # Example
/// ```
/// use snapconvert_image::locked_height;
///
/// assert_eq!(locked_height(4000, 3000, 800), 600);
/// assert_eq!(locked_height(1920, 1080, 1000), 563);
/// ```
pub fn locked_height(width: u32, height: u32, new_width: u32) -> u32 {
    scale(height, new_width, width)
}

/// Width matching `new_height` at the original aspect ratio.
///
/// Computes `round(new_height * width / height)`, never less than 1.
pub fn locked_width(width: u32, height: u32, new_height: u32) -> u32 {
    scale(width, new_height, height)
}

fn scale(paired: u32, new: u32, reference: u32) -> u32 {
    if reference == 0 {
        return new.max(1);
    }
    let scaled = (f64::from(new) * f64::from(paired) / f64::from(reference)).round();
    (scaled.min(f64::from(u32::MAX)) as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_height_exact() {
        assert_eq!(locked_height(4000, 3000, 800), 600);
        assert_eq!(locked_height(100, 100, 37), 37);
    }

    #[test]
    fn test_locked_height_rounds_half_up() {
        // 3 * 5 / 2 = 7.5
        assert_eq!(locked_height(2, 5, 3), 8);
        // 1000 * 1080 / 1920 = 562.5
        assert_eq!(locked_height(1920, 1080, 1000), 563);
    }

    #[test]
    fn test_locked_width() {
        assert_eq!(locked_width(4000, 3000, 300), 400);
    }

    #[test]
    fn test_never_zero() {
        assert_eq!(locked_height(10_000, 1, 1), 1);
        assert_eq!(locked_width(1, 10_000, 1), 1);
    }

    #[test]
    fn test_degenerate_reference() {
        assert_eq!(locked_height(0, 100, 50), 50);
    }
}
