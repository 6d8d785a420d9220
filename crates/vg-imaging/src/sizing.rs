//! Orientation-based size bound.
//!
//! Landscape images are bounded by width, portrait and square images by
//! height. The other side follows the aspect ratio with truncating integer
//! arithmetic and never drops below one pixel. Images are never enlarged.

/// Width bound for landscape images.
pub const MAX_WIDTH: u32 = 800;

/// Height bound for portrait and square images.
pub const MAX_HEIGHT: u32 = 600;

/// Compute the output size for a `width` x `height` source.
pub fn target_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width.max(1), height.max(1));
    }

    if width > height {
        let target_w = width.min(MAX_WIDTH);
        let target_h = scale(height, target_w, width);
        (target_w, target_h)
    } else {
        let target_h = height.min(MAX_HEIGHT);
        let target_w = scale(width, target_h, height);
        (target_w, target_h)
    }
}

/// `side * num / den`, truncated, widened to avoid overflow, at least 1.
fn scale(side: u32, num: u32, den: u32) -> u32 {
    let scaled = u64::from(side) * u64::from(num) / u64::from(den);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_bounded_by_width() {
        assert_eq!(target_dimensions(1600, 900), (800, 450));
        assert_eq!(target_dimensions(3840, 2160), (800, 450));
    }

    #[test]
    fn portrait_bounded_by_height() {
        assert_eq!(target_dimensions(600, 1200), (300, 600));
        assert_eq!(target_dimensions(1080, 1920), (337, 600));
    }

    #[test]
    fn square_uses_height_bound() {
        assert_eq!(target_dimensions(1000, 1000), (600, 600));
    }

    #[test]
    fn small_images_unchanged() {
        assert_eq!(target_dimensions(400, 300), (400, 300));
        assert_eq!(target_dimensions(300, 400), (300, 400));
        assert_eq!(target_dimensions(800, 799), (800, 799));
    }

    #[test]
    fn landscape_height_is_not_bounded() {
        // Only the dominant side is bounded.
        assert_eq!(target_dimensions(700, 650), (700, 650));
    }

    #[test]
    fn truncates_instead_of_rounding() {
        // 333 * 800 / 1000 = 266.4
        assert_eq!(target_dimensions(1000, 333), (800, 266));
        // 999 * 600 / 1000 = 599.4
        assert_eq!(target_dimensions(999, 1000), (599, 600));
    }

    #[test]
    fn extreme_aspect_never_zero() {
        assert_eq!(target_dimensions(10_000, 1), (800, 1));
        assert_eq!(target_dimensions(1, 10_000), (1, 600));
    }

    #[test]
    fn degenerate_input_is_clamped() {
        assert_eq!(target_dimensions(0, 0), (1, 1));
    }
}
