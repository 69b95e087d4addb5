use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::classifier::is_marker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Rectangle of frame pixels rescanned every cycle. Both corners are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchRegion {
    pub top_left: Point,
    pub bottom_right: Point,
}

impl WatchRegion {
    /// Square of `radius` around `center`, clamped to a `width` x `height` frame.
    pub fn around(center: Point, radius: u32, width: u32, height: u32) -> Self {
        let max_x = width.saturating_sub(1);
        let max_y = height.saturating_sub(1);
        Self {
            top_left: Point::new(
                center.x.saturating_sub(radius),
                center.y.saturating_sub(radius),
            ),
            bottom_right: Point::new(
                center.x.saturating_add(radius).min(max_x),
                center.y.saturating_add(radius).min(max_y),
            ),
        }
    }

    pub fn width(&self) -> u32 {
        self.bottom_right.x - self.top_left.x + 1
    }

    pub fn height(&self) -> u32 {
        self.bottom_right.y - self.top_left.y + 1
    }

    /// Whether any bobber pixel lies inside the region. Pixels that fall
    /// outside `frame` (the window shrank since calibration) are skipped.
    pub fn contains_marker(&self, frame: &RgbaImage) -> bool {
        if frame.width() == 0 || frame.height() == 0 {
            return false;
        }
        let last_x = self.bottom_right.x.min(frame.width() - 1);
        let last_y = self.bottom_right.y.min(frame.height() - 1);

        for y in self.top_left.y..=last_y {
            for x in self.top_left.x..=last_x {
                if is_marker(frame.get_pixel(x, y)) {
                    return true;
                }
            }
        }
        false
    }
}

/// Row-major search for the first bobber pixel, ignoring the bottom
/// `exclusion_band` rows where the hotbar and health bar live.
pub fn locate_marker(frame: &RgbaImage, exclusion_band: u32) -> Option<Point> {
    let scan_height = frame.height().saturating_sub(exclusion_band);
    for y in 0..scan_height {
        for x in 0..frame.width() {
            if is_marker(frame.get_pixel(x, y)) {
                return Some(Point::new(x, y));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const BOBBER: Rgba<u8> = Rgba([210, 42, 42, 255]);
    const WATER: Rgba<u8> = Rgba([40, 60, 200, 255]);

    fn frame_with(width: u32, height: u32, markers: &[(u32, u32)]) -> RgbaImage {
        let mut frame = RgbaImage::from_pixel(width, height, WATER);
        for &(x, y) in markers {
            frame.put_pixel(x, y, BOBBER);
        }
        frame
    }

    #[test]
    fn empty_frame_has_no_marker() {
        let frame = frame_with(64, 48, &[]);
        assert_eq!(locate_marker(&frame, 0), None);
    }

    #[test]
    fn first_match_in_row_major_order_wins() {
        let frame = frame_with(64, 48, &[(50, 10), (5, 20), (2, 10)]);
        assert_eq!(locate_marker(&frame, 0), Some(Point::new(2, 10)));
    }

    #[test]
    fn exclusion_band_hides_bottom_rows() {
        let frame = frame_with(64, 48, &[(10, 45)]);
        assert_eq!(locate_marker(&frame, 4), None);
        assert_eq!(locate_marker(&frame, 2), Some(Point::new(10, 45)));
        assert_eq!(locate_marker(&frame, 0), Some(Point::new(10, 45)));
    }

    #[test]
    fn exclusion_band_larger_than_frame_scans_nothing() {
        let frame = frame_with(8, 8, &[(1, 1)]);
        assert_eq!(locate_marker(&frame, 100), None);
    }

    #[test]
    fn region_is_square_around_marker() {
        let region = WatchRegion::around(Point::new(500, 300), 40, 1920, 1080);
        assert_eq!(region.top_left, Point::new(460, 260));
        assert_eq!(region.bottom_right, Point::new(540, 340));
        assert_eq!(region.width(), 81);
        assert_eq!(region.height(), 81);
    }

    #[test]
    fn region_is_clamped_to_frame_bounds() {
        let near_origin = WatchRegion::around(Point::new(10, 5), 40, 200, 100);
        assert_eq!(near_origin.top_left, Point::new(0, 0));
        assert_eq!(near_origin.bottom_right, Point::new(50, 45));

        let near_corner = WatchRegion::around(Point::new(190, 95), 40, 200, 100);
        assert_eq!(near_corner.top_left, Point::new(150, 55));
        assert_eq!(near_corner.bottom_right, Point::new(199, 99));
    }

    #[test]
    fn contains_marker_only_looks_inside_region() {
        let region = WatchRegion::around(Point::new(20, 20), 5, 64, 48);
        assert!(region.contains_marker(&frame_with(64, 48, &[(25, 15)])));
        assert!(!region.contains_marker(&frame_with(64, 48, &[(26, 20)])));
        assert!(!region.contains_marker(&frame_with(64, 48, &[])));
    }

    #[test]
    fn contains_marker_tolerates_a_shrunken_frame() {
        let region = WatchRegion::around(Point::new(60, 40), 10, 100, 100);
        assert!(!region.contains_marker(&frame_with(40, 40, &[])));
        assert!(region.contains_marker(&frame_with(64, 48, &[(63, 47)])));
        assert!(!region.contains_marker(&RgbaImage::new(0, 0)));
    }
}
