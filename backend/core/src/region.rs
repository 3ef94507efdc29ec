use serde::{Deserialize, Serialize};

/// A point in logical (CSS) page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A normalized rectangle in logical page coordinates.
///
/// Constructed from the two corners of a drag gesture; width and height are
/// non-negative regardless of drag direction. Immutable once emitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl CaptureRegion {
    /// Normalize the bounding box of two gesture corners: origin is the
    /// per-axis minimum, width/height the per-axis absolute difference.
    pub fn from_points(anchor: Point, release: Point) -> Self {
        Self {
            origin_x: anchor.x.min(release.x),
            origin_y: anchor.y.min(release.y),
            width: (release.x - anchor.x).abs(),
            height: (release.y - anchor.y).abs(),
        }
    }

    /// Scale this logical region by the rendering surface's device pixel
    /// ratio. Captured bitmaps are in physical pixels, so the crop rectangle
    /// must be scaled or extraction reads the wrong sub-rectangle on
    /// high-density displays.
    pub fn to_device(&self, device_pixel_ratio: f64) -> DeviceRegion {
        DeviceRegion {
            x: (self.origin_x * device_pixel_ratio).round() as u32,
            y: (self.origin_y * device_pixel_ratio).round() as u32,
            width: (self.width * device_pixel_ratio).round() as u32,
            height: (self.height * device_pixel_ratio).round() as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A crop rectangle in physical bitmap pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_all_four_drag_directions() {
        let a = Point::new(10.0, 20.0);
        let b = Point::new(110.0, 70.0);
        let down_right = CaptureRegion::from_points(a, b);
        let up_left = CaptureRegion::from_points(b, a);
        let down_left = CaptureRegion::from_points(Point::new(110.0, 20.0), Point::new(10.0, 70.0));
        let up_right = CaptureRegion::from_points(Point::new(10.0, 70.0), Point::new(110.0, 20.0));

        for region in [down_right, up_left, down_left, up_right] {
            assert_eq!(region.origin_x, 10.0);
            assert_eq!(region.origin_y, 20.0);
            assert_eq!(region.width, 100.0);
            assert_eq!(region.height, 50.0);
        }
    }

    #[test]
    fn test_zero_size_gesture() {
        let p = Point::new(42.0, 7.0);
        let region = CaptureRegion::from_points(p, p);
        assert_eq!(region.width, 0.0);
        assert_eq!(region.height, 0.0);
        assert!(region.is_empty());
    }

    #[test]
    fn test_device_scaling_at_dpr_2() {
        let region = CaptureRegion {
            origin_x: 10.0,
            origin_y: 10.0,
            width: 100.0,
            height: 50.0,
        };
        let device = region.to_device(2.0);
        assert_eq!(
            device,
            DeviceRegion {
                x: 20,
                y: 20,
                width: 200,
                height: 100
            }
        );
    }

    #[test]
    fn test_device_scaling_identity_at_dpr_1() {
        let region = CaptureRegion {
            origin_x: 3.0,
            origin_y: 4.0,
            width: 5.0,
            height: 6.0,
        };
        let device = region.to_device(1.0);
        assert_eq!(device.x, 3);
        assert_eq!(device.width, 5);
    }

    #[test]
    fn test_region_serialization_roundtrip() {
        let region = CaptureRegion::from_points(Point::new(1.5, 2.5), Point::new(0.5, 9.0));
        let json = serde_json::to_string(&region).unwrap();
        let back: CaptureRegion = serde_json::from_str(&json).unwrap();
        assert_eq!(region, back);
    }
}
