//! COCO bounding boxes.

use serde::{Deserialize, Serialize};

/// A COCO bounding box: `[x, y, width, height]` in absolute pixels, with
/// `(x, y)` the top-left corner.
///
/// Boxes are carried through filtering untouched; nothing here clamps or
/// rejects degenerate values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CocoBBox(pub [f64; 4]);

impl CocoBBox {
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self([x, y, width, height])
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.0[0]
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.0[1]
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.0[2]
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.0[3]
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Converts to YOLO's normalized `(cx, cy, w, h)` for an image of the
    /// given pixel size.
    ///
    /// A zero image dimension yields zeros on that axis rather than NaN.
    pub fn to_yolo(&self, image_width: u32, image_height: u32) -> (f64, f64, f64, f64) {
        let norm = |value: f64, extent: u32| {
            if extent == 0 {
                0.0
            } else {
                value / extent as f64
            }
        };

        let cx = self.x() + self.width() / 2.0;
        let cy = self.y() + self.height() / 2.0;

        (
            norm(cx, image_width),
            norm(cy, image_height),
            norm(self.width(), image_width),
            norm(self.height(), image_height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_yolo_centers_and_normalizes() {
        let bbox = CocoBBox::from_xywh(10.0, 20.0, 90.0, 60.0);
        let (cx, cy, w, h) = bbox.to_yolo(200, 100);

        assert!((cx - 0.275).abs() < 1e-12);
        assert!((cy - 0.5).abs() < 1e-12);
        assert!((w - 0.45).abs() < 1e-12);
        assert!((h - 0.6).abs() < 1e-12);
    }

    #[test]
    fn to_yolo_handles_zero_sized_images() {
        let bbox = CocoBBox::from_xywh(1.0, 1.0, 2.0, 2.0);
        assert_eq!(bbox.to_yolo(0, 0), (0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn parses_integer_arrays() {
        let bbox: CocoBBox = serde_json::from_str("[0, 5, 50, 25]").unwrap();
        assert_eq!(bbox.area(), 1250.0);
        assert_eq!(bbox.y(), 5.0);
    }
}
