//! Bounding boxes and center-point geometry

use serde::{Deserialize, Serialize};

/// A point in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned face bounding box from the face localizer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Detector confidence, when the localizer reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence: None,
        }
    }

    /// Center of the box: `(x + width/2, y + height/2)`
    pub fn center(&self) -> Point {
        Point::new(
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Box area in pixels (0 for inverted boxes)
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Integer crop rectangle `(x, y, w, h)` clipped to a `frame_w` x `frame_h`
    /// frame. None when the intersection is empty.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> Option<(u32, u32, u32, u32)> {
        if !(self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()) {
            return None;
        }

        let x0 = self.x.floor().max(0.0) as u32;
        let y0 = self.y.floor().max(0.0) as u32;
        let x1 = ((self.x + self.width).floor().max(0.0) as u32).min(frame_w);
        let y1 = ((self.y + self.height).floor().max(0.0) as u32).min(frame_h);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0, y0, x1 - x0, y1 - y0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_center() {
        let bbox = BoundingBox::new(10.0, 20.0, 40.0, 60.0);
        assert_eq!(bbox.center(), Point::new(30.0, 50.0));
    }

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_rejects_nan() {
        let bbox = BoundingBox::new(f32::NAN, 0.0, 10.0, 10.0);
        assert!(bbox.clamp_to(100, 100).is_none());
    }

    proptest! {
        #[test]
        fn prop_clamped_box_fits_frame(
            x in -200.0f32..400.0,
            y in -200.0f32..400.0,
            w in 0.0f32..300.0,
            h in 0.0f32..300.0,
            fw in 1u32..320,
            fh in 1u32..240,
        ) {
            if let Some((cx, cy, cw, ch)) = BoundingBox::new(x, y, w, h).clamp_to(fw, fh) {
                prop_assert!(cw > 0 && ch > 0);
                prop_assert!(cx + cw <= fw);
                prop_assert!(cy + ch <= fh);
            }
        }
    }
}
