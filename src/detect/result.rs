/// Axis-aligned box in center-width-height form, pixel units.
///
/// This is the form object detection models emit; overlays convert to
/// corner form before drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    /// Convert to corner form `(x1, y1, x2, y2)`.
    pub fn corners(&self) -> (f32, f32, f32, f32) {
        (
            self.cx - self.w / 2.0,
            self.cy - self.h / 2.0,
            self.cx + self.w / 2.0,
            self.cy + self.h / 2.0,
        )
    }
}

/// One detection returned by a backend for a single frame.
#[derive(Clone, Debug)]
pub struct Detection {
    pub class_id: u32,
    /// Model confidence in `[0, 1]`.
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class_id: u32, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class_id,
            confidence,
            bbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_from_center_form() {
        let bbox = BoundingBox {
            cx: 100.0,
            cy: 50.0,
            w: 40.0,
            h: 20.0,
        };
        assert_eq!(bbox.corners(), (80.0, 40.0, 120.0, 60.0));
    }
}
