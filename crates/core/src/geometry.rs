//! Bounding-box geometry.
//!
//! Model backends report corners (`x1, y1, x2, y2`) either already divided
//! by the frame size or in pixels. [`BoxCoords::normalize`] folds both into a
//! single top-left/width/height representation in `[0, 1]`.

/// Corner coordinates of an axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xyxy {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Xyxy {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Reorder corners so that `x1 <= x2` and `y1 <= y2`.
    pub fn ordered(self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Intersection over union. Zero when either box is degenerate.
    pub fn iou(&self, other: &Xyxy) -> f64 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// Coordinates as reported by a model backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoxCoords {
    /// Corners already expressed as fractions of the frame size.
    Normalized(Xyxy),
    /// Corners in pixels of the frame the model was given.
    Pixel(Xyxy),
}

/// A box in normalized top-left/size form. All fields lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoxCoords {
    /// Convert to a [`NormalizedBox`] for a frame of the given size.
    ///
    /// The frame size is only consulted for [`BoxCoords::Pixel`]. Corners are
    /// reordered and clamped to the frame, so width and height are never
    /// negative.
    pub fn normalize(&self, frame_width: u32, frame_height: u32) -> NormalizedBox {
        let unit = match *self {
            BoxCoords::Normalized(xyxy) => xyxy,
            BoxCoords::Pixel(xyxy) => {
                let w = f64::from(frame_width.max(1));
                let h = f64::from(frame_height.max(1));
                Xyxy::new(xyxy.x1 / w, xyxy.y1 / h, xyxy.x2 / w, xyxy.y2 / h)
            }
        };

        let clamped = Xyxy::new(
            unit.x1.clamp(0.0, 1.0),
            unit.y1.clamp(0.0, 1.0),
            unit.x2.clamp(0.0, 1.0),
            unit.y2.clamp(0.0, 1.0),
        )
        .ordered();

        NormalizedBox {
            x: clamped.x1,
            y: clamped.y1,
            width: clamped.width(),
            height: clamped.height(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_box_eq(a: NormalizedBox, b: NormalizedBox) {
        assert!((a.x - b.x).abs() < EPS, "x: {} vs {}", a.x, b.x);
        assert!((a.y - b.y).abs() < EPS, "y: {} vs {}", a.y, b.y);
        assert!((a.width - b.width).abs() < EPS, "w: {} vs {}", a.width, b.width);
        assert!((a.height - b.height).abs() < EPS, "h: {} vs {}", a.height, b.height);
    }

    #[test]
    fn normalized_corners_become_top_left_and_size() {
        let b = BoxCoords::Normalized(Xyxy::new(0.1, 0.2, 0.4, 0.6)).normalize(0, 0);
        assert_box_eq(
            b,
            NormalizedBox { x: 0.1, y: 0.2, width: 0.3, height: 0.4 },
        );
    }

    #[test]
    fn pixel_and_normalized_paths_agree() {
        let cases = [
            (640, 480, Xyxy::new(64.0, 48.0, 320.0, 240.0)),
            (1920, 1080, Xyxy::new(0.0, 0.0, 1920.0, 1080.0)),
            (33, 17, Xyxy::new(3.3, 1.7, 9.9, 15.3)),
        ];

        for (w, h, px) in cases {
            let unit = Xyxy::new(
                px.x1 / f64::from(w),
                px.y1 / f64::from(h),
                px.x2 / f64::from(w),
                px.y2 / f64::from(h),
            );
            assert_box_eq(
                BoxCoords::Pixel(px).normalize(w, h),
                BoxCoords::Normalized(unit).normalize(w, h),
            );
        }
    }

    #[test]
    fn inverted_corners_yield_non_negative_size() {
        let b = BoxCoords::Pixel(Xyxy::new(300.0, 200.0, 100.0, 50.0)).normalize(400, 400);
        assert!(b.width >= 0.0 && b.height >= 0.0);
        assert_box_eq(
            b,
            NormalizedBox { x: 0.25, y: 0.125, width: 0.5, height: 0.375 },
        );
    }

    #[test]
    fn out_of_frame_coordinates_are_clamped() {
        let b = BoxCoords::Pixel(Xyxy::new(-10.0, -5.0, 120.0, 50.0)).normalize(100, 100);
        assert_box_eq(b, NormalizedBox { x: 0.0, y: 0.0, width: 1.0, height: 0.5 });
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = Xyxy::new(0.0, 0.0, 10.0, 10.0);
        assert!((a.iou(&a) - 1.0).abs() < EPS);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = Xyxy::new(0.0, 0.0, 10.0, 10.0);
        let b = Xyxy::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn iou_of_half_overlap() {
        let a = Xyxy::new(0.0, 0.0, 10.0, 10.0);
        let b = Xyxy::new(5.0, 0.0, 15.0, 10.0);
        // intersection 50, union 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < EPS);
    }
}
