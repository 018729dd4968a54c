use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in source image pixels.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize, PartialOrd)]
pub struct PedBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub w: f32,
    pub h: f32,
}

impl PedBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::default().with_x1y1_x2y2(x1, y1, x2, y2)
    }

    /// Returns the width of the bounding box.
    pub fn width(&self) -> f32 {
        self.w
    }

    /// Returns the height of the bounding box.
    pub fn height(&self) -> f32 {
        self.h
    }

    /// Returns the center x-coordinate of the bounding box.
    pub fn cx(&self) -> f32 {
        self.x1 + self.w / 2.
    }

    /// Returns the center y-coordinate of the bounding box.
    pub fn cy(&self) -> f32 {
        self.y1 + self.h / 2.
    }

    /// Returns the bounding box coordinates as `(x1, y1, x2, y2)`.
    pub fn xy1_xy2(&self) -> (f32, f32, f32, f32) {
        (self.x1, self.y1, self.x2, self.y2)
    }

    /// Computes the area of the bounding box.
    pub fn area(&self) -> f32 {
        self.h * self.w
    }

    /// Computes the intersection area between this bounding box and another.
    pub fn intersect(&self, other: &PedBox) -> f32 {
        let left = self.x1.max(other.x1);
        let right = self.x2.min(other.x2);
        let top = self.y1.max(other.y1);
        let bottom = self.y2.min(other.y2);
        (right - left).max(0.) * (bottom - top).max(0.)
    }

    /// Computes the union area between this bounding box and another.
    pub fn union(&self, other: &PedBox) -> f32 {
        self.area() + other.area() - self.intersect(other)
    }

    /// Intersection over union. Degenerate boxes give `0.0`.
    pub fn iou(&self, other: &PedBox) -> f32 {
        let union = self.union(other);
        if union <= 0. {
            return 0.;
        }
        self.intersect(other) / union
    }

    /// Clips the box to `[0, width] x [0, height]`.
    pub fn clamp_to(self, width: f32, height: f32) -> Self {
        Self::default().with_x1y1_x2y2(
            self.x1.clamp(0., width),
            self.y1.clamp(0., height),
            self.x2.clamp(0., width),
            self.y2.clamp(0., height),
        )
    }

    /// Truncates to integer pixel coordinates, the same way the boxes are drawn.
    pub fn as_x1y1_x2y2_i32(&self) -> (i32, i32, i32, i32) {
        (self.x1 as i32,
         self.y1 as i32,
         self.x2 as i32,
         self.y2 as i32)
    }

    /// Sets the bounding box's coordinates using `(x1, y1, x2, y2)` and calculates width and height.
    pub fn with_x1y1_x2y2(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;

        self.w = x2 - x1;
        self.h = y2 - y1;
        self
    }

    /// Sets the bounding box's coordinates and dimensions using `(x, y, w, h)`.
    pub fn with_x1y1_wh(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.x1 = x;
        self.y1 = y;
        self.w = w;
        self.h = h;

        self.x2 = x + w;
        self.y2 = y + h;
        self
    }

    /// Sets the bounding box's coordinates and dimensions using `(cx, cy, w, h)`.
    pub fn with_cxcy_wh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - (w / 2.0);
        self.y1 = cy - (h / 2.0);
        self.w = w;
        self.h = h;

        self.x2 = cx + (w / 2.0);
        self.y2 = cy + (h / 2.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_agree() {
        let a = PedBox::new(10., 20., 30., 60.);
        let b = PedBox::default().with_x1y1_wh(10., 20., 20., 40.);
        let c = PedBox::default().with_cxcy_wh(20., 40., 20., 40.);
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.area(), 800.);
    }

    #[test]
    fn iou_of_disjoint_and_identical_boxes() {
        let a = PedBox::new(0., 0., 10., 10.);
        let b = PedBox::new(20., 20., 30., 30.);
        assert_eq!(a.iou(&b), 0.);
        assert_eq!(a.iou(&a), 1.);
        assert_eq!(PedBox::default().iou(&PedBox::default()), 0.);
    }

    #[test]
    fn clamp_keeps_box_inside_image() {
        let b = PedBox::new(-5., -3., 120., 90.).clamp_to(100., 80.);
        assert_eq!(b.xy1_xy2(), (0., 0., 100., 80.));
        assert_eq!((b.width(), b.height()), (100., 80.));
    }
}
