use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    /// Left edge x-coordinate
    pub x: f64,
    /// Top edge y-coordinate
    pub y: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a box from corner coordinates `(x1, y1)` / `(x2, y2)`.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        }
    }

    /// Right edge x-coordinate.
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center x-coordinate.
    #[inline]
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Center y-coordinate.
    #[inline]
    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Box area in square pixels.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Whether the box lies fully inside a `image_width` x `image_height` frame.
    pub fn is_within(&self, image_width: f64, image_height: f64) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.right() <= image_width
            && self.bottom() <= image_height
    }

    /// Smallest box enclosing every input box, or `None` for an empty input.
    pub fn union<'a, I>(boxes: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        let mut iter = boxes.into_iter();
        let first = iter.next()?;

        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.right(), first.bottom());

        for b in iter {
            min_x = min_x.min(b.x);
            min_y = min_y.min(b.y);
            max_x = max_x.max(b.right());
            max_y = max_y.max(b.bottom());
        }

        Some(BoundingBox::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

/// A 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes_order() {
        let b = BoundingBox::from_corners(50.0, 80.0, 10.0, 20.0);
        assert_eq!(b, BoundingBox::new(10.0, 20.0, 40.0, 60.0));
    }

    #[test]
    fn test_union_of_disjoint_boxes() {
        let boxes = [
            BoundingBox::new(10.0, 10.0, 20.0, 20.0),
            BoundingBox::new(100.0, 50.0, 30.0, 40.0),
        ];
        let u = BoundingBox::union(&boxes).unwrap();
        assert_eq!(u, BoundingBox::new(10.0, 10.0, 120.0, 80.0));
    }

    #[test]
    fn test_union_empty_is_none() {
        let boxes: [BoundingBox; 0] = [];
        assert!(BoundingBox::union(&boxes).is_none());
    }

    #[test]
    fn test_is_within() {
        assert!(BoundingBox::new(0.0, 0.0, 100.0, 100.0).is_within(100.0, 100.0));
        assert!(!BoundingBox::new(1.0, 0.0, 100.0, 100.0).is_within(100.0, 100.0));
        assert!(!BoundingBox::new(0.0, 0.0, 0.0, 10.0).is_within(100.0, 100.0));
    }
}
