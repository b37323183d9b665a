//! Closed set of 2D shapes with symmetric intersection tests
//!
//! Every shape is axis-aligned or rotation-free, so all tests stay cheap:
//! circles compare squared distances, rectangles compare intervals, and
//! motion hulls reduce to segment distances.

use serde::{Deserialize, Serialize};

use super::math::{distance_point_to_segment, distance_segment_to_segment};
use super::{Point2, Vector2};

/// Disc with an open boundary: tangent circles do not intersect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Point2, radius: f32) -> Self {
        Self {
            center,
            radius: radius.abs(),
        }
    }

    pub fn intersects_circle(&self, other: &Circle) -> bool {
        let r = self.radius + other.radius;
        self.center.distance_squared(other.center) < r * r
    }

    pub fn bounds(&self) -> Rectangle {
        let r = Vector2::splat(self.radius);
        Rectangle::new(self.center - r, self.center + r)
    }
}

/// Axis-aligned rectangle with `lower <= upper` on both axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    lower: Point2,
    upper: Point2,
}

impl Rectangle {
    /// Build from any two opposite corners
    pub fn new(a: Point2, b: Point2) -> Self {
        Self {
            lower: a.min(b),
            upper: a.max(b),
        }
    }

    pub fn from_coords(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(Point2::new(x1, y1), Point2::new(x2, y2))
    }

    pub fn lower(&self) -> Point2 {
        self.lower
    }

    pub fn upper(&self) -> Point2 {
        self.upper
    }

    pub fn width(&self) -> f32 {
        self.upper.x - self.lower.x
    }

    pub fn height(&self) -> f32 {
        self.upper.y - self.lower.y
    }

    pub fn center(&self) -> Point2 {
        (self.lower + self.upper) * 0.5
    }

    /// Strict containment (points on the border are outside)
    pub fn contains_point(&self, p: Point2) -> bool {
        p.x > self.lower.x && p.x < self.upper.x && p.y > self.lower.y && p.y < self.upper.y
    }

    pub fn intersects_rectangle(&self, other: &Rectangle) -> bool {
        overlaps(self.lower.x, self.upper.x, other.lower.x, other.upper.x)
            && overlaps(self.lower.y, self.upper.y, other.lower.y, other.upper.y)
    }

    pub fn intersects_circle(&self, circle: &Circle) -> bool {
        let nearest = circle.center.clamp(self.lower, self.upper);
        nearest.distance_squared(circle.center) < circle.radius * circle.radius
    }

    /// Border walked lower → (lx, uy) → upper → (ux, ly) → lower
    fn edges(&self) -> [(Point2, Point2); 4] {
        let top_left = Point2::new(self.lower.x, self.upper.y);
        let bottom_right = Point2::new(self.upper.x, self.lower.y);
        [
            (self.lower, top_left),
            (top_left, self.upper),
            (self.upper, bottom_right),
            (bottom_right, self.lower),
        ]
    }
}

#[inline]
fn overlaps(a1: f32, a2: f32, b1: f32, b2: f32) -> bool {
    a2 > b1 && b2 > a1
}

/// Segment swept from `start` along `direction`, thickened by `size` on each side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionHull {
    pub start: Point2,
    pub direction: Vector2,
    pub size: f32,
}

impl MotionHull {
    pub fn new(start: Point2, direction: Vector2, size: f32) -> Self {
        Self {
            start,
            direction,
            size: size.abs(),
        }
    }

    pub fn end(&self) -> Point2 {
        self.start + self.direction
    }

    pub fn intersects_hull(&self, other: &MotionHull) -> bool {
        let d = distance_segment_to_segment(self.start, self.end(), other.start, other.end());
        d < self.size + other.size
    }

    pub fn intersects_rectangle(&self, rect: &Rectangle) -> bool {
        let (start, end) = (self.start, self.end());
        if rect.contains_point(start) || rect.contains_point(end) {
            return true;
        }
        rect.edges()
            .iter()
            .map(|&(a, b)| distance_segment_to_segment(a, b, start, end))
            .fold(f32::INFINITY, f32::min)
            < self.size
    }

    pub fn intersects_circle(&self, circle: &Circle) -> bool {
        distance_point_to_segment(circle.center, self.start, self.end())
            < self.size + circle.radius
    }

    pub fn bounds(&self) -> Rectangle {
        let end = self.end();
        let pad = Vector2::splat(self.size);
        Rectangle::new(self.start.min(end) - pad, self.start.max(end) + pad)
    }
}

/// Any shape a situated object or a query can take
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Circle(Circle),
    Rectangle(Rectangle),
    MotionHull(MotionHull),
}

impl Shape {
    /// Symmetric overlap test; mirrored pairs delegate to one implementation
    pub fn intersects(&self, other: &Shape) -> bool {
        use Shape::*;
        match (self, other) {
            (Circle(a), Circle(b)) => a.intersects_circle(b),
            (Rectangle(a), Rectangle(b)) => a.intersects_rectangle(b),
            (MotionHull(a), MotionHull(b)) => a.intersects_hull(b),
            (Rectangle(r), Circle(c)) | (Circle(c), Rectangle(r)) => r.intersects_circle(c),
            (MotionHull(h), Rectangle(r)) | (Rectangle(r), MotionHull(h)) => {
                h.intersects_rectangle(r)
            }
            (MotionHull(h), Circle(c)) | (Circle(c), MotionHull(h)) => h.intersects_circle(c),
        }
    }

    pub fn translate(&self, by: Vector2) -> Shape {
        match *self {
            Shape::Circle(c) => Shape::Circle(Circle::new(c.center + by, c.radius)),
            Shape::Rectangle(r) => Shape::Rectangle(Rectangle::new(r.lower + by, r.upper + by)),
            Shape::MotionHull(h) => {
                Shape::MotionHull(MotionHull::new(h.start + by, h.direction, h.size))
            }
        }
    }

    /// Tight axis-aligned bounding box
    pub fn bounds(&self) -> Rectangle {
        match self {
            Shape::Circle(c) => c.bounds(),
            Shape::Rectangle(r) => *r,
            Shape::MotionHull(h) => h.bounds(),
        }
    }

    /// Largest half-extent, used to size motion hulls
    pub fn max_demi_size(&self) -> f32 {
        match self {
            Shape::Circle(c) => c.radius,
            Shape::Rectangle(r) => r.width().max(r.height()) / 2.0,
            Shape::MotionHull(h) => h.size,
        }
    }

    pub fn center(&self) -> Point2 {
        match self {
            Shape::Circle(c) => c.center,
            Shape::Rectangle(r) => r.center(),
            Shape::MotionHull(h) => h.start + h.direction * 0.5,
        }
    }
}

impl From<Circle> for Shape {
    fn from(c: Circle) -> Self {
        Shape::Circle(c)
    }
}

impl From<Rectangle> for Shape {
    fn from(r: Rectangle) -> Self {
        Shape::Rectangle(r)
    }
}

impl From<MotionHull> for Shape {
    fn from(h: MotionHull) -> Self {
        Shape::MotionHull(h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(x: f32, y: f32, r: f32) -> Shape {
        Circle::new(Point2::new(x, y), r).into()
    }

    fn rect(x1: f32, y1: f32, x2: f32, y2: f32) -> Shape {
        Rectangle::from_coords(x1, y1, x2, y2).into()
    }

    fn hull(x: f32, y: f32, dx: f32, dy: f32, size: f32) -> Shape {
        MotionHull::new(Point2::new(x, y), Vector2::new(dx, dy), size).into()
    }

    #[test]
    fn test_tangent_circles_do_not_intersect() {
        assert!(!circle(0.0, 0.0, 1.0).intersects(&circle(2.0, 0.0, 1.0)));
        assert!(circle(0.0, 0.0, 1.0).intersects(&circle(1.9, 0.0, 1.0)));
    }

    #[test]
    fn test_touching_rectangles_do_not_intersect() {
        assert!(!rect(0.0, 0.0, 1.0, 1.0).intersects(&rect(1.0, 0.0, 2.0, 1.0)));
        assert!(rect(0.0, 0.0, 1.0, 1.0).intersects(&rect(0.5, 0.5, 2.0, 2.0)));
    }

    #[test]
    fn test_rectangle_normalizes_corners() {
        let r = Rectangle::from_coords(5.0, 1.0, 2.0, 4.0);
        assert_eq!(r.lower(), Point2::new(2.0, 1.0));
        assert_eq!(r.upper(), Point2::new(5.0, 4.0));
        assert_eq!(Shape::from(r).max_demi_size(), 1.5);
    }

    #[test]
    fn test_circle_against_rectangle_corner() {
        let r = rect(0.0, 0.0, 10.0, 10.0);
        assert!(!r.intersects(&circle(12.0, 12.0, 2.0)));
        assert!(r.intersects(&circle(11.0, 11.0, 2.0)));
        // Center inside the rectangle
        assert!(r.intersects(&circle(5.0, 5.0, 0.1)));
    }

    #[test]
    fn test_hull_against_circle_and_hull() {
        let h = hull(0.0, 0.0, 10.0, 0.0, 1.0);
        assert!(h.intersects(&circle(5.0, 2.5, 2.0)));
        assert!(!h.intersects(&circle(5.0, 3.5, 2.0)));
        assert!(h.intersects(&hull(5.0, -5.0, 0.0, 10.0, 0.5)));
        assert!(!h.intersects(&hull(0.0, 3.0, 10.0, 0.0, 1.0)));
    }

    #[test]
    fn test_hull_inside_rectangle_intersects() {
        let r = rect(0.0, 0.0, 100.0, 100.0);
        assert!(r.intersects(&hull(40.0, 40.0, 5.0, 5.0, 1.0)));
        assert!(r.intersects(&hull(-5.0, 50.0, 3.0, 0.0, 3.0)));
        assert!(!r.intersects(&hull(-10.0, 50.0, 3.0, 0.0, 3.0)));
    }

    #[test]
    fn test_hull_bounds_cover_swept_segment() {
        let b = hull(10.0, 10.0, 5.0, -5.0, 2.0).bounds();
        assert_eq!(b.lower(), Point2::new(8.0, 3.0));
        assert_eq!(b.upper(), Point2::new(17.0, 12.0));
    }

    #[test]
    fn test_translate_and_center() {
        let s = circle(1.0, 1.0, 2.0).translate(Vector2::new(3.0, -1.0));
        assert_eq!(s.center(), Point2::new(4.0, 0.0));
        assert_eq!(s.bounds(), Rectangle::from_coords(2.0, -2.0, 6.0, 2.0));
        let h = hull(0.0, 0.0, 4.0, 0.0, 1.0);
        assert_eq!(h.center(), Point2::new(2.0, 0.0));
        assert_eq!(h.max_demi_size(), 1.0);
    }
}
