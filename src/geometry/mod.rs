//! Geometry kernel: points, vectors, shapes and their intersection tests

pub mod math;
pub mod shape;
pub mod vector;

/// A location in world space
pub type Point2 = glam::Vec2;

/// A displacement or direction in world space
pub type Vector2 = glam::Vec2;

pub use math::{clamp, clamp_radian, EPSILON};
pub use shape::{Circle, MotionHull, Rectangle, Shape};
pub use vector::{orientation_vector, VectorExt};
