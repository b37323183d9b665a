//! Vector operations on top of `glam::Vec2`

use glam::Vec2;

use super::math::{clamp_radian, EPSILON};

/// Angle-aware helpers used by the motion model and world models
pub trait VectorExt: Sized {
    /// Rotate counter-clockwise by `angle` radians
    fn turn(self, angle: f32) -> Self;

    /// Signed angle from `self` to `other` in `(-π, π]`; NaN if either is zero
    fn signed_angle(self, other: Self) -> f32;

    /// Heading of the vector in `[0, 2π)`
    fn orientation_angle(self) -> f32;

    /// Same direction with the given length; a zero vector becomes `(length, 0)`
    fn with_length(self, length: f32) -> Self;

    /// Both components are within [`EPSILON`] of zero
    fn is_epsilon_zero(self) -> bool;
}

impl VectorExt for Vec2 {
    fn turn(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(cos * self.x - sin * self.y, sin * self.x + cos * self.y)
    }

    fn signed_angle(self, other: Self) -> f32 {
        let len1 = self.length();
        let len2 = other.length();
        if len1 == 0.0 || len2 == 0.0 {
            return f32::NAN;
        }
        let a = self / len1;
        let b = other / len2;
        let cos = a.dot(b);
        let sin = a.perp_dot(b);
        sin.atan2(cos)
    }

    fn orientation_angle(self) -> f32 {
        let len = self.length();
        if len == 0.0 {
            return 0.0;
        }
        let mut angle = (self.x / len).clamp(-1.0, 1.0).acos();
        if self.y < 0.0 {
            angle = -angle;
        }
        clamp_radian(angle)
    }

    fn with_length(self, length: f32) -> Self {
        let length = length.abs();
        let current = self.length();
        if current == 0.0 {
            Vec2::new(length, 0.0)
        } else {
            self * (length / current)
        }
    }

    fn is_epsilon_zero(self) -> bool {
        self.x.abs() <= EPSILON && self.y.abs() <= EPSILON
    }
}

/// Unit vector pointing at `angle` radians
pub fn orientation_vector(angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(cos, sin)
}
