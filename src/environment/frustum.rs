//! Fields of view bound to a body

use std::fmt;

use crate::core::types::ObjectId;
use crate::geometry::{Circle, Point2, Shape, Vector2};

/// Generates the region a body perceives
pub trait Frustum: fmt::Debug + Send + Sync {
    /// Body the frustum belongs to; it never perceives itself
    fn owner(&self) -> ObjectId;

    /// Perceived region for a body at `position` facing `direction`
    fn shape(&self, position: Point2, direction: Vector2) -> Shape;
}

/// Omnidirectional field of view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleFrustum {
    owner: ObjectId,
    radius: f32,
}

impl CircleFrustum {
    pub fn new(owner: ObjectId, radius: f32) -> Self {
        Self {
            owner,
            radius: radius.abs(),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Frustum for CircleFrustum {
    fn owner(&self) -> ObjectId {
        self.owner
    }

    fn shape(&self, position: Point2, _direction: Vector2) -> Shape {
        Circle::new(position, self.radius).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_frustum_ignores_direction() {
        let f = CircleFrustum::new(ObjectId::new(), -150.0);
        assert_eq!(f.radius(), 150.0);
        let a = f.shape(Point2::new(10.0, 10.0), Vector2::X);
        let b = f.shape(Point2::new(10.0, 10.0), Vector2::Y);
        assert_eq!(a, b);
        assert_eq!(a.max_demi_size(), 150.0);
    }
}
