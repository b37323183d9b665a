//! Mobile objects and their motion laws
//!
//! Two control models turn a requested influence into the displacement
//! realized during one step:
//!
//! - **kinematic**: the influence is a velocity. Its magnitude is clamped to
//!   the maximum speed and integrated over the step, without inertia.
//! - **steering**: the influence is an acceleration. A first half-step turns
//!   the clamped acceleration into a candidate speed added to the current
//!   velocity; the candidate speed is clamped and integrated over the full
//!   step.

use serde::{Deserialize, Serialize};

use crate::core::types::ObjectId;
use crate::geometry::{clamp, orientation_vector, Point2, Shape, Vector2, VectorExt};

use super::object::{Situated, SituatedObject};

/// Seconds an aligning body plans to take to reach its target heading
pub const TIME_TO_REACH_DIRECTION: f32 = 2.0;

/// Speed and acceleration bounds of a mobile object (always non-negative)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionLimits {
    pub max_linear_speed: f32,
    pub max_linear_acceleration: f32,
    pub max_angular_speed: f32,
    pub max_angular_acceleration: f32,
}

impl MotionLimits {
    pub fn new(
        max_linear_speed: f32,
        max_linear_acceleration: f32,
        max_angular_speed: f32,
        max_angular_acceleration: f32,
    ) -> Self {
        Self {
            max_linear_speed: max_linear_speed.abs(),
            max_linear_acceleration: max_linear_acceleration.abs(),
            max_angular_speed: max_angular_speed.abs(),
            max_angular_acceleration: max_angular_acceleration.abs(),
        }
    }

    /// No bound at all, used for objects moved by the environment itself
    pub fn unbounded() -> Self {
        Self::new(f32::INFINITY, f32::INFINITY, f32::INFINITY, f32::INFINITY)
    }
}

/// Situated object with an orientation and bounded dynamics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobileObject {
    object: SituatedObject,
    limits: MotionLimits,
    angle: f32,
    angular_speed: f32,
    /// Realized velocity of the last move
    linear_motion: Vector2,
}

impl MobileObject {
    pub fn new(object: SituatedObject, limits: MotionLimits) -> Self {
        Self {
            object,
            limits: MotionLimits::new(
                limits.max_linear_speed,
                limits.max_linear_acceleration,
                limits.max_angular_speed,
                limits.max_angular_acceleration,
            ),
            angle: 0.0,
            angular_speed: 0.0,
            linear_motion: Vector2::ZERO,
        }
    }

    pub fn object(&self) -> &SituatedObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut SituatedObject {
        &mut self.object
    }

    pub fn limits(&self) -> &MotionLimits {
        &self.limits
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Unit vector of the current heading
    pub fn direction(&self) -> Vector2 {
        orientation_vector(self.angle)
    }

    /// Set the heading and stop any rotation
    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
        self.angular_speed = 0.0;
    }

    /// Set the heading from a direction vector and stop any rotation
    pub fn set_direction(&mut self, direction: Vector2) {
        self.set_angle(direction.orientation_angle());
    }

    /// Teleport and forget the previous velocity
    pub fn set_position(&mut self, position: Point2) -> bool {
        let moved = self.object.set_position(position);
        self.linear_motion = Vector2::ZERO;
        moved
    }

    pub fn current_angular_speed(&self) -> f32 {
        self.angular_speed
    }

    pub fn current_linear_speed(&self) -> f32 {
        self.linear_motion.length()
    }

    pub fn current_linear_motion(&self) -> Vector2 {
        self.linear_motion
    }

    /// Add `rotation` to the heading; the angular speed becomes the rotation rate
    pub fn rotate(&mut self, rotation: f32, duration: f32) {
        if !rotation.is_finite() {
            tracing::warn!(object = %self.id(), rotation, "ignoring non-finite rotation");
            return;
        }
        self.angle += rotation;
        self.angular_speed = if duration > 0.0 {
            rotation / duration
        } else {
            0.0
        };
    }

    /// Translate by `delta`, stopping at the walls of `[0, width] x [0, height]`.
    ///
    /// Returns the displacement actually applied. The realized velocity is
    /// recorded, or reset when `duration` is zero.
    pub fn move_by(&mut self, delta: Vector2, duration: f32, width: f32, height: f32) -> Vector2 {
        if !delta.is_finite() {
            tracing::warn!(object = %self.id(), ?delta, "ignoring non-finite displacement");
            return Vector2::ZERO;
        }
        let mut r = delta;
        let target = self.shape().translate(r).bounds();
        if target.lower().x < 0.0 {
            r.x -= target.lower().x;
        } else if target.upper().x > width {
            r.x -= target.upper().x - width;
        }
        if target.lower().y < 0.0 {
            r.y -= target.lower().y;
        } else if target.upper().y > height {
            r.y -= target.upper().y - height;
        }

        if !self.object.add_position(r) {
            return Vector2::ZERO;
        }

        self.linear_motion = if duration > 0.0 {
            r / duration
        } else {
            Vector2::ZERO
        };
        r
    }

    /// Displacement for a requested velocity, speed clamped to the limit
    pub fn compute_kinematic_translation(&self, velocity: Vector2, step: f32) -> Vector2 {
        let speed = velocity.length();
        if speed == 0.0 {
            return Vector2::ZERO;
        }
        let factor = step * clamp(speed, 0.0, self.limits.max_linear_speed) / speed;
        velocity * factor
    }

    /// Rotation for a requested angular velocity, clamped to the limit
    pub fn compute_kinematic_rotation(&self, angular_velocity: f32, step: f32) -> f32 {
        let speed = angular_velocity.abs();
        if speed == 0.0 {
            return 0.0;
        }
        let factor = step * clamp(speed, 0.0, self.limits.max_angular_speed) / speed;
        angular_velocity * factor
    }

    /// Displacement for a requested acceleration, integrated from the current velocity
    pub fn compute_steering_translation(&self, acceleration: Vector2, step: f32) -> Vector2 {
        let length = acceleration.length();
        let v = if length != 0.0 {
            // Accelerating against the current motion counts as braking
            let signed = if acceleration.dot(self.linear_motion) < 0.0 {
                -length
            } else {
                length
            };
            let max_acc = self.limits.max_linear_acceleration;
            let acc = clamp(signed, -max_acc, max_acc).abs() / length;
            self.linear_motion + acceleration * acc * (0.5 * step)
        } else {
            self.linear_motion
        };

        let length = v.length();
        if length == 0.0 {
            return Vector2::ZERO;
        }
        let signed = if v.dot(self.linear_motion) < 0.0 {
            -length
        } else {
            length
        };
        let speed = clamp(signed, 0.0, self.limits.max_linear_speed);
        v * (step * speed.abs() / length)
    }

    /// Rotation for a requested angular acceleration, integrated from the current angular speed
    pub fn compute_steering_rotation(&self, angular_acceleration: f32, step: f32) -> f32 {
        let v = if angular_acceleration != 0.0 {
            let max_acc = self.limits.max_angular_acceleration;
            let acc = clamp(angular_acceleration, -max_acc, max_acc).abs()
                / angular_acceleration.abs();
            angular_acceleration * acc * 0.5 * step + self.angular_speed
        } else {
            self.angular_speed
        };
        if v == 0.0 {
            return 0.0;
        }
        let max_speed = self.limits.max_angular_speed;
        let speed = clamp(v, -max_speed, max_speed);
        v * (step * speed.abs() / v.abs())
    }
}

/// Angular acceleration that turns a body toward a heading `rotation` radians away.
///
/// Far from the target the body accelerates at full torque; inside
/// `decelerate_radius` it brakes proportionally so it settles within
/// `stop_radius`.
pub fn align_torque(
    rotation: f32,
    angular_speed: f32,
    max_angular_acceleration: f32,
    stop_radius: f32,
    decelerate_radius: f32,
) -> f32 {
    let settle = TIME_TO_REACH_DIRECTION * TIME_TO_REACH_DIRECTION;
    let size = rotation.abs();
    let acceleration = if size >= stop_radius {
        if size > decelerate_radius || angular_speed == 0.0 {
            max_angular_acceleration * rotation.signum()
        } else {
            rotation / settle
        }
    } else {
        -angular_speed / settle
    };
    clamp(
        acceleration,
        -max_angular_acceleration,
        max_angular_acceleration,
    )
}

impl Situated for MobileObject {
    fn id(&self) -> ObjectId {
        self.object.id()
    }

    fn position(&self) -> Point2 {
        self.object.position()
    }

    fn shape(&self) -> Shape {
        self.object.shape()
    }

    fn name(&self) -> Option<&str> {
        self.object.name()
    }

    fn object_type(&self) -> Option<&str> {
        self.object.object_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Circle;

    fn rabbit() -> MobileObject {
        let object = SituatedObject::at(
            ObjectId::new(),
            Circle::new(Point2::ZERO, 20.0).into(),
            Point2::new(100.0, 100.0),
        );
        MobileObject::new(object, MotionLimits::new(5.0, 0.5, 1.0, 0.3))
    }

    #[test]
    fn test_limits_are_absolute() {
        let limits = MotionLimits::new(-5.0, -1.0, -2.0, -3.0);
        assert_eq!(limits.max_linear_speed, 5.0);
        assert_eq!(limits.max_angular_acceleration, 3.0);
    }

    #[test]
    fn test_non_finite_move_keeps_velocity() {
        let mut m = rabbit();
        m.move_by(Vector2::new(3.0, 0.0), 1.0, 700.0, 700.0);
        let applied = m.move_by(Vector2::new(f32::NAN, 0.0), 1.0, 700.0, 700.0);
        assert_eq!(applied, Vector2::ZERO);
        assert_eq!(m.position(), Point2::new(103.0, 100.0));
        assert_eq!(m.current_linear_motion(), Vector2::new(3.0, 0.0));

        m.move_by(Vector2::new(f32::INFINITY, 0.0), 1.0, 700.0, 700.0);
        m.rotate(f32::NAN, 1.0);
        assert_eq!(m.position(), Point2::new(103.0, 100.0));
        assert!(m.angle().is_finite());
    }

    #[test]
    fn test_kinematic_translation_clamps_speed() {
        let m = rabbit();
        let d = m.compute_kinematic_translation(Vector2::new(1000.0, 0.0), 1.0);
        assert!((d - Vector2::new(5.0, 0.0)).length() < 1e-4);
        let d = m.compute_kinematic_translation(Vector2::new(3.0, 0.0), 2.0);
        assert!((d - Vector2::new(6.0, 0.0)).length() < 1e-4);
        assert_eq!(m.compute_kinematic_translation(Vector2::ZERO, 1.0), Vector2::ZERO);
    }

    #[test]
    fn test_kinematic_rotation_keeps_sign() {
        let m = rabbit();
        assert!((m.compute_kinematic_rotation(-3.0, 1.0) + 1.0).abs() < 1e-6);
        assert!((m.compute_kinematic_rotation(0.5, 1.0) - 0.5).abs() < 1e-6);
        assert_eq!(m.compute_kinematic_rotation(0.0, 1.0), 0.0);
    }

    #[test]
    fn test_steering_from_rest_uses_half_step() {
        let m = rabbit();
        // acc clamped to 0.5, v = 0.5 * 0.5 * 1 = 0.25, displacement = 0.25
        let d = m.compute_steering_translation(Vector2::new(10.0, 0.0), 1.0);
        assert!((d - Vector2::new(0.25, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_steering_keeps_inertia_without_request() {
        let mut m = rabbit();
        m.move_by(Vector2::new(2.0, 0.0), 1.0, 700.0, 700.0);
        let d = m.compute_steering_translation(Vector2::ZERO, 1.0);
        assert!((d - Vector2::new(2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_steering_rotation_clamped() {
        let m = rabbit();
        let r = m.compute_steering_rotation(10.0, 1.0);
        assert!((r - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_move_stops_at_wall() {
        let mut m = rabbit();
        m.set_position(Point2::new(30.0, 680.0));
        let r = m.move_by(Vector2::new(-50.0, 50.0), 1.0, 700.0, 700.0);
        assert_eq!(r, Vector2::new(-10.0, 0.0));
        assert_eq!(m.position(), Point2::new(20.0, 680.0));
        assert_eq!(m.current_linear_motion(), Vector2::new(-10.0, 0.0));
    }

    #[test]
    fn test_zero_duration_resets_motion() {
        let mut m = rabbit();
        m.move_by(Vector2::new(3.0, 0.0), 0.0, 700.0, 700.0);
        assert_eq!(m.current_linear_motion(), Vector2::ZERO);
        assert_eq!(m.position(), Point2::new(103.0, 100.0));
    }

    #[test]
    fn test_set_angle_and_position_reset_dynamics() {
        let mut m = rabbit();
        m.rotate(0.5, 1.0);
        m.move_by(Vector2::new(1.0, 0.0), 1.0, 700.0, 700.0);
        assert_eq!(m.current_angular_speed(), 0.5);
        m.set_angle(1.0);
        assert_eq!(m.current_angular_speed(), 0.0);
        m.set_position(Point2::new(50.0, 50.0));
        assert_eq!(m.current_linear_speed(), 0.0);
    }

    #[test]
    fn test_align_torque_brakes_near_target() {
        assert_eq!(align_torque(2.0, 0.0, 0.3, 0.05, 0.5), 0.3);
        assert!((align_torque(0.2, 0.1, 0.3, 0.05, 0.5) - 0.05).abs() < 1e-6);
        assert!((align_torque(0.01, 0.4, 0.3, 0.05, 0.5) + 0.1).abs() < 1e-6);
    }
}
