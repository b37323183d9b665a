//! Percepts: read-only snapshots of perceived objects

use serde::{Deserialize, Serialize};

use crate::core::types::ObjectId;
use crate::geometry::{orientation_vector, Point2, Shape, Vector2};

use super::body::AgentBody;
use super::mobile::MobileObject;
use super::object::{Situated, SituatedObject};

/// State of a perceived object at perception time.
///
/// Detached from the live object: decision logic holding a percept cannot
/// mutate the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Percept {
    /// Set when the perceived object is an agent body
    pub body_id: Option<ObjectId>,
    pub object_id: ObjectId,
    pub name: Option<String>,
    pub shape: Shape,
    pub position: Point2,
    pub angle: f32,
    pub object_type: Option<String>,
    pub max_linear_speed: f32,
    pub max_linear_acceleration: f32,
    pub max_angular_speed: f32,
    pub max_angular_acceleration: f32,
    pub current_angular_speed: f32,
    pub current_linear_motion: Vector2,
}

impl Percept {
    /// Snapshot of a static object; dynamics are zero
    pub fn of_object(object: &SituatedObject) -> Self {
        Self {
            body_id: None,
            object_id: object.id(),
            name: object.name().map(str::to_owned),
            shape: object.shape(),
            position: object.position(),
            angle: 0.0,
            object_type: object.object_type().map(str::to_owned),
            max_linear_speed: 0.0,
            max_linear_acceleration: 0.0,
            max_angular_speed: 0.0,
            max_angular_acceleration: 0.0,
            current_angular_speed: 0.0,
            current_linear_motion: Vector2::ZERO,
        }
    }

    /// Snapshot of a mobile object that is not a body
    pub fn of_mobile(mobile: &MobileObject) -> Self {
        let limits = mobile.limits();
        Self {
            angle: mobile.angle(),
            max_linear_speed: limits.max_linear_speed,
            max_linear_acceleration: limits.max_linear_acceleration,
            max_angular_speed: limits.max_angular_speed,
            max_angular_acceleration: limits.max_angular_acceleration,
            current_angular_speed: mobile.current_angular_speed(),
            current_linear_motion: mobile.current_linear_motion(),
            ..Self::of_object(mobile.object())
        }
    }

    pub fn of_body(body: &AgentBody) -> Self {
        Self {
            body_id: Some(body.id()),
            ..Self::of_mobile(body.mobile())
        }
    }

    pub fn is_body(&self) -> bool {
        self.body_id.is_some()
    }

    pub fn direction(&self) -> Vector2 {
        orientation_vector(self.angle)
    }

    pub fn current_linear_speed(&self) -> f32 {
        self.current_linear_motion.length()
    }
}
