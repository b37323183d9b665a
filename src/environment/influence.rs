//! Influences: effects proposed by bodies or by the environment itself
//!
//! An influence is an immutable command. The environment pairs it with the
//! identity of its emitter when it consumes it from a body.

use serde::{Deserialize, Serialize};

use crate::core::types::ObjectId;
use crate::geometry::{Point2, Vector2};

/// Control model of a motion influence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DynamicType {
    /// Linear and angular parts are velocities
    Kinematic,
    /// Linear and angular parts are accelerations
    Steering,
}

/// Request to move and turn an object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionInfluence {
    pub dynamic: DynamicType,
    /// Object to move; `None` means the emitter
    pub influenced: Option<ObjectId>,
    pub linear: Vector2,
    pub angular: f32,
}

impl MotionInfluence {
    pub fn kinematic(linear: Vector2, angular: f32) -> Self {
        Self {
            dynamic: DynamicType::Kinematic,
            influenced: None,
            linear,
            angular,
        }
    }

    pub fn steering(linear: Vector2, angular: f32) -> Self {
        Self {
            dynamic: DynamicType::Steering,
            influenced: None,
            linear,
            angular,
        }
    }

    /// Whether both components are finite numbers
    pub fn is_finite(&self) -> bool {
        self.linear.is_finite() && self.angular.is_finite()
    }

    /// Aim the influence at another object
    pub fn on(mut self, influenced: ObjectId) -> Self {
        self.influenced = Some(influenced);
        self
    }
}

/// Every effect an emitter can propose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Influence {
    Motion(MotionInfluence),
    /// Remove the emitting body from the world
    Kill,
    /// Relabel an object; `None` relabels the emitter
    TypeChange {
        influenced: Option<ObjectId>,
        object_type: String,
    },
    /// Remove a non-body object
    Remove { influenced: ObjectId },
    /// Create the mouse target at a position
    TargetAddition { position: Point2 },
    /// Move a non-body object to a position
    Teleport {
        influenced: ObjectId,
        position: Point2,
    },
}

impl From<MotionInfluence> for Influence {
    fn from(motion: MotionInfluence) -> Self {
        Influence::Motion(motion)
    }
}

/// An influence paired with the body that emitted it (`None` for the environment)
#[derive(Debug, Clone, PartialEq)]
pub struct Emitted<T> {
    pub emitter: Option<ObjectId>,
    pub influence: T,
}

impl<T> Emitted<T> {
    pub fn by(emitter: ObjectId, influence: T) -> Self {
        Self {
            emitter: Some(emitter),
            influence,
        }
    }

    pub fn endogenous(influence: T) -> Self {
        Self {
            emitter: None,
            influence,
        }
    }
}

impl Emitted<MotionInfluence> {
    /// Object the motion applies to: the named object, else the emitter
    pub fn target(&self) -> Option<ObjectId> {
        self.influence.influenced.or(self.emitter)
    }
}
