//! Change notifications and serializable world snapshots

use serde::{Deserialize, Serialize};

use crate::core::types::{ObjectId, Tick};
use crate::geometry::{Point2, Shape, Vector2};

use super::body::AgentBody;
use super::object::Situated;

/// Pose and motion of one body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub id: ObjectId,
    pub name: Option<String>,
    pub object_type: Option<String>,
    pub position: Point2,
    pub angle: f32,
    pub linear_motion: Vector2,
}

impl BodySnapshot {
    pub fn of(body: &AgentBody) -> Self {
        Self {
            id: body.id(),
            name: body.name().map(str::to_owned),
            object_type: body.object_type().map(str::to_owned),
            position: body.position(),
            angle: body.angle(),
            linear_motion: body.mobile().current_linear_motion(),
        }
    }
}

/// Any non-body object a world model exposes (targets, obstacles)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub id: ObjectId,
    pub name: Option<String>,
    pub object_type: Option<String>,
    pub position: Point2,
    pub shape: Shape,
}

impl ObjectSnapshot {
    pub fn of(object: &impl Situated) -> Self {
        Self {
            id: object.id(),
            name: object.name().map(str::to_owned),
            object_type: object.object_type().map(str::to_owned),
            position: object.position(),
            shape: object.shape(),
        }
    }
}

/// Whole-world view handed to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub tick: Tick,
    /// Simulated seconds
    pub time: f32,
    pub width: f32,
    pub height: f32,
    pub bodies: Vec<BodySnapshot>,
    pub objects: Vec<ObjectSnapshot>,
}

impl StateSnapshot {
    pub fn body(&self, id: ObjectId) -> Option<&BodySnapshot> {
        self.bodies.iter().find(|b| b.id == id)
    }
}

/// Fired at most once per tick, when the world changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentEvent {
    pub state: StateSnapshot,
}

/// Observer of environment changes.
///
/// Listeners may be registered from any thread; they are called on the
/// thread running the tick.
pub trait EnvironmentListener: Send + Sync {
    fn environment_changed(&self, event: &EnvironmentEvent);
}
