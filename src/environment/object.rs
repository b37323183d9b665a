//! Situated objects: identity, position and a shape kept relative to the origin

use serde::{Deserialize, Serialize};

use crate::core::types::ObjectId;
use crate::geometry::{Point2, Shape, Vector2};

/// Read access shared by everything that occupies space in the world
pub trait Situated {
    fn id(&self) -> ObjectId;

    fn position(&self) -> Point2;

    /// Shape in world coordinates
    fn shape(&self) -> Shape;

    fn name(&self) -> Option<&str>;

    fn object_type(&self) -> Option<&str>;
}

/// Object with a pose but no dynamics (obstacles, base of mobile objects)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SituatedObject {
    id: ObjectId,
    position: Point2,
    /// Shape around the origin, translated by `position` on read
    local_shape: Shape,
    name: Option<String>,
    object_type: Option<String>,
}

impl SituatedObject {
    pub fn new(id: ObjectId, local_shape: Shape) -> Self {
        Self {
            id,
            position: Point2::ZERO,
            local_shape,
            name: None,
            object_type: None,
        }
    }

    pub fn at(id: ObjectId, local_shape: Shape, position: Point2) -> Self {
        Self {
            position,
            ..Self::new(id, local_shape)
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    pub fn local_shape(&self) -> &Shape {
        &self.local_shape
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn set_type(&mut self, object_type: Option<String>) {
        self.object_type = object_type;
    }

    /// Move to `position`; non-finite coordinates are logged and ignored
    pub fn set_position(&mut self, position: Point2) -> bool {
        if !position.is_finite() {
            tracing::warn!(object = %self.id, ?position, "ignoring invalid position");
            return false;
        }
        self.position = position;
        true
    }

    /// Translate by `delta`; non-finite components are logged and ignored
    pub fn add_position(&mut self, delta: Vector2) -> bool {
        if !delta.is_finite() {
            tracing::warn!(object = %self.id, ?delta, "ignoring invalid displacement");
            return false;
        }
        self.position += delta;
        true
    }
}

impl Situated for SituatedObject {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn position(&self) -> Point2 {
        self.position
    }

    fn shape(&self) -> Shape {
        self.local_shape.translate(self.position)
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn object_type(&self) -> Option<&str> {
        self.object_type.as_deref()
    }
}
