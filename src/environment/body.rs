//! Agent bodies: the environment-side proxy of an agent
//!
//! Agents act only by depositing influences on their body. A body keeps a
//! single motion slot (the last request wins) and a queue for every other
//! influence. The environment drains both at the start of each tick and
//! stores the resulting percepts back on the body.

use crate::core::error::{EnvError, Result};
use crate::core::types::{ObjectId, BODY_TYPE};
use crate::geometry::{clamp, Point2, Shape, Vector2};

use super::frustum::Frustum;
use super::influence::{DynamicType, Emitted, Influence, MotionInfluence};
use super::mobile::{MobileObject, MotionLimits};
use super::object::{Situated, SituatedObject};
use super::percept::Percept;

#[derive(Debug)]
pub struct AgentBody {
    mobile: MobileObject,
    frustum: Option<Box<dyn Frustum>>,
    motion: Option<MotionInfluence>,
    others: Vec<Influence>,
    perceptions: Vec<Percept>,
}

impl AgentBody {
    /// Body with the given local shape and limits, typed as [`BODY_TYPE`]
    pub fn new(id: ObjectId, local_shape: Shape, limits: MotionLimits) -> Self {
        let object = SituatedObject::new(id, local_shape).with_type(BODY_TYPE);
        Self {
            mobile: MobileObject::new(object, limits),
            frustum: None,
            motion: None,
            others: Vec::new(),
            perceptions: Vec::new(),
        }
    }

    /// Attach a field of view; it must belong to this body
    pub fn with_frustum(mut self, frustum: Box<dyn Frustum>) -> Result<Self> {
        if frustum.owner() != self.id() {
            return Err(EnvError::FrustumOwnerMismatch {
                body: self.id(),
                frustum_owner: frustum.owner(),
            });
        }
        self.frustum = Some(frustum);
        Ok(self)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.mobile.object_mut().set_name(Some(name.into()));
        self
    }

    pub fn frustum(&self) -> Option<&dyn Frustum> {
        self.frustum.as_deref()
    }

    /// Region currently perceived, if the body has a frustum
    pub fn frustum_shape(&self) -> Option<Shape> {
        self.frustum
            .as_ref()
            .map(|f| f.shape(self.position(), self.direction()))
    }

    pub fn mobile(&self) -> &MobileObject {
        &self.mobile
    }

    pub(crate) fn mobile_mut(&mut self) -> &mut MobileObject {
        &mut self.mobile
    }

    pub fn angle(&self) -> f32 {
        self.mobile.angle()
    }

    pub fn direction(&self) -> Vector2 {
        self.mobile.direction()
    }

    pub fn limits(&self) -> &MotionLimits {
        self.mobile.limits()
    }

    pub fn set_type(&mut self, object_type: impl Into<String>) {
        self.mobile.object_mut().set_type(Some(object_type.into()));
    }

    /// Deposit an influence.
    ///
    /// A motion aimed at this body replaces the pending one after being
    /// clamped to the limits of its control model. Everything else is queued.
    /// Motions with non-finite components are logged and dropped.
    pub fn influence(&mut self, influence: Influence) {
        if let Influence::Motion(mi) = &influence {
            if !mi.is_finite() {
                tracing::warn!(body = %self.id(), ?mi, "dropping non-finite motion influence");
                return;
            }
        }
        match influence {
            Influence::Motion(mi) if mi.influenced.map_or(true, |id| id == self.id()) => {
                match mi.dynamic {
                    DynamicType::Kinematic => self.influence_kinematic(mi.linear, mi.angular),
                    DynamicType::Steering => self.influence_steering(mi.linear, mi.angular),
                }
            }
            other => self.others.push(other),
        }
    }

    /// Request a velocity; speeds beyond the limits are scaled down
    pub fn influence_kinematic(&mut self, linear: Vector2, angular: f32) {
        let limits = *self.limits();
        let linear = linear.clamp_length_max(limits.max_linear_speed);
        let angular = clamp(angular, -limits.max_angular_speed, limits.max_angular_speed);
        self.motion = Some(MotionInfluence::kinematic(linear, angular));
    }

    /// Request an acceleration; magnitudes beyond the limits are scaled down
    pub fn influence_steering(&mut self, linear: Vector2, angular: f32) {
        let limits = *self.limits();
        let linear = linear.clamp_length_max(limits.max_linear_acceleration);
        let angular = clamp(
            angular,
            -limits.max_angular_acceleration,
            limits.max_angular_acceleration,
        );
        self.motion = Some(MotionInfluence::steering(linear, angular));
    }

    pub fn pending_motion(&self) -> Option<&MotionInfluence> {
        self.motion.as_ref()
    }

    /// Percepts computed at the end of the last tick
    pub fn perceived_objects(&self) -> &[Percept] {
        &self.perceptions
    }

    pub(crate) fn consume_motion_influence(&mut self) -> Option<Emitted<MotionInfluence>> {
        let id = self.id();
        self.motion.take().map(|mi| Emitted::by(id, mi))
    }

    pub(crate) fn consume_other_influences(&mut self) -> Vec<Emitted<Influence>> {
        let id = self.id();
        std::mem::take(&mut self.others)
            .into_iter()
            .map(|i| Emitted::by(id, i))
            .collect()
    }

    pub(crate) fn set_perceptions(&mut self, perceptions: Vec<Percept>) {
        self.perceptions = perceptions;
    }

    pub(crate) fn place(&mut self, position: Point2, angle: f32) {
        self.mobile.set_position(position);
        self.mobile.set_angle(angle);
    }
}

impl Situated for AgentBody {
    fn id(&self) -> ObjectId {
        self.mobile.id()
    }

    fn position(&self) -> Point2 {
        self.mobile.position()
    }

    fn shape(&self) -> Shape {
        self.mobile.shape()
    }

    fn name(&self) -> Option<&str> {
        self.mobile.name()
    }

    fn object_type(&self) -> Option<&str> {
        self.mobile.object_type()
    }
}
