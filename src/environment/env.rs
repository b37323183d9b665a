//! Environment - owns the bodies and runs the influence/reaction tick
//!
//! Each tick:
//! collect influences -> kills -> endogenous influences -> apply (conflict
//! detection is the world model's job) -> perceptions -> notify -> clock.
//!
//! Rules that differ between worlds (conflicts, perception, indexing) live
//! behind the [`WorldModel`] trait.

use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::sync::{Arc, Mutex, PoisonError};

use rand::Rng;

use crate::core::config::{BodyConfig, EnvironmentConfig};
use crate::core::error::{EnvError, Result};
use crate::core::time::{StepTimeManager, TimeManager};
use crate::core::types::ObjectId;
use crate::geometry::{Circle, Point2, Rectangle, Vector2};

use super::body::AgentBody;
use super::event::{BodySnapshot, EnvironmentEvent, EnvironmentListener, ObjectSnapshot, StateSnapshot};
use super::frustum::CircleFrustum;
use super::influence::{DynamicType, Emitted, Influence, MotionInfluence};
use super::mobile::{MobileObject, MotionLimits};
use super::object::Situated;
use super::percept::Percept;

/// Body registry and world extent shared with the world model during a tick
#[derive(Debug)]
pub struct WorldState {
    bodies: BTreeMap<ObjectId, AgentBody>,
    width: f32,
    height: f32,
    /// Duration of the step being simulated
    step: f32,
    changed: bool,
}

impl WorldState {
    fn new(width: f32, height: f32) -> Self {
        Self {
            bodies: BTreeMap::new(),
            width,
            height,
            step: 0.0,
            changed: false,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// `[0, width] x [0, height]`
    pub fn bounds(&self) -> Rectangle {
        Rectangle::from_coords(0.0, 0.0, self.width, self.height)
    }

    /// Seconds covered by the current tick
    pub fn step_duration(&self) -> f32 {
        self.step
    }

    /// Bodies in id order
    pub fn bodies(&self) -> impl Iterator<Item = &AgentBody> + '_ {
        self.bodies.values()
    }

    pub fn body(&self, id: ObjectId) -> Option<&AgentBody> {
        self.bodies.get(&id)
    }

    pub fn body_mut(&mut self, id: ObjectId) -> Option<&mut AgentBody> {
        self.bodies.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Move and turn a body over the current step. Returns false for an unknown id.
    pub fn move_body(&mut self, id: ObjectId, translation: Vector2, rotation: f32) -> bool {
        let (step, width, height) = (self.step, self.width, self.height);
        let Some(body) = self.bodies.get_mut(&id) else {
            return false;
        };
        let mobile = body.mobile_mut();
        mobile.move_by(translation, step, width, height);
        mobile.rotate(rotation, step);
        self.changed = true;
        true
    }

    /// Move and turn a mobile object owned by the world model
    pub fn move_mobile(&mut self, mobile: &mut MobileObject, translation: Vector2, rotation: f32) {
        mobile.move_by(translation, self.step, self.width, self.height);
        mobile.rotate(rotation, self.step);
        self.changed = true;
    }

    /// Relabel a body. Returns false for an unknown id.
    pub fn set_body_type(&mut self, id: ObjectId, object_type: &str) -> bool {
        match self.bodies.get_mut(&id) {
            Some(body) => {
                body.set_type(object_type);
                self.changed = true;
                true
            }
            None => false,
        }
    }
}

/// Displacement and rotation a motion influence produces on `mobile` over `step`
pub fn resolve_motion(mobile: &MobileObject, influence: &MotionInfluence, step: f32) -> (Vector2, f32) {
    let (translation, rotation) = match influence.dynamic {
        DynamicType::Kinematic => (
            mobile.compute_kinematic_translation(influence.linear, step),
            mobile.compute_kinematic_rotation(influence.angular, step),
        ),
        DynamicType::Steering => (
            mobile.compute_steering_translation(influence.linear, step),
            mobile.compute_steering_rotation(influence.angular, step),
        ),
    };
    if !translation.is_finite() || !rotation.is_finite() {
        tracing::warn!(object = %mobile.id(), ?translation, rotation, "discarding non-finite motion");
        return (Vector2::ZERO, 0.0);
    }
    (translation, rotation)
}

/// World-specific rules plugged into an [`Environment`]
pub trait WorldModel: Send {
    /// A body was registered
    fn on_body_created(&mut self, _world: &mut WorldState, _body: ObjectId) {}

    /// A body was killed; it is no longer in `world`
    fn on_body_destroyed(&mut self, _world: &mut WorldState, _body: &AgentBody) {}

    /// Influences the world emits on its own this tick
    fn endogenous_influences(&mut self, _world: &WorldState) -> Vec<Influence> {
        Vec::new()
    }

    /// Resolve conflicts and apply the collected influences.
    ///
    /// Every motion targets a live body. Returns the number of motions
    /// cancelled by conflicts.
    fn apply_influences(
        &mut self,
        world: &mut WorldState,
        motions: Vec<Emitted<MotionInfluence>>,
        others: Vec<Emitted<Influence>>,
    ) -> usize;

    /// What `body` perceives after motions were applied
    fn compute_perceptions(&self, world: &WorldState, body: &AgentBody) -> Vec<Percept>;

    /// Non-body objects, for snapshots
    fn objects(&self) -> Vec<ObjectSnapshot> {
        Vec::new()
    }

    /// Radius of the field of view given to spawned bodies, if the world perceives by frustum
    fn perception_radius(&self) -> Option<f32> {
        None
    }
}

/// Situated environment driving a [`WorldModel`]
pub struct Environment<M: WorldModel> {
    world: WorldState,
    model: M,
    time: Box<dyn TimeManager>,
    listeners: Mutex<Vec<Arc<dyn EnvironmentListener>>>,
    body_config: BodyConfig,
    started: bool,
    cancelled_motions: u64,
}

impl<M: WorldModel> Environment<M> {
    pub fn new(width: f32, height: f32, model: M, time: Box<dyn TimeManager>) -> Self {
        Self {
            world: WorldState::new(width, height),
            model,
            time,
            listeners: Mutex::new(Vec::new()),
            body_config: BodyConfig::default(),
            started: false,
            cancelled_motions: 0,
        }
    }

    /// Environment sized, clocked and populated per `config`
    pub fn from_config(config: &EnvironmentConfig, model: M) -> Result<Self> {
        config.validate().map_err(EnvError::InvalidConfig)?;
        let time = StepTimeManager::new(config.time.step_duration, config.time.delay_ms);
        let mut env = Self::new(config.world.width, config.world.height, model, Box::new(time));
        env.body_config = config.body.clone();
        Ok(env)
    }

    pub fn width(&self) -> f32 {
        self.world.width
    }

    pub fn height(&self) -> f32 {
        self.world.height
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn time_manager(&self) -> &dyn TimeManager {
        self.time.as_ref()
    }

    /// True once the first tick ran; no body can be added after that
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Motions cancelled by conflicts since creation
    pub fn cancelled_motions(&self) -> u64 {
        self.cancelled_motions
    }

    pub fn add_listener(&self, listener: Arc<dyn EnvironmentListener>) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Unregister a listener; returns false if it was not registered
    pub fn remove_listener(&self, listener: &Arc<dyn EnvironmentListener>) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    /// Register a body at `position` facing `angle`
    pub fn add_agent_body(&mut self, mut body: AgentBody, position: Point2, angle: f32) -> Result<ObjectId> {
        if self.started {
            return Err(EnvError::SimulationStarted);
        }
        let id = body.id();
        if self.world.contains(id) {
            return Err(EnvError::DuplicateBody(id));
        }
        body.place(position, angle);
        self.world.bodies.insert(id, body);
        self.model.on_body_created(&mut self.world, id);
        tracing::debug!(body = %id, x = position.x, y = position.y, "body added");
        Ok(id)
    }

    /// Spawn a circular body with the configured limits at a random pose inside the world
    pub fn create_body<R: Rng>(&mut self, rng: &mut R) -> Result<ObjectId> {
        let config = &self.body_config;
        let span = 2.0 * config.radius;
        if self.world.width < span || self.world.height < span {
            return Err(EnvError::InvalidConfig(format!(
                "world {}x{} cannot hold a body of radius {}",
                self.world.width, self.world.height, config.radius
            )));
        }
        let id = ObjectId(uuid::Builder::from_random_bytes(rng.gen()).into_uuid());
        let limits = MotionLimits::new(
            config.max_linear_speed,
            config.max_linear_acceleration,
            config.max_angular_speed,
            config.max_angular_acceleration,
        );
        let radius = config.radius;
        let mut body = AgentBody::new(id, Circle::new(Point2::ZERO, radius).into(), limits)
            .with_name(format!("Rabbit #{}", self.world.body_count() + 1));
        if let Some(perception) = self.model.perception_radius() {
            body = body.with_frustum(Box::new(CircleFrustum::new(id, perception)))?;
        }
        let position = Point2::new(
            rng.gen_range(radius..=self.world.width - radius),
            rng.gen_range(radius..=self.world.height - radius),
        );
        let angle = rng.gen_range(0.0..TAU);
        self.add_agent_body(body, position, angle)
    }

    /// Bodies in id order
    pub fn agent_bodies(&self) -> impl Iterator<Item = &AgentBody> + '_ {
        self.world.bodies()
    }

    pub fn agent_body(&self, id: ObjectId) -> Option<&AgentBody> {
        self.world.body(id)
    }

    /// Mutable access, used by agents to deposit influences
    pub fn agent_body_mut(&mut self, id: ObjectId) -> Option<&mut AgentBody> {
        self.world.body_mut(id)
    }

    pub fn body_ids(&self) -> Vec<ObjectId> {
        self.world.bodies.keys().copied().collect()
    }

    pub fn body_count(&self) -> usize {
        self.world.body_count()
    }

    /// Deposit an influence on a body
    pub fn influence(&mut self, body: ObjectId, influence: Influence) -> Result<()> {
        self.world
            .body_mut(body)
            .ok_or(EnvError::BodyNotFound(body))?
            .influence(influence);
        Ok(())
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            tick: self.time.tick(),
            time: self.time.current_time(),
            width: self.world.width,
            height: self.world.height,
            bodies: self.world.bodies().map(BodySnapshot::of).collect(),
            objects: self.model.objects(),
        }
    }

    /// Run one tick
    pub fn run_behaviour(&mut self) {
        if !self.started {
            self.started = true;
            self.world.mark_changed();
            tracing::info!(bodies = self.world.body_count(), "environment started");
        }
        self.world.step = self.time.last_step_duration();

        let (mut motions, mut others, killed) = self.collect_influences();
        for id in killed {
            self.kill(id);
        }

        for influence in self.model.endogenous_influences(&self.world) {
            match influence {
                Influence::Motion(mi) => motions.push(Emitted::endogenous(mi)),
                Influence::Kill => tracing::warn!("ignoring kill influence without emitter"),
                other => others.push(Emitted::endogenous(other)),
            }
        }

        let world = &self.world;
        motions.retain(|m| match m.target() {
            Some(id) if world.contains(id) => true,
            target => {
                tracing::warn!(?target, "dropping motion influence without live target");
                false
            }
        });

        tracing::debug!(
            tick = self.time.tick(),
            motions = motions.len(),
            others = others.len(),
            "influences collected"
        );
        if !motions.is_empty() || !others.is_empty() {
            let cancelled = self.model.apply_influences(&mut self.world, motions, others);
            if cancelled > 0 {
                tracing::debug!(cancelled, "motions cancelled by conflicts");
            }
            self.cancelled_motions += cancelled as u64;
        }

        self.update_perceptions();

        if self.world.changed {
            self.world.changed = false;
            self.notify();
        }

        self.time.increment();
    }

    /// Drain every body. Foreign motions leave the other-influence queue here.
    fn collect_influences(
        &mut self,
    ) -> (Vec<Emitted<MotionInfluence>>, Vec<Emitted<Influence>>, Vec<ObjectId>) {
        let mut motions = Vec::new();
        let mut others = Vec::new();
        let mut killed = Vec::new();
        for (&id, body) in self.world.bodies.iter_mut() {
            motions.extend(body.consume_motion_influence());
            for emitted in body.consume_other_influences() {
                match emitted.influence {
                    Influence::Kill => {
                        if !killed.contains(&id) {
                            killed.push(id);
                        }
                    }
                    Influence::Motion(mi) => motions.push(Emitted { emitter: emitted.emitter, influence: mi }),
                    _ => others.push(emitted),
                }
            }
        }
        (motions, others, killed)
    }

    fn kill(&mut self, id: ObjectId) {
        if let Some(body) = self.world.bodies.remove(&id) {
            self.model.on_body_destroyed(&mut self.world, &body);
            self.world.mark_changed();
            tracing::info!(body = %id, "body killed");
        }
    }

    fn update_perceptions(&mut self) {
        let perceptions: Vec<(ObjectId, Vec<Percept>)> = self
            .world
            .bodies()
            .map(|body| (body.id(), self.model.compute_perceptions(&self.world, body)))
            .collect();
        let total: usize = perceptions.iter().map(|(_, p)| p.len()).sum();
        for (id, percepts) in perceptions {
            if let Some(body) = self.world.bodies.get_mut(&id) {
                body.set_perceptions(percepts);
            }
        }
        tracing::debug!(percepts = total, "perceptions updated");
    }

    fn notify(&self) {
        let listeners: Vec<Arc<dyn EnvironmentListener>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if listeners.is_empty() {
            return;
        }
        let event = EnvironmentEvent {
            state: self.snapshot(),
        };
        for listener in listeners {
            listener.environment_changed(&event);
        }
    }
}
