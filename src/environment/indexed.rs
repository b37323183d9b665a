//! World backed by a spatial tree
//!
//! Bodies, the mouse target and static obstacles are indexed by shape.
//! Perception is a frustum query on the index. Conflicts are found by
//! sweeping each motion into a hull, indexing the hulls in a throwaway
//! quad-tree and comparing hulls along every leaf-to-root path.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use crate::core::config::{EnvironmentConfig, TreeKind};
use crate::core::types::{ObjectId, TARGET_TYPE};
use crate::geometry::{Circle, MotionHull, Point2, Rectangle, Shape, Vector2, VectorExt};
use crate::spatial::{
    BinaryTree, BinaryTreeFactory, QuadTree, QuadTreeFactory, ShapedObject, SpatialDataStructure,
};

use super::body::AgentBody;
use super::env::{resolve_motion, WorldModel, WorldState};
use super::event::ObjectSnapshot;
use super::influence::{Emitted, Influence, MotionInfluence};
use super::mobile::{MobileObject, MotionLimits};
use super::object::{Situated, SituatedObject};
use super::pairwise::TARGET_RADIUS;
use super::percept::Percept;

/// What an index entry stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Body,
    Target,
    Static,
}

/// Key stored in the world index; the shape is the object's shape at insertion
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub id: ObjectId,
    pub kind: EntryKind,
    pub shape: Shape,
}

impl IndexEntry {
    fn of(object: &impl Situated, kind: EntryKind) -> Self {
        Self {
            id: object.id(),
            kind,
            shape: object.shape(),
        }
    }
}

impl ShapedObject for IndexEntry {
    fn shape(&self) -> Shape {
        self.shape
    }
}

/// A motion swept over one step, indexed during conflict detection
#[derive(Debug, Clone, PartialEq)]
struct Artifact {
    index: usize,
    hull: MotionHull,
}

impl ShapedObject for Artifact {
    fn shape(&self) -> Shape {
        self.hull.into()
    }
}

struct Action {
    body: ObjectId,
    translation: Vector2,
    rotation: f32,
    hull: MotionHull,
    cleared: bool,
}

pub struct IndexedWorld {
    index: Box<dyn SpatialDataStructure<IndexEntry> + Send>,
    perception_radius: f32,
    statics: BTreeMap<ObjectId, SituatedObject>,
    target_id: ObjectId,
    target: Option<MobileObject>,
    requested_target: Mutex<Option<Point2>>,
}

impl IndexedWorld {
    /// Quad-tree world of the given extent with default tree depth
    pub fn new(width: f32, height: f32, perception_radius: f32) -> Self {
        let bounds = Rectangle::from_coords(0.0, 0.0, width, height);
        let index = QuadTree::with_bounds(QuadTreeFactory::new(), bounds);
        Self::with_index(Box::new(index), perception_radius)
    }

    /// World over an already initialized index
    pub fn with_index(
        index: Box<dyn SpatialDataStructure<IndexEntry> + Send>,
        perception_radius: f32,
    ) -> Self {
        Self {
            index,
            perception_radius,
            statics: BTreeMap::new(),
            target_id: ObjectId::new(),
            target: None,
            requested_target: Mutex::new(None),
        }
    }

    pub fn from_config(config: &EnvironmentConfig) -> Self {
        let bounds = Rectangle::from_coords(0.0, 0.0, config.world.width, config.world.height);
        let depth = config.index.max_depth;
        let index: Box<dyn SpatialDataStructure<IndexEntry> + Send> = match config.index.tree {
            TreeKind::Quad => Box::new(QuadTree::with_bounds(
                QuadTreeFactory::with_max_depth(depth),
                bounds,
            )),
            TreeKind::Binary => Box::new(BinaryTree::with_bounds(
                BinaryTreeFactory::with_max_depth(depth),
                bounds,
            )),
        };
        Self::with_index(index, config.index.perception_radius)
    }

    pub fn index(&self) -> &dyn SpatialDataStructure<IndexEntry> {
        self.index.as_ref()
    }

    /// Register an obstacle. Returns false if the id is already used.
    pub fn add_static_object(&mut self, object: SituatedObject) -> bool {
        if self.statics.contains_key(&object.id()) {
            return false;
        }
        if !self.index.add_data(IndexEntry::of(&object, EntryKind::Static)) {
            return false;
        }
        self.statics.insert(object.id(), object);
        true
    }

    pub fn static_objects(&self) -> impl Iterator<Item = &SituatedObject> + '_ {
        self.statics.values()
    }

    /// Request the mouse target at a position, or its removal; may be called
    /// from any thread. Takes effect on the next tick.
    pub fn set_mouse_target(&self, target: Option<Point2>) {
        *self
            .requested_target
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = target;
    }

    pub fn mouse_target(&self) -> Option<&MobileObject> {
        self.target.as_ref()
    }

    fn add_target(&mut self, world: &mut WorldState, position: Point2) {
        if self.target.is_some() {
            tracing::warn!("mouse target already present");
            return;
        }
        let object = SituatedObject::at(
            self.target_id,
            Circle::new(Point2::ZERO, TARGET_RADIUS).into(),
            position,
        )
        .with_name("Mouse Target")
        .with_type(TARGET_TYPE);
        let target = MobileObject::new(object, MotionLimits::unbounded());
        self.index.add_data(IndexEntry::of(&target, EntryKind::Target));
        self.target = Some(target);
        world.mark_changed();
    }

    fn remove_target(&mut self, world: &mut WorldState) {
        if let Some(target) = self.target.take() {
            self.index.remove_data(&IndexEntry::of(&target, EntryKind::Target));
            world.mark_changed();
        }
    }

    /// Move the target to `position`, turning it toward the motion
    fn teleport_target(&mut self, world: &mut WorldState, position: Point2) {
        let Some(mut target) = self.target.take() else {
            tracing::warn!("teleport without mouse target");
            return;
        };
        self.index.remove_data(&IndexEntry::of(&target, EntryKind::Target));
        let motion = position - target.position();
        let rotation = if motion.is_epsilon_zero() {
            0.0
        } else {
            target.direction().signed_angle(motion)
        };
        world.move_mobile(&mut target, motion, rotation);
        self.index.add_data(IndexEntry::of(&target, EntryKind::Target));
        self.target = Some(target);
    }

    fn apply_other(&mut self, world: &mut WorldState, emitted: Emitted<Influence>) {
        match emitted.influence {
            Influence::TargetAddition { position } => self.add_target(world, position),
            Influence::Teleport {
                influenced,
                position,
            } if influenced == self.target_id => self.teleport_target(world, position),
            Influence::Remove { influenced } if influenced == self.target_id => {
                self.remove_target(world)
            }
            Influence::Remove { influenced } => match self.statics.remove(&influenced) {
                Some(object) => {
                    self.index
                        .remove_data(&IndexEntry::of(&object, EntryKind::Static));
                    world.mark_changed();
                }
                None => tracing::warn!(object = %influenced, "remove of unknown object"),
            },
            Influence::TypeChange {
                influenced,
                object_type,
            } => {
                let Some(id) = influenced.or(emitted.emitter) else {
                    return;
                };
                if !world.set_body_type(id, &object_type) {
                    if let Some(object) = self.statics.get_mut(&id) {
                        object.set_type(Some(object_type));
                        world.mark_changed();
                    }
                }
            }
            other => tracing::warn!(?other, "influence not supported by this world"),
        }
    }

    /// Clear every action whose hull conflicts; returns the number cleared
    fn detect_conflicts(&self, world: &WorldState, actions: &mut [Action]) -> usize {
        let mut tree = QuadTree::with_bounds(QuadTreeFactory::new(), world.bounds());
        for (index, action) in actions.iter().enumerate() {
            tree.add_data(Artifact {
                index,
                hull: action.hull,
            });
        }

        let obstacles: Vec<Shape> = self
            .index
            .data_iter()
            .filter(|e| e.kind != EntryKind::Body)
            .map(|e| e.shape)
            .collect();

        for leaf in tree.leaves() {
            let group: Vec<usize> = tree.data_to_root(leaf.id()).map(|a| a.index).collect();
            for (pos, &i) in group.iter().enumerate() {
                if actions[i].cleared {
                    continue;
                }
                let hull = Shape::from(actions[i].hull);
                if obstacles.iter().any(|o| hull.intersects(o)) {
                    actions[i].cleared = true;
                    continue;
                }
                for &j in &group[pos + 1..] {
                    if !actions[j].cleared && hull.intersects(&actions[j].hull.into()) {
                        actions[j].cleared = true;
                    }
                }
            }
        }
        actions.iter().filter(|a| a.cleared).count()
    }
}

impl WorldModel for IndexedWorld {
    fn on_body_created(&mut self, world: &mut WorldState, body: ObjectId) {
        if let Some(body) = world.body(body) {
            self.index.add_data(IndexEntry::of(body, EntryKind::Body));
        }
    }

    fn on_body_destroyed(&mut self, _world: &mut WorldState, body: &AgentBody) {
        if !self.index.remove_data(&IndexEntry::of(body, EntryKind::Body)) {
            tracing::warn!(body = %body.id(), "killed body was not indexed");
        }
    }

    fn endogenous_influences(&mut self, _world: &WorldState) -> Vec<Influence> {
        let requested = *self
            .requested_target
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let influence = match (requested, &self.target) {
            (None, None) => return Vec::new(),
            (None, Some(_)) => Influence::Remove {
                influenced: self.target_id,
            },
            (Some(position), Some(target)) if target.position() == position => return Vec::new(),
            (Some(position), Some(_)) => Influence::Teleport {
                influenced: self.target_id,
                position,
            },
            (Some(position), None) => Influence::TargetAddition { position },
        };
        vec![influence]
    }

    fn apply_influences(
        &mut self,
        world: &mut WorldState,
        motions: Vec<Emitted<MotionInfluence>>,
        others: Vec<Emitted<Influence>>,
    ) -> usize {
        for emitted in others {
            self.apply_other(world, emitted);
        }

        let step = world.step_duration();
        let mut actions: Vec<Action> = motions
            .iter()
            .filter_map(|m| {
                let id = m.target()?;
                let body = world.body(id)?;
                let (translation, rotation) = resolve_motion(body.mobile(), &m.influence, step);
                let hull = MotionHull::new(body.position(), translation, body.shape().max_demi_size());
                Some(Action {
                    body: id,
                    translation,
                    rotation,
                    hull,
                    cleared: false,
                })
            })
            .collect();

        let cancelled = self.detect_conflicts(world, &mut actions);

        for action in actions.iter().filter(|a| !a.cleared) {
            let Some(body) = world.body(action.body) else {
                continue;
            };
            let before = IndexEntry::of(body, EntryKind::Body);
            self.index.remove_data(&before);
            world.move_body(action.body, action.translation, action.rotation);
            if let Some(body) = world.body(action.body) {
                self.index.add_data(IndexEntry::of(body, EntryKind::Body));
            }
        }
        cancelled
    }

    fn compute_perceptions(&self, world: &WorldState, body: &AgentBody) -> Vec<Percept> {
        let (Some(frustum), Some(shape)) = (body.frustum(), body.frustum_shape()) else {
            return Vec::new();
        };
        let owner = frustum.owner();
        self.index
            .data_iter_in(&shape)
            .filter(|e| e.id != owner)
            .filter_map(|e| match e.kind {
                EntryKind::Body => world.body(e.id).map(Percept::of_body),
                EntryKind::Target => self.target.as_ref().map(Percept::of_mobile),
                EntryKind::Static => self.statics.get(&e.id).map(Percept::of_object),
            })
            .collect()
    }

    fn objects(&self) -> Vec<ObjectSnapshot> {
        self.target
            .iter()
            .map(ObjectSnapshot::of)
            .chain(self.statics.values().map(ObjectSnapshot::of))
            .collect()
    }

    fn perception_radius(&self) -> Option<f32> {
        Some(self.perception_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::StepTimeManager;
    use crate::environment::env::Environment;
    use crate::environment::frustum::CircleFrustum;

    fn rabbit(id: u128) -> AgentBody {
        let id = ObjectId::from_u128(id);
        AgentBody::new(
            id,
            Circle::new(Point2::ZERO, 20.0).into(),
            MotionLimits::new(5.0, 0.5, 1.0, 0.3),
        )
        .with_frustum(Box::new(CircleFrustum::new(id, 150.0)))
        .unwrap()
    }

    fn env() -> Environment<IndexedWorld> {
        Environment::new(
            700.0,
            700.0,
            IndexedWorld::new(700.0, 700.0, 150.0),
            Box::new(StepTimeManager::default()),
        )
    }

    #[test]
    fn test_bodies_are_indexed_and_unindexed() {
        let mut env = env();
        let a = env.add_agent_body(rabbit(1), Point2::new(100.0, 100.0), 0.0).unwrap();
        env.add_agent_body(rabbit(2), Point2::new(300.0, 300.0), 0.0).unwrap();
        assert_eq!(env.model().index().len(), 2);
        env.influence(a, Influence::Kill).unwrap();
        env.run_behaviour();
        assert_eq!(env.model().index().len(), 1);
        assert!(env.model().index().data_iter().all(|e| e.id != a));
    }

    #[test]
    fn test_moved_body_is_reindexed() {
        let mut env = env();
        let a = env.add_agent_body(rabbit(1), Point2::new(100.0, 100.0), 0.0).unwrap();
        env.influence(a, MotionInfluence::kinematic(Vector2::new(5.0, 0.0), 0.0).into()).unwrap();
        env.run_behaviour();
        let entry = env.model().index().data_iter().next().unwrap().clone();
        assert_eq!(entry.shape, env.agent_body(a).unwrap().shape());
    }

    #[test]
    fn test_frustum_excludes_owner() {
        let mut env = env();
        let a = env.add_agent_body(rabbit(1), Point2::new(100.0, 100.0), 0.0).unwrap();
        let b = env.add_agent_body(rabbit(2), Point2::new(200.0, 100.0), 0.0).unwrap();
        env.add_agent_body(rabbit(3), Point2::new(600.0, 600.0), 0.0).unwrap();
        env.run_behaviour();
        let percepts = env.agent_body(a).unwrap().perceived_objects();
        assert_eq!(percepts.len(), 1);
        assert_eq!(percepts[0].body_id, Some(b));
    }

    #[test]
    fn test_crossing_hulls_cancel_later_motion() {
        let mut env = env();
        let a = env.add_agent_body(rabbit(1), Point2::new(100.0, 100.0), 0.0).unwrap();
        let b = env.add_agent_body(rabbit(2), Point2::new(140.0, 100.0), 0.0).unwrap();
        env.influence(a, MotionInfluence::kinematic(Vector2::new(5.0, 0.0), 0.0).into()).unwrap();
        env.influence(b, MotionInfluence::kinematic(Vector2::new(-5.0, 0.0), 0.0).into()).unwrap();
        env.run_behaviour();
        assert_eq!(env.cancelled_motions(), 1);
        let moved = [a, b]
            .iter()
            .filter(|&&id| env.agent_body(id).unwrap().mobile().current_linear_speed() > 0.0)
            .count();
        assert_eq!(moved, 1);
    }

    #[test]
    fn test_static_obstacle_blocks_motion() {
        let mut env = env();
        let a = env.add_agent_body(rabbit(1), Point2::new(100.0, 100.0), 0.0).unwrap();
        let rock = SituatedObject::at(
            ObjectId::from_u128(99),
            Rectangle::from_coords(-5.0, -50.0, 5.0, 50.0).into(),
            Point2::new(127.0, 100.0),
        )
        .with_type("ROCK");
        assert!(env.model_mut().add_static_object(rock.clone()));
        assert!(!env.model_mut().add_static_object(rock));

        env.influence(a, MotionInfluence::kinematic(Vector2::new(5.0, 0.0), 0.0).into()).unwrap();
        env.run_behaviour();
        assert_eq!(env.agent_body(a).unwrap().position(), Point2::new(100.0, 100.0));
        assert_eq!(env.cancelled_motions(), 1);

        let percepts = env.agent_body(a).unwrap().perceived_objects();
        assert!(percepts.iter().any(|p| p.object_type.as_deref() == Some("ROCK")));
    }

    #[test]
    fn test_mouse_target_lifecycle() {
        let mut env = env();
        let a = env.add_agent_body(rabbit(1), Point2::new(100.0, 100.0), 0.0).unwrap();
        let targets = |env: &Environment<IndexedWorld>| {
            env.agent_body(a)
                .unwrap()
                .perceived_objects()
                .iter()
                .filter(|p| p.object_type.as_deref() == Some(TARGET_TYPE))
                .map(|p| p.position)
                .collect::<Vec<_>>()
        };

        env.model().set_mouse_target(Some(Point2::new(150.0, 100.0)));
        env.run_behaviour();
        assert_eq!(targets(&env), vec![Point2::new(150.0, 100.0)]);

        env.model().set_mouse_target(Some(Point2::new(150.0, 150.0)));
        env.run_behaviour();
        assert_eq!(targets(&env), vec![Point2::new(150.0, 150.0)]);
        let target = env.model().mouse_target().unwrap();
        // facing +x, moved toward +y
        assert!((target.angle() - std::f32::consts::FRAC_PI_2).abs() < 1e-5);

        env.model().set_mouse_target(None);
        env.run_behaviour();
        assert!(targets(&env).is_empty());
        assert!(env.model().mouse_target().is_none());
        assert_eq!(env.model().index().len(), 1);
    }

    #[test]
    fn test_binary_index_from_config() {
        let mut config = EnvironmentConfig::new();
        config.index.tree = TreeKind::Binary;
        let mut env = Environment::from_config(&config, IndexedWorld::from_config(&config)).unwrap();
        let a = env.add_agent_body(rabbit(1), Point2::new(100.0, 100.0), 0.0).unwrap();
        let b = env.add_agent_body(rabbit(2), Point2::new(180.0, 100.0), 0.0).unwrap();
        env.run_behaviour();
        let percepts = env.agent_body(a).unwrap().perceived_objects();
        assert_eq!(percepts.len(), 1);
        assert_eq!(percepts[0].body_id, Some(b));
    }
}
