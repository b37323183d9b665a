//! Small world without spatial index
//!
//! Conflicts are found by testing every pair of projected body shapes, and
//! a body perceives only the mouse target and its nearest neighbour.

use std::sync::{Mutex, PoisonError};

use crate::core::types::{ObjectId, TARGET_TYPE};
use crate::geometry::{Circle, Point2, Shape, Vector2};

use super::body::AgentBody;
use super::env::{resolve_motion, WorldModel, WorldState};
use super::event::ObjectSnapshot;
use super::influence::{Emitted, Influence, MotionInfluence};
use super::object::{Situated, SituatedObject};
use super::percept::Percept;

/// Radius of the mouse target marker
pub const TARGET_RADIUS: f32 = 5.0;

#[derive(Debug)]
pub struct PairwiseWorld {
    target_id: ObjectId,
    target: Mutex<Option<Point2>>,
}

impl PairwiseWorld {
    pub fn new() -> Self {
        Self {
            target_id: ObjectId::new(),
            target: Mutex::new(None),
        }
    }

    /// Place or clear the mouse target; may be called from any thread
    pub fn set_mouse_target(&self, target: Option<Point2>) {
        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = target;
    }

    pub fn mouse_target(&self) -> Option<SituatedObject> {
        let position = (*self.target.lock().unwrap_or_else(PoisonError::into_inner))?;
        Some(
            SituatedObject::at(
                self.target_id,
                Circle::new(Point2::ZERO, TARGET_RADIUS).into(),
                position,
            )
            .with_name("Mouse Target")
            .with_type(TARGET_TYPE),
        )
    }
}

impl Default for PairwiseWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// A motion resolved against its body, before conflict checks
struct Move {
    body: ObjectId,
    translation: Vector2,
    rotation: f32,
    projected: Shape,
}

impl WorldModel for PairwiseWorld {
    fn apply_influences(
        &mut self,
        world: &mut WorldState,
        motions: Vec<Emitted<MotionInfluence>>,
        others: Vec<Emitted<Influence>>,
    ) -> usize {
        for emitted in others {
            match emitted.influence {
                Influence::TypeChange {
                    influenced,
                    object_type,
                } => {
                    if let Some(id) = influenced.or(emitted.emitter) {
                        world.set_body_type(id, &object_type);
                    }
                }
                other => tracing::warn!(?other, "influence not supported by this world"),
            }
        }

        let step = world.step_duration();
        let mut moves: Vec<Move> = motions
            .iter()
            .filter_map(|m| {
                let id = m.target()?;
                let body = world.body(id)?;
                let (translation, rotation) = resolve_motion(body.mobile(), &m.influence, step);
                Some(Move {
                    body: id,
                    translation,
                    rotation,
                    projected: body.shape().translate(translation),
                })
            })
            .collect();

        // The later of two overlapping moves stays in place
        let mut cancelled = 0;
        for i in 1..moves.len() {
            let (earlier, rest) = moves.split_at_mut(i);
            let current = &mut rest[0];
            if earlier.iter().any(|e| e.projected.intersects(&current.projected)) {
                current.projected = current.projected.translate(-current.translation);
                current.translation = Vector2::ZERO;
                cancelled += 1;
            }
        }

        for m in moves {
            if m.translation != Vector2::ZERO || m.rotation != 0.0 {
                world.move_body(m.body, m.translation, m.rotation);
            }
        }
        cancelled
    }

    fn compute_perceptions(&self, world: &WorldState, body: &AgentBody) -> Vec<Percept> {
        let mut percepts = Vec::with_capacity(2);
        if let Some(target) = self.mouse_target() {
            percepts.push(Percept::of_object(&target));
        }
        let position = body.position();
        let nearest = world
            .bodies()
            .filter(|other| other.id() != body.id())
            .min_by(|a, b| {
                a.position()
                    .distance_squared(position)
                    .total_cmp(&b.position().distance_squared(position))
            });
        if let Some(other) = nearest {
            percepts.push(Percept::of_body(other));
        }
        percepts
    }

    fn objects(&self) -> Vec<ObjectSnapshot> {
        self.mouse_target().iter().map(ObjectSnapshot::of).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::StepTimeManager;
    use crate::environment::env::Environment;
    use crate::environment::mobile::MotionLimits;

    fn rabbit(id: u128) -> AgentBody {
        AgentBody::new(
            ObjectId::from_u128(id),
            Circle::new(Point2::ZERO, 20.0).into(),
            MotionLimits::new(5.0, 0.5, 1.0, 0.3),
        )
    }

    fn env() -> Environment<PairwiseWorld> {
        Environment::new(700.0, 700.0, PairwiseWorld::new(), Box::new(StepTimeManager::default()))
    }

    #[test]
    fn test_later_move_is_cancelled_on_overlap() {
        let mut env = env();
        let a = env.add_agent_body(rabbit(1), Point2::new(100.0, 100.0), 0.0).unwrap();
        let b = env.add_agent_body(rabbit(2), Point2::new(148.0, 100.0), 0.0).unwrap();
        env.influence(a, MotionInfluence::kinematic(Vector2::new(5.0, 0.0), 0.0).into()).unwrap();
        env.influence(b, MotionInfluence::kinematic(Vector2::new(-5.0, 0.0), 0.0).into()).unwrap();
        env.run_behaviour();

        // bodies are collected in id order, so `b` is the later one
        assert!((env.agent_body(a).unwrap().position() - Point2::new(105.0, 100.0)).length() < 1e-4);
        assert_eq!(env.agent_body(b).unwrap().position(), Point2::new(148.0, 100.0));
        assert_eq!(env.cancelled_motions(), 1);
    }

    #[test]
    fn test_distant_moves_both_apply() {
        let mut env = env();
        let a = env.add_agent_body(rabbit(1), Point2::new(100.0, 100.0), 0.0).unwrap();
        let b = env.add_agent_body(rabbit(2), Point2::new(400.0, 100.0), 0.0).unwrap();
        env.influence(a, MotionInfluence::kinematic(Vector2::new(5.0, 0.0), 0.0).into()).unwrap();
        env.influence(b, MotionInfluence::kinematic(Vector2::new(-5.0, 0.0), 0.0).into()).unwrap();
        env.run_behaviour();
        assert!((env.agent_body(b).unwrap().position().x - 395.0).abs() < 1e-4);
        assert_eq!(env.cancelled_motions(), 0);
    }

    #[test]
    fn test_perceives_target_and_nearest_body() {
        let mut env = env();
        let a = env.add_agent_body(rabbit(1), Point2::new(100.0, 100.0), 0.0).unwrap();
        let near = env.add_agent_body(rabbit(2), Point2::new(200.0, 100.0), 0.0).unwrap();
        env.add_agent_body(rabbit(3), Point2::new(600.0, 600.0), 0.0).unwrap();
        env.model().set_mouse_target(Some(Point2::new(50.0, 50.0)));
        env.run_behaviour();

        let percepts = env.agent_body(a).unwrap().perceived_objects();
        assert_eq!(percepts.len(), 2);
        assert_eq!(percepts[0].object_type.as_deref(), Some(TARGET_TYPE));
        assert_eq!(percepts[0].position, Point2::new(50.0, 50.0));
        assert_eq!(percepts[1].body_id, Some(near));

        env.model().set_mouse_target(None);
        env.run_behaviour();
        assert_eq!(env.agent_body(a).unwrap().perceived_objects().len(), 1);
    }

    #[test]
    fn test_type_change_relabels_emitter() {
        let mut env = env();
        let a = env.add_agent_body(rabbit(1), Point2::new(100.0, 100.0), 0.0).unwrap();
        env.influence(
            a,
            Influence::TypeChange {
                influenced: None,
                object_type: "WOLF".into(),
            },
        )
        .unwrap();
        env.run_behaviour();
        assert_eq!(env.agent_body(a).unwrap().object_type(), Some("WOLF"));
    }
}
