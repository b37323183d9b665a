//! Situated environment: objects, bodies, influences and the tick loop

pub mod body;
pub mod env;
pub mod event;
pub mod frustum;
pub mod indexed;
pub mod influence;
pub mod mobile;
pub mod object;
pub mod pairwise;
pub mod percept;

pub use body::AgentBody;
pub use env::{resolve_motion, Environment, WorldModel, WorldState};
pub use event::{BodySnapshot, EnvironmentEvent, EnvironmentListener, ObjectSnapshot, StateSnapshot};
pub use frustum::{CircleFrustum, Frustum};
pub use indexed::{EntryKind, IndexEntry, IndexedWorld};
pub use influence::{DynamicType, Emitted, Influence, MotionInfluence};
pub use mobile::{align_torque, MobileObject, MotionLimits, TIME_TO_REACH_DIRECTION};
pub use object::{Situated, SituatedObject};
pub use pairwise::PairwiseWorld;
pub use percept::Percept;
