//! Core types: ids, errors, configuration and the simulation clock

pub mod config;
pub mod error;
pub mod time;
pub mod types;

pub use config::{ConfigError, EnvironmentConfig, TreeKind};
pub use error::{EnvError, Result};
pub use time::{StepTimeManager, TimeManager};
pub use types::{ObjectId, Tick, BODY_TYPE, TARGET_TYPE};
