use thiserror::Error;

use crate::core::types::ObjectId;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("Cannot add a body after the simulation has started")]
    SimulationStarted,

    #[error("Body not found: {0}")]
    BodyNotFound(ObjectId),

    #[error("Body already registered: {0}")]
    DuplicateBody(ObjectId),

    #[error("Frustum owner {frustum_owner} does not match body {body}")]
    FrustumOwnerMismatch {
        body: ObjectId,
        frustum_owner: ObjectId,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EnvError>;
