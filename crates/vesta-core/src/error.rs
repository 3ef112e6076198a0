//! Error types for the Vesta system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VestaError {
    #[error("No authenticated principal")]
    Unauthorized,

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Invalid range: {message}")]
    InvalidRange { message: String },

    #[error("Unavailable: {entity}")]
    Unavailable { entity: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Invalid transition: {message}")]
    InvalidTransition { message: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VestaError {
    pub fn conflict(message: impl Into<String>) -> Self {
        VestaError::Conflict {
            message: message.into(),
        }
    }

    pub fn invalid_transition(message: impl Into<String>) -> Self {
        VestaError::InvalidTransition {
            message: message.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        VestaError::Forbidden {
            reason: reason.into(),
        }
    }
}

pub type VestaResult<T> = Result<T, VestaError>;
