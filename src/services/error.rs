use thiserror::Error;

use crate::auth::JwtError;
use crate::database::manager::DatabaseError;

/// Failure taxonomy shared by the core services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation { field: Option<&'static str>, message: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Storage(#[from] DatabaseError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error("password hashing failed: {0}")]
    Password(#[from] bcrypt::BcryptError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation { field: None, message: message.into() }
    }

    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation { field: Some(field), message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
