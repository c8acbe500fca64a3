use thiserror::Error;

use super::RepositoryError;

/// Error type for service operations
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input validation failed
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Custom alias already in use
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Short code is unknown
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unrecoverable internal error
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Persistence failure that could not be classified
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::InvalidData(msg) => Self::InternalError(msg),
            err @ RepositoryError::Database(_) => Self::Repository(err),
        }
    }
}
