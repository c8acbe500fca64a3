use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Store file read, write or (de)serialization failure
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Short code already taken
    #[error("Conflict error: {0}")]
    Conflict(String),

    /// The operation cannot be applied to the current data
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
