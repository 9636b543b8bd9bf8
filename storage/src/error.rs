//! Storage error types.
//!
//! Returned by identity store implementations; callers degrade to fallbacks instead of failing.

use thiserror::Error;

/// Errors that can occur when reading the identity store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Invalid stored value: {0}")]
    InvalidValue(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Database(e.to_string())
    }
}
