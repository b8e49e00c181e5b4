//! Store-level failures shared by every repository and key-value store

use thiserror::Error;

/// Failure reported by an external store (relational, cache or counter).
///
/// The payload strings are for logs only and must not reach callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unreachable: {0}")]
    Unavailable(String),

    #[error("Store call timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Unique constraint violated")]
    Duplicate,

    #[error("Stored data could not be decoded: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Corrupt(error.to_string())
            }
            _ => StoreError::Unavailable(error.to_string()),
        }
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(error: redis::RedisError) -> Self {
        if error.kind() == redis::ErrorKind::TypeError {
            StoreError::Corrupt(error.to_string())
        } else {
            StoreError::Unavailable(error.to_string())
        }
    }
}
