//! Error taxonomy surfaced to callers

use thiserror::Error;

use crate::domain::auth::AuthError;
use crate::domain::errors::StoreError;

/// Stable machine-readable rejection kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthenticated,
    InvalidCredential,
    Revoked,
    Expired,
    RateLimited,
    ValidationError,
    Unavailable,
    NotFound,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "Unauthenticated",
            ErrorKind::InvalidCredential => "InvalidCredential",
            ErrorKind::Revoked => "Revoked",
            ErrorKind::Expired => "Expired",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::Unavailable => "Unavailable",
            ErrorKind::NotFound => "NotFound",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error returned by every use case
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Rate limit of {limit} requests exceeded, retry after {retry_after_secs}s")]
    RateLimited { limit: u64, retry_after_secs: u64 },

    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// `reason` is kept for logs; the Display form only names the dependency
    #[error("{dependency} is unavailable")]
    Unavailable {
        dependency: &'static str,
        reason: String,
    },
}

impl ApplicationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unavailable(dependency: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            dependency,
            reason: reason.into(),
        }
    }

    /// Translate a store failure. Every store failure is transient from the
    /// caller's point of view.
    pub fn store(dependency: &'static str, error: StoreError) -> Self {
        Self::unavailable(dependency, error.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationError::Validation { .. } => ErrorKind::ValidationError,
            ApplicationError::Auth(AuthError::MissingCredential) => ErrorKind::Unauthenticated,
            ApplicationError::Auth(AuthError::InvalidCredential) => ErrorKind::InvalidCredential,
            ApplicationError::Auth(AuthError::Revoked) => ErrorKind::Revoked,
            ApplicationError::Auth(AuthError::Expired) => ErrorKind::Expired,
            ApplicationError::RateLimited { .. } => ErrorKind::RateLimited,
            ApplicationError::NotFound { .. } => ErrorKind::NotFound,
            ApplicationError::Unavailable { .. } => ErrorKind::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(
            ApplicationError::from(AuthError::MissingCredential).kind(),
            ErrorKind::Unauthenticated
        );
        assert_eq!(
            ApplicationError::from(AuthError::Revoked).kind().as_str(),
            "Revoked"
        );
        assert_eq!(
            ApplicationError::validation("event is required").kind(),
            ErrorKind::ValidationError
        );
    }

    #[test]
    fn test_unavailable_display_hides_store_text() {
        let err = ApplicationError::store(
            "credential_store",
            StoreError::Unavailable("connection refused (os error 111) at 10.0.0.3".to_string()),
        );
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(err.to_string(), "credential_store is unavailable");
    }
}
