//! Credential gate failures

use thiserror::Error;

/// Why a presented credential was refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("No access token was presented")]
    MissingCredential,

    #[error("Access token is not recognised")]
    InvalidCredential,

    #[error("Access token has been revoked")]
    Revoked,

    #[error("Access token has expired")]
    Expired,
}
