//! Credential entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::AuthError;
use super::value_objects::{AccessToken, CredentialId, TokenHash};

/// An issued access credential for one registered application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub token_hash: TokenHash,
    /// Masked token for display, e.g. `evl_3fa8...9c1d`
    pub token_hint: String,
    pub app_name: String,
    pub owner_email: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(
        token_hash: TokenHash,
        token_hint: String,
        app_name: String,
        owner_email: String,
        expires_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CredentialId::generate(),
            token_hash,
            token_hint,
            app_name,
            owner_email,
            is_active: true,
            expires_at,
            created_at,
        }
    }

    pub fn is_revoked(&self) -> bool {
        !self.is_active
    }

    /// Expired once `at` reaches the expiry instant, whatever the active flag says
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| at >= expires_at)
    }

    /// Gate decision for a request that arrived at `at`. Revocation wins over expiry.
    pub fn check_usable(&self, at: DateTime<Utc>) -> Result<(), AuthError> {
        if self.is_revoked() {
            return Err(AuthError::Revoked);
        }
        if self.is_expired_at(at) {
            return Err(AuthError::Expired);
        }
        Ok(())
    }
}

/// A credential together with its plaintext token, produced by issue and rotate
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub credential: Credential,
    pub token: AccessToken,
}
