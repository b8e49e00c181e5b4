//! Credential repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::entities::Credential;
use super::value_objects::TokenHash;
use crate::domain::errors::StoreError;

/// Persistence for credentials. Rows are never deleted.
#[async_trait]
pub trait ICredentialRepository: Send + Sync {
    /// Insert a new credential; `StoreError::Duplicate` on a token hash collision
    async fn create(&self, credential: &Credential) -> Result<(), StoreError>;

    async fn find_by_hash(&self, token_hash: &TokenHash) -> Result<Option<Credential>, StoreError>;

    /// Clear the active flag. Returns false when no credential has this hash.
    async fn deactivate(&self, token_hash: &TokenHash) -> Result<bool, StoreError>;

    /// Atomically swap the token, reactivate and set a new expiry.
    /// Returns the updated credential, or `None` when `current` does not exist.
    async fn replace_token(
        &self,
        current: &TokenHash,
        replacement: &TokenHash,
        replacement_hint: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Credential>, StoreError>;

    /// All credentials, newest first
    async fn list(&self) -> Result<Vec<Credential>, StoreError>;
}
