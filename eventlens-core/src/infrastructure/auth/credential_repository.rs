//! SQLx implementation of the credential repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::auth::{Credential, CredentialId, ICredentialRepository, TokenHash};
use crate::domain::errors::StoreError;

/// Database row for the credentials table
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    token_hash: String,
    token_hint: String,
    app_name: String,
    owner_email: String,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<CredentialRow> for Credential {
    fn from(row: CredentialRow) -> Self {
        Credential {
            id: CredentialId::from(row.id),
            token_hash: TokenHash::from(row.token_hash),
            token_hint: row.token_hint,
            app_name: row.app_name,
            owner_email: row.owner_email,
            is_active: row.is_active,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

const CREDENTIAL_COLUMNS: &str =
    "id, token_hash, token_hint, app_name, owner_email, is_active, expires_at, created_at";

/// SQLx implementation of the credential repository
pub struct SqlxCredentialRepository {
    pool: Arc<PgPool>,
}

impl SqlxCredentialRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn log_store_error(operation: &str, error: sqlx::Error) -> StoreError {
    let error = StoreError::from(error);
    if error != StoreError::Duplicate {
        tracing::error!(operation, error = %error, "Credential store error");
    }
    error
}

#[async_trait]
impl ICredentialRepository for SqlxCredentialRepository {
    async fn create(&self, credential: &Credential) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO credentials (id, token_hash, token_hint, app_name, owner_email, is_active, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(credential.id.as_uuid())
        .bind(credential.token_hash.as_str())
        .bind(&credential.token_hint)
        .bind(&credential.app_name)
        .bind(&credential.owner_email)
        .bind(credential.is_active)
        .bind(credential.expires_at)
        .bind(credential.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| log_store_error("create", e))?;

        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &TokenHash) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE token_hash = $1"
        ))
        .bind(token_hash.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| log_store_error("find_by_hash", e))?;

        Ok(row.map(Credential::from))
    }

    async fn deactivate(&self, token_hash: &TokenHash) -> Result<bool, StoreError> {
        // Matching an already-inactive row still counts, so repeats stay successful
        let result = sqlx::query("UPDATE credentials SET is_active = FALSE WHERE token_hash = $1")
            .bind(token_hash.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| log_store_error("deactivate", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn replace_token(
        &self,
        current: &TokenHash,
        replacement: &TokenHash,
        replacement_hint: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            r#"
            UPDATE credentials
            SET token_hash = $2, token_hint = $3, is_active = TRUE, expires_at = $4
            WHERE token_hash = $1
            RETURNING {CREDENTIAL_COLUMNS}
            "#
        ))
        .bind(current.as_str())
        .bind(replacement.as_str())
        .bind(replacement_hint)
        .bind(expires_at)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| log_store_error("replace_token", e))?;

        Ok(row.map(Credential::from))
    }

    async fn list(&self) -> Result<Vec<Credential>, StoreError> {
        let rows = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM credentials ORDER BY created_at DESC, id"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| log_store_error("list", e))?;

        Ok(rows.into_iter().map(Credential::from).collect())
    }
}
