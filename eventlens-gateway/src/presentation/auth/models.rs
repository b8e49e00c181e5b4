//! Credential management DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use eventlens_core::domain::auth::{Credential, IssuedCredential};

/// Register application request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub app_name: Option<String>,
    pub owner_email: Option<String>,
}

/// Newly issued credential. The only response besides rotation that carries
/// a freshly generated token.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
    pub app_name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<IssuedCredential> for RegisterResponse {
    fn from(issued: IssuedCredential) -> Self {
        Self {
            message: "App registered successfully".to_string(),
            token: issued.token.expose().to_string(),
            app_name: issued.credential.app_name,
            expires_at: issued.credential.expires_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LookupQuery {
    pub key: Option<String>,
}

/// Lookup-by-token response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDetailsResponse {
    pub token: String,
    pub app_name: String,
    pub owner_email: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CredentialDetailsResponse {
    pub fn new(token: String, credential: Credential) -> Self {
        Self {
            token,
            app_name: credential.app_name,
            owner_email: credential.owner_email,
            is_active: credential.is_active,
            expires_at: credential.expires_at,
            created_at: credential.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialListItem {
    pub id: Uuid,
    /// Masked token, e.g. `evl_1a2b...9f0e`
    pub token_hint: String,
    pub app_name: String,
    pub owner_email: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Credential> for CredentialListItem {
    fn from(credential: Credential) -> Self {
        Self {
            id: credential.id.as_uuid(),
            token_hint: credential.token_hint,
            app_name: credential.app_name,
            owner_email: credential.owner_email,
            is_active: credential.is_active,
            expires_at: credential.expires_at,
            created_at: credential.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialListResponse {
    pub total: usize,
    pub credentials: Vec<CredentialListItem>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateResponse {
    pub message: String,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
