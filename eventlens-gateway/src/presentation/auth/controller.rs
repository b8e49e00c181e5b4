//! Credential management controller endpoints
//!
//! These routes are not behind the credential gate or the quota.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use std::sync::Arc;

use eventlens_core::application::ApplicationError;
use eventlens_core::application::auth::{
    IssueCredentialUseCase, ListCredentialsUseCase, LookupCredentialUseCase,
    RevokeCredentialUseCase, RotateCredentialUseCase,
};

use crate::presentation::auth::models::*;
use crate::presentation::middleware::application_error_to_response;

/// State for credential management endpoints
#[derive(Clone)]
pub struct CredentialAppState {
    pub issue_credential: Arc<IssueCredentialUseCase>,
    pub lookup_credential: Arc<LookupCredentialUseCase>,
    pub revoke_credential: Arc<RevokeCredentialUseCase>,
    pub rotate_credential: Arc<RotateCredentialUseCase>,
    pub list_credentials: Arc<ListCredentialsUseCase>,
}

/// Map a body decode failure into the error taxonomy
pub(crate) fn json_rejection(rejection: JsonRejection) -> Response {
    tracing::debug!(error = %rejection, "Rejected request body");
    application_error_to_response(ApplicationError::validation(
        "Request body must be a JSON object",
    ))
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<CredentialAppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), Response> {
    let Json(request) = payload.map_err(json_rejection)?;

    let issued = state
        .issue_credential
        .execute(
            request.app_name.as_deref().unwrap_or_default(),
            request.owner_email.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(application_error_to_response)?;

    tracing::info!(
        credential_id = %issued.credential.id,
        token_hint = %issued.credential.token_hint,
        "Registered application"
    );

    Ok((StatusCode::CREATED, Json(RegisterResponse::from(issued))))
}

/// GET /api/auth/api-key?key=
pub async fn get_credential(
    State(state): State<CredentialAppState>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<CredentialDetailsResponse>, Response> {
    let key = query.key.unwrap_or_default();

    let credential = state
        .lookup_credential
        .execute(&key)
        .await
        .map_err(application_error_to_response)?;

    Ok(Json(CredentialDetailsResponse::new(
        key.trim().to_string(),
        credential,
    )))
}

/// DELETE /api/auth/api-key/{key}
pub async fn revoke_credential(
    State(state): State<CredentialAppState>,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>, Response> {
    state
        .revoke_credential
        .execute(&key)
        .await
        .map_err(application_error_to_response)?;

    Ok(Json(MessageResponse {
        message: "API key revoked successfully".to_string(),
    }))
}

/// PUT /api/auth/api-key/{key}/regenerate
pub async fn regenerate_credential(
    State(state): State<CredentialAppState>,
    Path(key): Path<String>,
) -> Result<Json<RegenerateResponse>, Response> {
    let rotated = state
        .rotate_credential
        .execute(&key)
        .await
        .map_err(application_error_to_response)?;

    Ok(Json(RegenerateResponse {
        message: "API key regenerated successfully".to_string(),
        token: rotated.token.expose().to_string(),
        expires_at: rotated.credential.expires_at,
    }))
}

/// GET /api/auth/list
pub async fn list_credentials(
    State(state): State<CredentialAppState>,
) -> Result<Json<CredentialListResponse>, Response> {
    let credentials = state
        .list_credentials
        .execute()
        .await
        .map_err(application_error_to_response)?;

    Ok(Json(CredentialListResponse {
        total: credentials.len(),
        credentials: credentials
            .into_iter()
            .map(CredentialListItem::from)
            .collect(),
    }))
}
