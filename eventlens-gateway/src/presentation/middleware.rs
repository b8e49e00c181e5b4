//! HTTP middleware: error mapping, credential gate and quota enforcement

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use eventlens_core::application::auth::ValidateCredentialUseCase;
use eventlens_core::application::{ApplicationError, ErrorKind};
use eventlens_core::infrastructure::TokenGenerator;
use eventlens_core::infrastructure::rate_limiter::{QuotaDecision, QuotaIdentity, QuotaLimiter};

use crate::presentation::auth::extractors::AuthenticatedCredential;
use crate::presentation::models::ErrorResponse;

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::InvalidCredential | ErrorKind::Revoked | ErrorKind::Expired => {
            StatusCode::FORBIDDEN
        }
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
    }
}

fn message_for(error: &ApplicationError) -> String {
    match error.kind() {
        ErrorKind::Unauthenticated => "Missing API key in headers".to_string(),
        ErrorKind::InvalidCredential => "Invalid API key".to_string(),
        ErrorKind::Revoked => "API key is revoked".to_string(),
        ErrorKind::Expired => "API key has expired".to_string(),
        ErrorKind::RateLimited => {
            "Too many requests for this API key. Please try again later.".to_string()
        }
        ErrorKind::Unavailable => "Service temporarily unavailable".to_string(),
        ErrorKind::ValidationError | ErrorKind::NotFound => error.to_string(),
    }
}

/// Convert ApplicationError to HTTP response.
///
/// The body carries the stable kind as `code`. Store error text stays in the
/// logs and never reaches the client.
pub fn application_error_to_response(error: ApplicationError) -> Response {
    let kind = error.kind();
    let status = status_for(kind);

    match &error {
        ApplicationError::Unavailable { dependency, reason } => tracing::error!(
            dependency,
            reason = %reason,
            http_status = %status,
            error_code = kind.as_str(),
            "Dependency failure mapped to HTTP response"
        ),
        _ if status.is_client_error() => tracing::warn!(
            error = %error,
            http_status = %status,
            error_code = kind.as_str(),
            "Client error mapped to HTTP response"
        ),
        _ => tracing::debug!(
            error = %error,
            http_status = %status,
            error_code = kind.as_str(),
            "Application error mapped to HTTP response"
        ),
    }

    let details = match &error {
        ApplicationError::RateLimited {
            limit,
            retry_after_secs,
        } => Some(serde_json::json!({
            "retryAfter": retry_after_secs,
            "limit": limit,
        })),
        _ => None,
    };

    let error_response = ErrorResponse {
        code: kind.as_str().to_string(),
        message: message_for(&error),
        details,
        request_id: Uuid::new_v4(),
        timestamp: Utc::now(),
    };

    let mut response = (status, Json(error_response)).into_response();

    if let ApplicationError::RateLimited {
        retry_after_secs, ..
    } = error
    {
        response
            .headers_mut()
            .insert("retry-after", HeaderValue::from(retry_after_secs));
    }

    response
}

/// Request logging middleware with timing and request ID
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Processing request"
    );

    let response = next.run(request).await;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = start_time.elapsed().as_millis(),
        "Request completed"
    );

    response
}

/// Token presented in `header`, if any.
///
/// Values that are empty, whitespace-only or contain anything but visible
/// ASCII count as not presented.
pub fn presented_token(headers: &HeaderMap, header: &HeaderName) -> Option<String> {
    headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Client address: first `x-forwarded-for` entry, then `x-real-ip`, then
/// the transport peer address.
pub fn client_ip(parts: &Parts) -> Option<String> {
    client_ip_from(&parts.headers, parts.extensions.get::<ConnectInfo<SocketAddr>>())
}

fn client_ip_from(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .or_else(|| connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()))
}

/// Extract IP address from request
pub fn extract_ip(request: &Request) -> String {
    client_ip_from(
        request.headers(),
        request.extensions().get::<ConnectInfo<SocketAddr>>(),
    )
    .unwrap_or_else(|| "unknown-ip".to_string())
}

/// Shared state for the credential gate
#[derive(Clone)]
pub struct CredentialGateState {
    pub validate_credential: Arc<ValidateCredentialUseCase>,
    pub header_name: HeaderName,
}

/// Resolve the presented token and attach the credential to the request.
///
/// Expiry is judged against the instant the request reached the gate.
pub async fn credential_gate_middleware(
    State(state): State<Arc<CredentialGateState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let arrived_at = Utc::now();
    let presented = presented_token(request.headers(), &state.header_name);

    match state
        .validate_credential
        .execute(presented.as_deref(), arrived_at)
        .await
    {
        Ok(credential) => {
            tracing::debug!(
                credential_id = %credential.id,
                token_hint = %credential.token_hint,
                "Credential accepted"
            );
            request
                .extensions_mut()
                .insert(AuthenticatedCredential(credential));
            next.run(request).await
        }
        Err(e) => application_error_to_response(e),
    }
}

/// Shared state for quota middleware
#[derive(Clone)]
pub struct QuotaState {
    pub limiter: Arc<QuotaLimiter>,
    pub token_generator: Arc<TokenGenerator>,
    pub header_name: HeaderName,
}

impl std::fmt::Debug for QuotaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaState")
            .field("enabled", &self.limiter.is_enabled())
            .field("limit", &self.limiter.limit())
            .finish()
    }
}

/// Counter identity: the gated credential, else the presented token's
/// digest, else the client address.
fn quota_identity(state: &QuotaState, request: &Request) -> QuotaIdentity {
    if let Some(AuthenticatedCredential(credential)) =
        request.extensions().get::<AuthenticatedCredential>()
    {
        return QuotaIdentity::Token(credential.token_hash.clone());
    }

    match presented_token(request.headers(), &state.header_name) {
        Some(token) => QuotaIdentity::Token(state.token_generator.hash_token(&token)),
        None => QuotaIdentity::Ip(extract_ip(request)),
    }
}

/// Add IETF draft rate limit headers to response
fn add_rate_limit_headers(response: &mut Response, decision: &QuotaDecision) {
    let headers = response.headers_mut();
    headers.insert("ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("ratelimit-reset", HeaderValue::from(decision.reset_at));
}

/// Fixed-window quota middleware
pub async fn quota_middleware(
    State(state): State<Arc<QuotaState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.limiter.is_enabled() {
        return next.run(request).await;
    }

    let identity = quota_identity(&state, &request);

    let decision = match state.limiter.check(&identity).await {
        Ok(decision) => decision,
        Err(e) => return application_error_to_response(e),
    };

    match decision.clone().into_result() {
        Ok(_) => {
            let mut response = next.run(request).await;
            add_rate_limit_headers(&mut response, &decision);
            response
        }
        Err(e) => {
            tracing::warn!(
                identity = identity.kind(),
                limit = decision.limit,
                retry_after = decision.retry_after,
                "Quota exceeded"
            );
            let mut response = application_error_to_response(e);
            add_rate_limit_headers(&mut response, &decision);
            response
        }
    }
}
