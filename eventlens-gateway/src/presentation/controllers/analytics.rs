//! Analytics endpoints. Every route here sits behind the credential gate
//! and the quota.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};

use eventlens_core::domain::analytics::{EventSummary, UserStats};

use super::GatewayState;
use crate::presentation::auth::controller::json_rejection;
use crate::presentation::auth::{AuthenticatedCredential, ClientIp};
use crate::presentation::middleware::application_error_to_response;
use crate::presentation::models::{
    CollectEventRequest, CollectEventResponse, EventSummaryQuery, UserStatsQuery,
};

/// POST /api/analytics/collect
pub async fn collect_event(
    State(state): State<GatewayState>,
    AuthenticatedCredential(credential): AuthenticatedCredential,
    ClientIp(client_ip): ClientIp,
    payload: Result<Json<CollectEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CollectEventResponse>), Response> {
    let Json(request) = payload.map_err(json_rejection)?;

    let event = state
        .record_event
        .execute(&credential, request.into(), client_ip)
        .await
        .map_err(application_error_to_response)?;

    Ok((
        StatusCode::CREATED,
        Json(CollectEventResponse {
            id: event.id,
            message: "Event collected successfully".to_string(),
        }),
    ))
}

/// GET /api/analytics/event-summary?event=
pub async fn get_event_summary(
    State(state): State<GatewayState>,
    AuthenticatedCredential(credential): AuthenticatedCredential,
    Query(query): Query<EventSummaryQuery>,
) -> Result<Json<EventSummary>, Response> {
    state
        .get_event_summary
        .execute(&credential, query.event)
        .await
        .map(Json)
        .map_err(application_error_to_response)
}

/// GET /api/analytics/user-stats?userId=
pub async fn get_user_stats(
    State(state): State<GatewayState>,
    AuthenticatedCredential(credential): AuthenticatedCredential,
    Query(query): Query<UserStatsQuery>,
) -> Result<Json<UserStats>, Response> {
    state
        .get_user_stats
        .execute(&credential, query.user_id)
        .await
        .map(Json)
        .map_err(application_error_to_response)
}
