//! Route definitions and server setup

use axum::http::{HeaderName, Method, StatusCode, header};
use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use eventlens_core::config::ServerConfig;

use crate::presentation::{
    auth::controller::{
        get_credential, list_credentials, regenerate_credential, register, revoke_credential,
    },
    controllers::{
        GatewayState,
        analytics::{collect_event, get_event_summary, get_user_stats},
        health::health_check,
    },
    middleware::{credential_gate_middleware, logging_middleware, quota_middleware},
};

fn cors_layer(server: &ServerConfig, credential_header: HeaderName) -> CorsLayer {
    let allow_origin = if server.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<axum::http::HeaderValue> = server
            .allowed_origins
            .iter()
            .filter_map(|origin| {
                axum::http::HeaderValue::from_str(origin)
                    .map_err(|_| {
                        tracing::warn!(origin, "Invalid CORS origin in config; skipping");
                    })
                    .ok()
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::USER_AGENT,
            header::ORIGIN,
            credential_header,
        ])
        .max_age(Duration::from_secs(3600))
}

pub fn create_router(state: GatewayState, server: &ServerConfig) -> Router {
    // Credential management routes are not gated
    let credential_routes = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/api-key", get(get_credential))
        .route("/auth/list", get(list_credentials))
        .route(
            "/auth/api-key/{key}",
            axum::routing::delete(revoke_credential),
        )
        .route("/auth/api-key/{key}/regenerate", put(regenerate_credential))
        .with_state(state.credentials.clone());

    // Layer order is reversed: the quota layer is added first so that the
    // gate, added after it, runs first.
    let analytics_routes = Router::new()
        .route("/analytics/collect", post(collect_event))
        .route("/analytics/event-summary", get(get_event_summary))
        .route("/analytics/user-stats", get(get_user_stats))
        .route_layer(middleware::from_fn_with_state(
            Arc::new(state.quota_state()),
            quota_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            Arc::new(state.gate_state()),
            credential_gate_middleware,
        ));

    let api_routes = Router::new()
        .merge(credential_routes)
        .merge(analytics_routes);

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(server, state.credential_header.clone()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_seconds),
        ))
        .layer(middleware::from_fn(logging_middleware));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(service_builder)
        .with_state(state)
}
