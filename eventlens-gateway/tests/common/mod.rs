//! Shared helpers for gateway HTTP tests
//!
//! Builds the full router over in-memory repositories, cache and quota
//! counters, and drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use eventlens_core::Config;
use eventlens_core::application::CacheStore;
use eventlens_core::infrastructure::MemoryCache;
use eventlens_core::infrastructure::rate_limiter::{
    InMemoryQuotaStorage, QuotaCounterStore, QuotaLimiter,
};
use eventlens_core::testing::{InMemoryCredentialRepository, InMemoryEventRepository};
use eventlens_gateway::{GatewayState, create_router};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Thirty seconds into a minute window, so a test never straddles two windows
pub const PINNED_NOW: u64 = 1_700_000_010;

pub fn pinned_clock() -> u64 {
    PINNED_NOW
}

pub struct TestGateway {
    pub router: Router,
    pub credentials: Arc<InMemoryCredentialRepository>,
    pub events: Arc<InMemoryEventRepository>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestGateway {
    pub fn new() -> Self {
        Self::with_stores(
            Arc::new(MemoryCache::new(1000)),
            Arc::new(InMemoryQuotaStorage::new()),
            Config::default(),
        )
    }

    pub fn with_stores(
        cache: Arc<dyn CacheStore>,
        quota_storage: Arc<dyn QuotaCounterStore>,
        config: Config,
    ) -> Self {
        let credentials = Arc::new(InMemoryCredentialRepository::new());
        let events = Arc::new(InMemoryEventRepository::new());
        let limiter = Arc::new(
            QuotaLimiter::with_storage(
                quota_storage,
                config.quota.clone(),
                config.stores.operation_timeout(),
            )
            .with_clock(pinned_clock),
        );

        let state = GatewayState::new(
            credentials.clone(),
            events.clone(),
            cache,
            limiter,
            &config,
        );

        Self {
            router: create_router(state, &config.server),
            credentials,
            events,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Register an application and return its token
    pub async fn register(&self, app_name: &str, owner_email: &str) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/api/auth/register",
                None,
                serde_json::json!({ "appName": app_name, "ownerEmail": owner_email }),
            ))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["token"]
            .as_str()
            .expect("token in register response")
            .to_string()
    }

    pub async fn collect(&self, token: &str, body: Value) -> TestResponse {
        self.send(json_request(
            "POST",
            "/api/analytics/collect",
            Some(token),
            body,
        ))
        .await
    }

    pub async fn summary(&self, token: &str, event: Option<&str>) -> TestResponse {
        let uri = match event {
            Some(event) => format!("/api/analytics/event-summary?event={}", event),
            None => "/api/analytics/event-summary".to_string(),
        };
        self.send(empty_request("GET", &uri, Some(token))).await
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header(API_KEY_HEADER, token);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(API_KEY_HEADER, token);
    }
    builder.body(Body::empty()).expect("valid request")
}
