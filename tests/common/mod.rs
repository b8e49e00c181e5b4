//! Common test utilities for end-to-end tests
//!
//! Assembles the full application over in-memory stores and serves it with
//! `axum_test::TestServer`.

#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use serde_json::{Value, json};
use std::sync::Arc;

use eventlens::eventlens_core::infrastructure::MemoryCache;
use eventlens::eventlens_core::infrastructure::rate_limiter::{InMemoryQuotaStorage, QuotaLimiter};
use eventlens::eventlens_core::testing::{InMemoryCredentialRepository, InMemoryEventRepository};
use eventlens::{AppStores, Config, assemble_app};

/// Test configuration builder for creating consistent test configurations
pub struct TestConfigBuilder {
    config: Config,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.cache.dragonfly_enabled = false;
        Self { config }
    }

    pub fn with_quota(mut self, max_requests: u64, window_seconds: u64) -> Self {
        self.config.quota.max_requests = max_requests;
        self.config.quota.window_seconds = window_seconds;
        self
    }

    pub fn with_credential_header(mut self, header: &str) -> Self {
        self.config.credentials.header_name = header.to_string();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed quota clock, thirty seconds into a minute window
pub fn pinned_clock() -> u64 {
    1_700_000_010
}

/// In-memory stores matching `config`
pub fn in_memory_stores(config: &Config) -> AppStores {
    AppStores {
        credentials: Arc::new(InMemoryCredentialRepository::new()),
        events: Arc::new(InMemoryEventRepository::new()),
        cache: Arc::new(MemoryCache::new(config.cache.memory_max_entries)),
        quota_limiter: Arc::new(
            QuotaLimiter::with_storage(
                Arc::new(InMemoryQuotaStorage::new()),
                config.quota.clone(),
                config.stores.operation_timeout(),
            )
            .with_clock(pinned_clock),
        ),
    }
}

pub fn test_server(config: &Config) -> TestServer {
    let handle = assemble_app(config, in_memory_stores(config));
    TestServer::new(handle.router).expect("test server")
}

pub fn credential_header(name: &str, token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_bytes(name.as_bytes()).expect("header name"),
        HeaderValue::from_str(token).expect("header value"),
    )
}

/// Register an application and return its token
pub async fn register(server: &TestServer, app_name: &str, owner_email: &str) -> String {
    let response = server
        .post("/api/auth/register")
        .json(&json!({ "appName": app_name, "ownerEmail": owner_email }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["token"]
        .as_str()
        .expect("token")
        .to_string()
}
