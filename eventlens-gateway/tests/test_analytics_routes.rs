//! Event ingestion and aggregate reads over HTTP

mod common;

use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;

use common::*;
use eventlens_core::Config;
use eventlens_core::infrastructure::rate_limiter::InMemoryQuotaStorage;
use eventlens_core::testing::UnreachableCache;

#[tokio::test]
async fn test_collect_then_summary() {
    let gateway = TestGateway::new();
    let token = gateway.register("Acme", "a@acme.com").await;

    let created = gateway
        .collect(&token, json!({ "event": "login_click", "device": "mobile" }))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert!(created.body["id"].is_i64());

    let summary = gateway.summary(&token, None).await;
    assert_eq!(summary.status, StatusCode::OK);
    assert_eq!(summary.body["totalEvents"], 1);
    assert_eq!(summary.body["byDevice"][0]["device"], "mobile");
    assert_eq!(summary.body["byDevice"][0]["count"], 1);
}

#[tokio::test]
async fn test_summary_reflects_writes_after_cached_read() {
    let gateway = TestGateway::new();
    let token = gateway.register("Acme", "a@acme.com").await;

    gateway.collect(&token, json!({ "event": "signup" })).await;
    assert_eq!(gateway.summary(&token, None).await.body["totalEvents"], 1);
    assert_eq!(
        gateway.summary(&token, Some("signup")).await.body["totalEvents"],
        1
    );

    gateway.collect(&token, json!({ "event": "signup" })).await;
    assert_eq!(gateway.summary(&token, None).await.body["totalEvents"], 2);
    assert_eq!(
        gateway.summary(&token, Some("signup")).await.body["totalEvents"],
        2
    );
    assert_eq!(
        gateway.summary(&token, Some("other")).await.body["totalEvents"],
        0
    );
}

#[tokio::test]
async fn test_missing_event_name_is_validation_error() {
    let gateway = TestGateway::new();
    let token = gateway.register("Acme", "a@acme.com").await;

    let response = gateway.collect(&token, json!({ "url": "https://x" })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "ValidationError");

    let malformed = gateway
        .send(
            axum::http::Request::builder()
                .method("POST")
                .uri("/api/analytics/collect")
                .header("content-type", "application/json")
                .header(API_KEY_HEADER, token.as_str())
                .body(axum::body::Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.body["code"], "ValidationError");
}

#[tokio::test]
async fn test_ip_address_falls_back_to_transport() {
    let gateway = TestGateway::new();
    let token = gateway.register("Acme", "a@acme.com").await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/analytics/collect")
        .header("content-type", "application/json")
        .header(API_KEY_HEADER, token.as_str())
        .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
        .body(axum::body::Body::from(json!({ "event": "x" }).to_string()))
        .unwrap();
    assert_eq!(gateway.send(request).await.status, StatusCode::CREATED);

    gateway
        .collect(&token, json!({ "event": "y", "ipAddress": "192.168.1.100" }))
        .await;

    let stored = gateway.events.stored().await;
    assert_eq!(stored[0].ip_address.as_deref(), Some("203.0.113.9"));
    assert_eq!(stored[1].ip_address.as_deref(), Some("192.168.1.100"));
}

#[tokio::test]
async fn test_cache_outage_degrades_writes_and_fails_reads() {
    let gateway = TestGateway::with_stores(
        Arc::new(UnreachableCache),
        Arc::new(InMemoryQuotaStorage::new()),
        Config::default(),
    );
    let token = gateway.register("Acme", "a@acme.com").await;

    let created = gateway.collect(&token, json!({ "event": "x" })).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(gateway.events.stored().await.len(), 1);

    let summary = gateway.summary(&token, None).await;
    assert_eq!(summary.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(summary.body["code"], "Unavailable");
}

#[tokio::test]
async fn test_user_stats() {
    let gateway = TestGateway::new();
    let token = gateway.register("Acme", "a@acme.com").await;

    for device in ["mobile", "mobile", "desktop"] {
        gateway
            .collect(
                &token,
                json!({ "event": "page_view", "userId": "user123", "device": device }),
            )
            .await;
    }
    gateway
        .collect(&token, json!({ "event": "page_view", "userId": "someone-else" }))
        .await;

    let response = gateway
        .send(empty_request(
            "GET",
            "/api/analytics/user-stats?userId=user123",
            Some(&token),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["userId"], "user123");
    assert_eq!(response.body["totalEvents"], 3);
    assert_eq!(response.body["recentEvents"].as_array().unwrap().len(), 3);
    assert_eq!(response.body["byDevice"][0]["device"], "mobile");
    assert_eq!(response.body["byDevice"][0]["count"], 2);

    let missing = gateway
        .send(empty_request("GET", "/api/analytics/user-stats", Some(&token)))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_summaries_are_isolated_between_credentials() {
    let gateway = TestGateway::new();
    let acme = gateway.register("Acme", "a@acme.com").await;
    let globex = gateway.register("Globex", "g@globex.com").await;

    gateway.collect(&acme, json!({ "event": "x" })).await;

    assert_eq!(gateway.summary(&acme, None).await.body["totalEvents"], 1);
    assert_eq!(gateway.summary(&globex, None).await.body["totalEvents"], 0);
}
