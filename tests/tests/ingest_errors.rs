//! Tests for error handling at the gateway.
//!
//! Every rejection must leave the queue untouched.

use axum::http::StatusCode;
use chrono::Duration;
use integration_tests::{
    fixtures::{self, TENANT},
    setup::TestContext,
};
use serde_json::json;

async fn queue_size(ctx: &TestContext) -> u64 {
    let status: serde_json::Value = ctx
        .server()
        .get("/api/v1/events/queue/status")
        .await
        .json();
    status["queue_size"].as_u64().unwrap()
}

#[tokio::test]
async fn test_empty_event_name_rejects_whole_batch() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(vec![
            fixtures::event("click"),
            fixtures::event(""),
            fixtures::event("view"),
        ]))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");
    assert!(
        body["details"][0]
            .as_str()
            .is_some_and(|d| d.contains("Event 1") && d.contains("Event name is required")),
        "details should name the offending event, got {}",
        body["details"]
    );
    assert_eq!(queue_size(&ctx).await, 0);
}

#[tokio::test]
async fn test_event_name_too_long_rejected() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(vec![fixtures::event(&"x".repeat(101))]))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}

#[tokio::test]
async fn test_oversized_batch_rejected_before_validation() {
    let ctx = TestContext::with_limits(1, 10_000);
    let server = ctx.server();

    // Every event is invalid; the size check must fire first
    let events = vec![fixtures::event(""); 1001];
    let response = server
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(events))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_002");
    assert_eq!(queue_size(&ctx).await, 0);

    // No admission slot was used
    server
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(fixtures::events(1)))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_batch_of_exactly_1000_accepted() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(fixtures::events(1000)))
        .await;

    response.assert_status_ok();
    assert_eq!(queue_size(&ctx).await, 1000);
}

#[tokio::test]
async fn test_empty_batch_rejected() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(vec![]))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_003");
}

#[tokio::test]
async fn test_invalid_timestamp_rejected() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(vec![
            json!({ "event": "click", "timestamp": "yesterday" }),
        ]))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");
    assert_eq!(queue_size(&ctx).await, 0);
}

#[tokio::test]
async fn test_missing_tenant_header_rejected() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .post("/api/v1/events/batch")
        .json(&fixtures::batch(fixtures::events(1)))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&json!({ "events": [{ "user_id": "u1" }] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(queue_size(&ctx).await, 0);
}

#[tokio::test]
async fn test_rate_limit_exhaustion_and_reset() {
    let ctx = TestContext::with_limits(3, 100);
    let server = ctx.server();

    for _ in 0..3 {
        server
            .post("/api/v1/events/batch")
            .add_header("X-PX-Project-ID", TENANT)
            .json(&fixtures::batch(fixtures::events(1)))
            .await
            .assert_status_ok();
    }

    ctx.advance(Duration::minutes(10));
    let response = server
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(fixtures::events(1)))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "RATE_001");
    assert_eq!(response.header("X-RateLimit-Limit"), "3");
    assert_eq!(response.header("X-RateLimit-Remaining"), "0");
    assert_eq!(response.header("Retry-After"), "3000");
    assert_eq!(queue_size(&ctx).await, 3);

    // Other tenants keep their own budget
    server
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", "another-tenant")
        .json(&fixtures::batch(fixtures::events(1)))
        .await
        .assert_status_ok();

    ctx.advance(Duration::minutes(51));
    server
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(fixtures::events(1)))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_full_queue_returns_503() {
    let ctx = TestContext::with_limits(100, 5);
    let server = ctx.server();

    server
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(fixtures::events(4)))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(fixtures::events(2)))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "QUEUE_001");
    assert_eq!(queue_size(&ctx).await, 4);

    // Draining frees capacity again
    ctx.drain().await;
    server
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(fixtures::events(2)))
        .await
        .assert_status_ok();
}
