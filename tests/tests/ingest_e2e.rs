//! End-to-end tests for the ingest pipeline.
//!
//! POST /api/v1/events/batch → ingest queue → processing loop → MockSink
//!
//! Everything runs in-process; the clock is manual so session boundaries
//! are exact.

use chrono::Duration;
use integration_tests::{
    fixtures::{self, t0, TENANT},
    setup::TestContext,
};

#[tokio::test]
async fn test_batch_admitted_and_persisted() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(fixtures::events(3)))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["events_received"], 3);
    assert_eq!(body["estimated_processing_time"], "5s");
    assert!(
        body["processing_id"]
            .as_str()
            .is_some_and(|id| id.starts_with("proc_")),
        "processing_id should be a proc_ id, got {}",
        body["processing_id"]
    );

    // Nothing is processed until the loop ticks
    assert_eq!(ctx.sink.event_count(), 0);
    let status: serde_json::Value = server.get("/api/v1/events/queue/status").await.json();
    assert_eq!(status["queue_size"], 3);
    assert_eq!(status["status"], "processing");

    assert_eq!(ctx.drain().await, 3);

    let persisted = ctx.persisted();
    assert_eq!(persisted.len(), 3);
    assert!(persisted.iter().all(|e| e.tenant_id() == TENANT));
    assert!(persisted.iter().all(|e| e.event_id().starts_with("evt_")));
    assert!(persisted.iter().all(|e| e.event.timestamp == t0()));

    let status: serde_json::Value = server.get("/api/v1/events/queue/status").await.json();
    assert_eq!(status["queue_size"], 0);
    assert_eq!(status["status"], "idle");
}

#[tokio::test]
async fn test_events_are_enriched() {
    let ctx = TestContext::new();

    ctx.server()
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(vec![fixtures::browser_event(
            "page_view",
            "203.0.113.9",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)",
        )]))
        .await
        .assert_status_ok();

    ctx.drain().await;

    let persisted = ctx.persisted();
    assert_eq!(persisted.len(), 1);
    let event = &persisted[0];
    assert_eq!(event.geo_country.as_deref(), Some("US"));
    assert_eq!(event.geo_city.as_deref(), Some("New York"));
    assert_eq!(event.device_type.as_deref(), Some("desktop"));
    assert_eq!(event.event.user_id.as_deref(), Some("user-1"));
    assert_eq!(event.event.properties["page"], "/pricing");
    assert_eq!(ctx.enrichment.calls(), 1);
}

#[tokio::test]
async fn test_session_expires_after_gap() {
    let ctx = TestContext::new();

    ctx.server()
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(vec![
            fixtures::session_event("view", "s1", Duration::zero()),
            fixtures::session_event("click", "s1", Duration::seconds(10)),
            fixtures::session_event("view", "s1", Duration::minutes(40)),
        ]))
        .await
        .assert_status_ok();

    ctx.drain().await;

    let persisted = ctx.persisted();
    let durations: Vec<Option<i64>> = persisted
        .iter()
        .map(|e| e.session_duration_seconds)
        .collect();
    assert_eq!(durations, vec![Some(0), Some(10), Some(0)]);

    assert_eq!(persisted[0].session_start, Some(t0()));
    assert_eq!(persisted[1].session_start, Some(t0()));
    assert_eq!(persisted[2].session_start, Some(t0() + Duration::minutes(40)));
}

#[tokio::test]
async fn test_session_resets_at_exact_timeout() {
    let ctx = TestContext::new();

    ctx.server()
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(vec![
            fixtures::session_event("click", "s1", Duration::zero()),
            fixtures::session_event("click", "s1", Duration::seconds(1800)),
        ]))
        .await
        .assert_status_ok();

    ctx.drain().await;

    let persisted = ctx.persisted();
    assert_eq!(persisted[0].session_duration_seconds, Some(0));
    assert_eq!(persisted[1].session_duration_seconds, Some(0));
    assert_eq!(
        persisted[1].session_start,
        Some(t0() + Duration::seconds(1800))
    );
}

#[tokio::test]
async fn test_sessions_are_scoped_per_tenant() {
    let ctx = TestContext::new();
    let server = ctx.server();

    for tenant in ["tenant-a", "tenant-b"] {
        server
            .post("/api/v1/events/batch")
            .add_header("X-PX-Project-ID", tenant)
            .json(&fixtures::batch(vec![fixtures::session_event(
                "view",
                "shared-session",
                Duration::zero(),
            )]))
            .await
            .assert_status_ok();
    }
    server
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", "tenant-a")
        .json(&fixtures::batch(vec![fixtures::session_event(
            "click",
            "shared-session",
            Duration::seconds(30),
        )]))
        .await
        .assert_status_ok();

    ctx.drain().await;

    assert_eq!(ctx.processor.sessions().len(), 2);
    let last = ctx.persisted().pop().unwrap();
    assert_eq!(last.tenant_id(), "tenant-a");
    assert_eq!(last.session_duration_seconds, Some(30));
}

#[tokio::test]
async fn test_success_carries_rate_limit_headers() {
    let ctx = TestContext::with_limits(5, 100);

    let response = ctx
        .server()
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(fixtures::events(2)))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("X-RateLimit-Limit"), "5");
    assert_eq!(response.header("X-RateLimit-Remaining"), "4");
}
