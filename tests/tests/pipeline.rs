//! Processing-side tests: dedup, failure isolation and the loop lifecycle.

use chrono::Duration;
use integration_tests::{
    fixtures::{self, validated, TENANT},
    setup::TestContext,
};
use std::time::Duration as StdDuration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_identical_events_reach_sink_once() {
    let ctx = TestContext::new();

    ctx.processor
        .process(vec![
            validated("evt_same", None, Duration::zero()),
            validated("evt_same", None, Duration::zero()),
        ])
        .await
        .unwrap();

    assert_eq!(ctx.sink.event_count(), 1);
}

#[tokio::test]
async fn test_same_id_different_timestamp_is_kept() {
    let ctx = TestContext::new();

    ctx.processor
        .process(vec![
            validated("evt_same", None, Duration::zero()),
            validated("evt_same", None, Duration::seconds(5)),
        ])
        .await
        .unwrap();

    assert_eq!(ctx.sink.event_count(), 2);
}

#[tokio::test]
async fn test_replay_across_batches_suppressed() {
    let ctx = TestContext::new();

    ctx.processor
        .process(vec![validated("evt_1", Some("s1"), Duration::zero())])
        .await
        .unwrap();
    ctx.advance(Duration::hours(1));
    ctx.processor
        .process(vec![validated("evt_1", Some("s1"), Duration::zero())])
        .await
        .unwrap();

    assert_eq!(ctx.sink.event_count(), 1);
}

#[tokio::test]
async fn test_enrichment_failure_downgrades() {
    let ctx = TestContext::new();
    ctx.enrichment.set_should_fail(true);

    ctx.processor
        .process(vec![validated("evt_1", Some("s1"), Duration::zero())])
        .await
        .unwrap();

    let persisted = ctx.persisted();
    assert_eq!(persisted.len(), 1);
    assert!(persisted[0].geo_country.is_none());
    assert!(persisted[0].browser.is_none());
    assert_eq!(persisted[0].session_duration_seconds, Some(0));
}

#[tokio::test]
async fn test_sink_outage_drops_batch_and_loop_continues() {
    let ctx = TestContext::new();
    let server = ctx.server();

    ctx.sink.set_should_fail(true);
    server
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(fixtures::events(2)))
        .await
        .assert_status_ok();

    assert_eq!(ctx.drain().await, 2);
    assert_eq!(ctx.sink.event_count(), 0);
    // 1 attempt + 3 retries
    assert_eq!(ctx.sink.attempts(), 4);

    ctx.sink.set_should_fail(false);
    server
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(fixtures::events(1)))
        .await
        .assert_status_ok();

    assert_eq!(ctx.drain().await, 1);
    assert_eq!(ctx.sink.event_count(), 1);
}

#[tokio::test]
async fn test_sweep_forgets_idle_sessions() {
    let ctx = TestContext::new();

    ctx.processor
        .process(vec![validated("evt_1", Some("s1"), Duration::zero())])
        .await
        .unwrap();
    ctx.advance(Duration::minutes(20));
    ctx.processor
        .process(vec![validated("evt_2", Some("s2"), Duration::minutes(20))])
        .await
        .unwrap();

    ctx.advance(Duration::minutes(20));
    assert_eq!(ctx.processor.sweep().await, 1);
    assert_eq!(ctx.processor.sessions().len(), 1);
}

#[tokio::test]
async fn test_sweep_keeps_session_when_client_clock_lags() {
    let ctx = TestContext::new();
    ctx.advance(Duration::hours(1));

    ctx.processor
        .process(vec![validated("evt_1", Some("s1"), Duration::zero())])
        .await
        .unwrap();
    assert_eq!(ctx.processor.sweep().await, 0);
    ctx.processor
        .process(vec![validated("evt_2", Some("s1"), Duration::seconds(10))])
        .await
        .unwrap();

    let persisted = ctx.persisted();
    assert_eq!(persisted.len(), 2);
    assert_eq!(persisted[1].session_duration_seconds, Some(10));
    assert_eq!(persisted[1].session_start, Some(fixtures::t0()));
}

#[tokio::test]
async fn test_processing_loop_stops_on_cancel() {
    let ctx = TestContext::new();

    ctx.server()
        .post("/api/v1/events/batch")
        .add_header("X-PX-Project-ID", TENANT)
        .json(&fixtures::batch(fixtures::events(250)))
        .await
        .assert_status_ok();

    let TestContext {
        processing, sink, ..
    } = ctx;

    let shutdown = CancellationToken::new();
    let handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { processing.run(shutdown).await })
    };

    for _ in 0..200 {
        if sink.event_count() == 250 {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    shutdown.cancel();
    tokio::time::timeout(StdDuration::from_secs(1), handle)
        .await
        .expect("loop should stop after cancel")
        .unwrap();

    assert_eq!(sink.event_count(), 250);
}
