//! Request metadata flowing from an inbound boundary into log records.

use ctxlog::{
    meta, BackendConfig, Context, ContextError, Encoding, Level, Logger, MemorySink, MetaKey,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn capture() -> (Logger, MemorySink) {
    let output = MemorySink::new();
    let backend = BackendConfig::new(Level::Debug, Encoding::Json)
        .build_with_sinks(Arc::new(output.clone()), Arc::new(MemorySink::new()));
    (Logger::from_backend(backend), output)
}

fn request_context() -> Context {
    meta::inject(
        &Context::background(),
        [(MetaKey::TraceId, "abc123"), (MetaKey::IpAddress, "")],
    )
}

#[test]
fn inbound_metadata_reaches_the_record() {
    let (logger, output) = capture();
    let ctx = request_context();

    logger.with_context(Some(&ctx)).info("started");

    let records = output.records();
    assert_eq!(records.len(), 1);
    let record = records[0].as_object().unwrap();
    assert_eq!(record["msg"], json!("started"));
    assert_eq!(record["trace_id"], json!("abc123"));
    assert!(!record.contains_key("ip_address"));
}

#[test]
fn nested_boundaries_shadow_outer_values() {
    let (logger, output) = capture();
    let outer = meta::inject(
        &request_context(),
        [(MetaKey::ServiceName, "gateway"), (MetaKey::RequestUserId, "7")],
    );
    let inner = meta::inject(
        &outer,
        [(MetaKey::ServiceName, "billing"), (MetaKey::RequestUserId, "")],
    );

    logger.with_context(Some(&inner)).info("charged");
    logger.with_context(Some(&outer)).info("routed");

    let records = output.records();
    assert_eq!(records[0]["service_name"], json!("billing"));
    assert_eq!(records[0]["request_user_id"], json!("7"));
    assert_eq!(records[1]["service_name"], json!("gateway"));
    assert_eq!(records[0]["trace_id"], records[1]["trace_id"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn metadata_follows_context_into_spawned_tasks() {
    let (logger, output) = capture();
    let ctx = request_context();

    let handles: Vec<_> = (0..4)
        .map(|task| {
            let logger = logger.clone();
            let ctx = meta::inject(&ctx, [(MetaKey::RequestUserId, task.to_string())]);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                logger
                    .with_context(Some(&ctx))
                    .infow("handled", [("task", task)]);
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let records = output.records();
    assert_eq!(records.len(), 4);
    for record in &records {
        assert_eq!(record["trace_id"], json!("abc123"));
        let task = record["task"].as_i64().unwrap();
        assert_eq!(record["request_user_id"], json!(task.to_string()));
    }
}

#[tokio::test]
async fn cancelled_context_still_carries_metadata() {
    let (logger, output) = capture();
    let (ctx, token) = request_context().with_cancel();

    let waiter = {
        let ctx = ctx.clone();
        tokio::spawn(async move { ctx.cancelled().await })
    };
    token.cancel();
    waiter.await.unwrap();

    assert_eq!(ctx.err(), Some(ContextError::Canceled));
    assert_eq!(
        meta::extract(Some(&ctx)).get(&MetaKey::TraceId).map(String::as_str),
        Some("abc123")
    );

    logger.with_context(Some(&ctx)).warn("client went away");
    assert_eq!(output.records()[0]["trace_id"], json!("abc123"));
}

#[test]
fn expired_context_still_carries_metadata() {
    let ctx = request_context().with_timeout(Duration::ZERO);
    assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    assert_eq!(meta::lookup(&ctx, MetaKey::TraceId), Some("abc123"));
}

#[test]
fn absent_context_leaves_logger_untouched() {
    let (logger, output) = capture();
    let logger = logger.with([("component", "cache")]);

    let derived = logger.with_context(None);
    assert!(Logger::same_instance(&derived, &logger));

    derived.debug("miss");
    let record = output.records().remove(0);
    assert_eq!(record["component"], json!("cache"));
    assert!(record.get("trace_id").is_none());
}
