//! `tracing` events routed through a logger.

use ctxlog::{
    meta, BackendConfig, Context, Encoding, Level, Logger, LoggerLayer, MemorySink, MetaKey,
};
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

fn capture() -> (Logger, MemorySink) {
    let output = MemorySink::new();
    let backend = BackendConfig::new(Level::Debug, Encoding::Json)
        .build_with_sinks(Arc::new(output.clone()), Arc::new(MemorySink::new()));
    (Logger::from_backend(backend), output)
}

#[test]
fn request_logger_bridges_tracing_events() {
    let (logger, output) = capture();
    let ctx = meta::inject(&Context::background(), [(MetaKey::TraceId, "abc123")]);
    let layer = LoggerLayer::new(logger.with_context(Some(&ctx)).into_owned());

    tracing::subscriber::with_default(tracing_subscriber::registry().with(layer), || {
        tracing::info!(target: "storage::index", shard = 4, "compacted");
    });

    let records = output.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["msg"], json!("compacted"));
    assert_eq!(records[0]["logger"], json!("storage.index"));
    assert_eq!(records[0]["trace_id"], json!("abc123"));
    assert_eq!(records[0]["shard"], json!(4));
}

#[test]
fn env_filter_narrows_bridged_events() {
    let (logger, output) = capture();
    let layer = LoggerLayer::new(logger).with_filter(EnvFilter::new("warn,storage=debug"));

    tracing::subscriber::with_default(tracing_subscriber::registry().with(layer), || {
        tracing::debug!(target: "storage", "kept");
        tracing::debug!(target: "http", "dropped");
        tracing::error!(target: "http", error = %"timeout", "kept");
    });

    let records = output.records();
    let messages: Vec<_> = records.iter().map(|r| r["msg"].clone()).collect();
    assert_eq!(messages, vec![json!("kept"), json!("kept")]);
    assert_eq!(records[1]["error"], json!("timeout"));
}
