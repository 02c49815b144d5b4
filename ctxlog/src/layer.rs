//! Bridge from `tracing` into a [`Logger`].
//!
//! Installing a [`LoggerLayer`] routes events emitted with the `tracing`
//! macros, from this process or from its dependencies, through the same
//! backend, field naming policy, and pre-bound fields as direct logger calls.
//!
//! ```rust,no_run
//! use ctxlog::{Config, Logger, LoggerLayer};
//! use tracing_subscriber::layer::SubscriberExt;
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! let logger = Logger::new(&Config::default()).expect("logger");
//! tracing_subscriber::registry()
//!     .with(LoggerLayer::new(logger))
//!     .init();
//!
//! tracing::info!(user = 42, "logged in");
//! ```

use serde_json::Value;
use std::fmt::{self, Write as _};
use tracing::field::{Field as TracingField, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::encoder::{Caller, Entry};
use crate::field::Field;
use crate::level::Level;
use crate::logger::Logger;

/// A `tracing_subscriber` layer that writes events through a [`Logger`].
///
/// The event's target becomes the logger name, with `::` rendered as `.`.
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    logger: Logger,
}

impl LoggerLayer {
    /// Creates a layer writing through `logger`.
    pub const fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber,
{
    fn enabled(&self, metadata: &tracing::Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.logger.enabled(Level::from(*metadata.level()))
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = Level::from(*metadata.level());
        let backend = self.logger.backend();
        if !backend.enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let name = metadata.target().replace("::", ".");
        let caller = metadata
            .file()
            .zip(metadata.line())
            .map(|(file, line)| Caller::new(file, line));
        let message = visitor.message.unwrap_or_default();

        let entry = Entry {
            level,
            time: backend.now(),
            name: Some(name.as_str()),
            caller,
            message: &message,
        };
        backend.write(&entry, self.logger.fields(), &visitor.fields);
    }
}

/// Collects event fields, pulling out the `message` field.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<Field>,
}

impl FieldVisitor {
    fn push(&mut self, field: &TracingField, value: Value) {
        self.fields.push(Field::new(field.name(), value));
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        let mut buf = String::new();
        let _ = write!(buf, "{value:?}");
        if field.name() == "message" {
            self.message = Some(buf);
        } else {
            self.push(field, Value::String(buf));
        }
    }

    fn record_str(&mut self, field: &TracingField, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.push(field, Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.push(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.push(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.push(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.push(field, Value::from(value));
    }

    fn record_error(&mut self, field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.push(field, Value::String(value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendConfig;
    use crate::config::Encoding;
    use crate::sink::MemorySink;
    use serde_json::json;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    fn bridged(level: Level) -> (Logger, MemorySink) {
        let output = MemorySink::new();
        let backend = BackendConfig::new(level, Encoding::Json)
            .build_with_sinks(Arc::new(output.clone()), Arc::new(MemorySink::new()));
        (Logger::from_backend(backend), output)
    }

    #[test]
    fn events_are_written_with_fields() {
        let (logger, output) = bridged(Level::Debug);
        let subscriber = tracing_subscriber::registry()
            .with(LoggerLayer::new(logger.with([("service_name", "billing")])));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "api::orders", order = 7, paid = true, "order placed");
        });

        let records = output.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["msg"], json!("order placed"));
        assert_eq!(record["level"], json!("info"));
        assert_eq!(record["logger"], json!("api.orders"));
        assert_eq!(record["order"], json!(7));
        assert_eq!(record["paid"], json!(true));
        assert_eq!(record["service_name"], json!("billing"));
        let caller = record["file"].as_str().unwrap();
        assert!(caller.starts_with("src/layer.rs:"), "{caller}");
    }

    #[test]
    fn trace_maps_to_debug_and_respects_threshold() {
        let (logger, output) = bridged(Level::Info);
        let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger));

        tracing::subscriber::with_default(subscriber, || {
            tracing::trace!("dropped");
            tracing::debug!("dropped");
            tracing::warn!(reason = %"slow", "kept");
        });

        let records = output.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["level"], json!("warn"));
        assert_eq!(records[0]["reason"], json!("slow"));
    }
}
