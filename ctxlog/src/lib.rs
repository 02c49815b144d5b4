//! `ctxlog` - context-aware structured logging
//!
//! This library pairs a leveled, structured logger with a fixed vocabulary of
//! request metadata that travels through an execution [`Context`]. Code that
//! receives a request attaches identifiers such as the trace id with
//! [`meta::inject`]; code deeper in the call graph, on any thread or task that
//! was handed the context, derives a logger that carries them with
//! [`Logger::with_context`].
//!
//! ```rust,no_run
//! use ctxlog::{meta, Config, Context, Logger, MetaKey};
//!
//! let logger = Logger::new(&Config::default())?;
//!
//! let ctx = meta::inject(
//!     &Context::background(),
//!     [(MetaKey::TraceId, "abc123"), (MetaKey::IpAddress, "")],
//! );
//!
//! // trace_id is attached; the empty ip_address is not.
//! logger.with_context(Some(&ctx)).infow("started", [("attempt", 1)]);
//! logger.sync()?;
//! # Ok::<(), ctxlog::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod backend;
pub mod config;
pub mod context;
pub mod encoder;
pub mod errors;
pub mod field;
pub mod layer;
pub mod level;
pub mod logger;
pub mod meta;
pub mod sink;

pub use backend::{Backend, BackendConfig, Clock, FixedClock, SystemClock};
pub use config::{Config, Encoding};
pub use context::{Context, ContextError};
pub use encoder::EncoderConfig;
pub use errors::{ConfigError, Error, Result};
pub use field::Field;
pub use layer::LoggerLayer;
pub use level::Level;
pub use logger::{Concat, Logger, LoggerName};
pub use meta::{MetaKey, Metadata};
pub use sink::{MemorySink, Sink};
