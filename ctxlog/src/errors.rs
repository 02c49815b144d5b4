//! Error types for ctxlog.
//!
//! Every failure the crate can report is surfaced to the immediate caller as an
//! explicit `Result`. Nothing here is logged internally: the crate has no
//! fallback logger for its own failures.
//!
//! # Error Categories
//!
//! - **Configuration**: invalid level or encoding names, rejected before any
//!   logging capability exists
//! - **`BackendConstruction`**: an output sink could not be opened
//! - **Flush**: buffered records could not be drained on `sync`
//!
//! # Example Usage
//!
//! ```rust
//! use ctxlog::{Config, Error, Logger};
//!
//! let config = Config {
//!     level: "bogus".to_string(),
//!     ..Config::default()
//! };
//!
//! match Logger::new(&config) {
//!     Err(Error::Configuration(err)) => eprintln!("fix the config: {err}"),
//!     Err(err) => eprintln!("logger unavailable: {err}"),
//!     Ok(_) => unreachable!(),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Errors returned by logger construction and flushing.
///
/// # Error Handling Strategy
///
/// - **Configuration**: Fix the configuration; retrying cannot succeed
/// - **`BackendConstruction`**: Treat as fatal to startup
/// - **Flush**: The process may continue, but records emitted just before the
///   failure may be lost
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration named an unknown level or encoding.
    #[error("invalid logger configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// An output or error-output sink could not be opened.
    #[error("failed to build logging backend: {0}")]
    BackendConstruction(#[source] io::Error),

    /// Buffered output could not be flushed.
    #[error("failed to flush log output: {0}")]
    Flush(#[source] io::Error),
}

/// Errors produced while parsing configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The level is not one of `debug`, `info`, `warn`, `error`.
    #[error("unrecognized level: {0:?}")]
    InvalidLevel(String),

    /// The encoding is not one of `json`, `console`.
    #[error("unrecognized encoding: {0:?}")]
    InvalidEncoding(String),

    /// The name does not belong to the fixed metadata vocabulary.
    #[error("unknown metadata key: {0:?}")]
    UnknownMetaKey(String),
}

/// Result type alias for ctxlog operations.
pub type Result<T> = std::result::Result<T, Error>;
