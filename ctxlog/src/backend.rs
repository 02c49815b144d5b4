//! The leveled, encoded logging backend.
//!
//! A [`BackendConfig`] is an immutable descriptor: threshold, encoding, field
//! naming policy, and the two output destinations. [`BackendConfig::build`]
//! opens the destinations and produces a [`Backend`] that is shared, read-only,
//! by every logger derived from it.
//!
//! The backend owns level filtering. Records below the threshold are dropped
//! before they are encoded.

use chrono::{DateTime, Local};
use std::fmt;
use std::io;
use std::sync::Arc;

use crate::config::{Config, Encoding};
use crate::encoder::{Encoder, EncoderConfig, Entry};
use crate::errors::{ConfigError, Error, Result};
use crate::field::Field;
use crate::level::Level;
use crate::sink::{self, Sink};

/// Source of record timestamps.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Local>;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Always reports the same instant. Useful for reproducible output.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Descriptor of a backend, consumed once by [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Minimum level to emit.
    pub level: Level,
    /// Record layout.
    pub encoding: Encoding,
    /// Destination of records: `stdout`, `stderr`, or a file path.
    pub output_path: String,
    /// Destination of the backend's own write failures.
    pub error_output_path: String,
    /// Field naming and formatting policy.
    pub encoder: EncoderConfig,
    /// Timestamp source.
    pub clock: Arc<dyn Clock>,
}

impl BackendConfig {
    /// Creates a descriptor writing records to stdout and failures to stderr.
    pub fn new(level: Level, encoding: Encoding) -> Self {
        Self {
            level,
            encoding,
            output_path: sink::STDOUT.to_string(),
            error_output_path: sink::STDERR.to_string(),
            encoder: EncoderConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Validates a [`Config`] and derives the standard descriptor from it.
    pub fn from_config(config: &Config) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(config.parse_level()?, config.parse_encoding()?))
    }

    /// Sets the record destination.
    #[must_use]
    pub fn with_output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Sets the destination of write failures.
    #[must_use]
    pub fn with_error_output_path(mut self, path: impl Into<String>) -> Self {
        self.error_output_path = path.into();
        self
    }

    /// Replaces the field naming policy.
    #[must_use]
    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    /// Replaces the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Opens both destinations and builds the backend.
    pub fn build(self) -> Result<Backend> {
        let output = sink::open(&self.output_path).map_err(Error::BackendConstruction)?;
        let error_output =
            sink::open(&self.error_output_path).map_err(Error::BackendConstruction)?;
        Ok(self.build_with_sinks(output, error_output))
    }

    /// Builds the backend over already-open destinations.
    ///
    /// The output paths in the descriptor are ignored.
    pub fn build_with_sinks(self, output: Arc<dyn Sink>, error_output: Arc<dyn Sink>) -> Backend {
        Backend {
            level: self.level,
            encoder: Encoder::new(self.encoding, self.encoder),
            output,
            error_output,
            clock: self.clock,
        }
    }
}

/// A configured backend.
pub struct Backend {
    level: Level,
    encoder: Encoder,
    output: Arc<dyn Sink>,
    error_output: Arc<dyn Sink>,
    clock: Arc<dyn Clock>,
}

impl Backend {
    /// Minimum level this backend emits.
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Record layout.
    pub const fn encoding(&self) -> Encoding {
        self.encoder.encoding()
    }

    /// Whether a record at `level` would be emitted.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /// Current time according to the backend's clock.
    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    /// Encodes and writes one record if its level is enabled.
    ///
    /// Failures never reach the caller; they are reported on the error output.
    pub fn write(&self, entry: &Entry<'_>, bound: &[Field], extra: &[Field]) {
        if !self.enabled(entry.level) {
            return;
        }

        let mut buf = Vec::with_capacity(256);
        let result = self
            .encoder
            .encode(entry, bound, extra, &mut buf)
            .and_then(|()| self.output.write_record(&buf));

        if let Err(err) = result {
            self.report(&err);
        }
    }

    /// Flushes the record and error destinations.
    pub fn sync(&self) -> Result<()> {
        self.output.sync().map_err(Error::Flush)?;
        self.error_output.sync().map_err(Error::Flush)
    }

    fn report(&self, err: &io::Error) {
        let time = self.now().to_rfc3339();
        let line = format!("{time} write error: {err}\n");
        // Nowhere left to report a failing error output.
        let _ = self
            .error_output
            .write_record(line.as_bytes())
            .and_then(|()| self.error_output.sync());
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("level", &self.level)
            .field("encoder", &self.encoder)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
