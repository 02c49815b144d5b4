//! The logging facade.
//!
//! A [`Logger`] wraps a shared [`Backend`] together with an immutable set of
//! pre-bound fields and an optional dotted name. Every derivation (`with`,
//! `with_context`, `named`) returns a new value that shares the backend; the
//! receiver is never modified, so loggers can be cloned into threads and
//! tasks freely.
//!
//! Each of the five levels comes in three shapes, all funnelling into one
//! primitive:
//!
//! | shape | example |
//! |---|---|
//! | plain | `logger.info("started")` |
//! | formatted | `logger.infof(format_args!("took {ms}ms"))` or `infof!(logger, "took {ms}ms")` |
//! | keyed | `logger.infow("started", [("attempt", 2)])` |
//!
//! # Fatal records terminate the process
//!
//! `fatal`, `fatalf`, `fatalw`, and `log(Level::Fatal, ..)` write the record,
//! flush the backend, and then call [`std::process::exit`] with status 1.
//! Control never returns to the caller and destructors do not run. Never call
//! them on a path that still needs cleanup.

use nutype::nutype;
use std::borrow::Cow;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use crate::backend::{Backend, BackendConfig};
use crate::config::Config;
use crate::context::Context;
use crate::encoder::{Caller, Entry};
use crate::errors::Result;
use crate::field::Field;
use crate::level::Level;
use crate::meta::{self, MetaKey};

/// One segment of a dotted logger name.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255),
    derive(Debug, Clone, PartialEq, Eq, Hash, AsRef, Deref, Display)
)]
pub struct LoggerName(String);

/// Renders a sequence of values back to back, without separators.
///
/// ```rust
/// use ctxlog::Concat;
///
/// let user = 42;
/// assert_eq!(Concat(&[&"user ", &user, &" logged in"]).to_string(), "user 42 logged in");
/// ```
#[derive(Clone, Copy)]
pub struct Concat<'a>(pub &'a [&'a dyn fmt::Display]);

impl fmt::Display for Concat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|value| value.fmt(f))
    }
}

/// Structured logger bound to a shared backend.
#[derive(Clone)]
pub struct Logger {
    backend: Arc<Backend>,
    fields: Arc<[Field]>,
    name: Option<Arc<str>>,
}

impl Logger {
    /// Builds a logger writing to stdout from a declarative configuration.
    ///
    /// Fails with [`Error::Configuration`](crate::Error::Configuration) for an
    /// unknown level or encoding, and with
    /// [`Error::BackendConstruction`](crate::Error::BackendConstruction) if an
    /// output cannot be opened.
    pub fn new(config: &Config) -> Result<Self> {
        let backend = BackendConfig::from_config(config)?.build()?;
        Ok(Self::from_backend(backend))
    }

    /// Wraps an already-built backend.
    pub fn from_backend(backend: Backend) -> Self {
        Self {
            backend: Arc::new(backend),
            fields: Arc::from(Vec::new()),
            name: None,
        }
    }

    /// The shared backend.
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Dotted name, if the logger was named.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Fields attached to every record, in binding order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Whether the backend would emit a record at `level`.
    pub fn enabled(&self, level: Level) -> bool {
        self.backend.enabled(level)
    }

    /// Whether two loggers share the same backend, fields, and name.
    pub fn same_instance(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.backend, &b.backend) && Arc::ptr_eq(&a.fields, &b.fields) && a.name == b.name
    }

    /// Returns a logger that adds `fields` to every record, after the fields
    /// already bound here.
    #[must_use]
    pub fn with<I, F>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        let mut combined = self.fields.to_vec();
        combined.extend(fields.into_iter().map(Into::into));
        if combined.len() == self.fields.len() {
            return self.clone();
        }

        Self {
            backend: Arc::clone(&self.backend),
            fields: Arc::from(combined),
            name: self.name.clone(),
        }
    }

    /// Returns a logger enriched with the request metadata carried by `ctx`.
    ///
    /// Without a context, or when the context carries no metadata, the
    /// receiver itself is returned. Otherwise each extracted key is bound
    /// exactly once, in [`MetaKey::ALL`] order, after the other bound fields.
    /// A field already bound under the same name, whether by an earlier
    /// `with_context` or by [`with`](Self::with), is replaced, so chaining
    /// contexts never writes a key twice in one record.
    pub fn with_context(&self, ctx: Option<&Context>) -> Cow<'_, Self> {
        let mut metadata = meta::extract(ctx);
        if metadata.is_empty() {
            return Cow::Borrowed(self);
        }

        let mut fields: Vec<Field> = self
            .fields
            .iter()
            .filter(|field| {
                !matches!(field.key.parse::<MetaKey>(), Ok(key) if metadata.contains_key(&key))
            })
            .cloned()
            .collect();
        fields.extend(
            MetaKey::ALL
                .into_iter()
                .filter_map(|key| metadata.remove(&key).map(|value| Field::new(key, value))),
        );

        Cow::Owned(Self {
            backend: Arc::clone(&self.backend),
            fields: Arc::from(fields),
            name: self.name.clone(),
        })
    }

    /// Returns a logger whose name gains `name` as its last dotted segment.
    ///
    /// A blank name leaves the logger unchanged.
    #[must_use]
    pub fn named(&self, name: &str) -> Self {
        let Ok(segment) = LoggerName::try_new(name) else {
            return self.clone();
        };

        let name = match &self.name {
            Some(parent) => format!("{parent}.{segment}"),
            None => segment.into_inner(),
        };
        Self {
            backend: Arc::clone(&self.backend),
            fields: Arc::clone(&self.fields),
            name: Some(Arc::from(name)),
        }
    }

    /// Flushes buffered records.
    ///
    /// Intended for shutdown. A failure means recent records may be lost.
    pub fn sync(&self) -> Result<()> {
        self.backend.sync()
    }

    /// Logs `message` with `fields` at `level`.
    ///
    /// At [`Level::Fatal`] this terminates the process after flushing.
    #[track_caller]
    pub fn log<I, F>(&self, level: Level, message: impl fmt::Display, fields: I)
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        if level == Level::Fatal {
            self.terminate(&message, fields);
        }
        self.emit(level, &message, fields);
    }

    #[track_caller]
    fn emit<I, F>(&self, level: Level, message: &dyn fmt::Display, fields: I)
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        if !self.backend.enabled(level) {
            return;
        }

        let message = message.to_string();
        let extra: Vec<Field> = fields.into_iter().map(Into::into).collect();
        let entry = Entry {
            level,
            time: self.backend.now(),
            name: self.name.as_deref(),
            caller: Some(Caller::from(Location::caller())),
            message: &message,
        };
        self.backend.write(&entry, &self.fields, &extra);
    }

    #[track_caller]
    fn terminate<I, F>(&self, message: &dyn fmt::Display, fields: I) -> !
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        self.emit(Level::Fatal, message, fields);
        // The process is exiting either way.
        let _ = self.backend.sync();
        std::process::exit(1)
    }

    /// Logs a message at debug level.
    #[track_caller]
    pub fn debug(&self, message: impl fmt::Display) {
        self.emit(Level::Debug, &message, no_fields());
    }

    /// Logs a message at info level.
    #[track_caller]
    pub fn info(&self, message: impl fmt::Display) {
        self.emit(Level::Info, &message, no_fields());
    }

    /// Logs a message at warn level.
    #[track_caller]
    pub fn warn(&self, message: impl fmt::Display) {
        self.emit(Level::Warn, &message, no_fields());
    }

    /// Logs a message at error level.
    #[track_caller]
    pub fn error(&self, message: impl fmt::Display) {
        self.emit(Level::Error, &message, no_fields());
    }

    /// Logs a message at fatal level, then exits the process with status 1.
    #[track_caller]
    pub fn fatal(&self, message: impl fmt::Display) -> ! {
        self.terminate(&message, no_fields())
    }

    /// Logs a formatted message at debug level.
    #[track_caller]
    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, &args, no_fields());
    }

    /// Logs a formatted message at info level.
    #[track_caller]
    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, &args, no_fields());
    }

    /// Logs a formatted message at warn level.
    #[track_caller]
    pub fn warnf(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, &args, no_fields());
    }

    /// Logs a formatted message at error level.
    #[track_caller]
    pub fn errorf(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, &args, no_fields());
    }

    /// Logs a formatted message at fatal level, then exits the process with
    /// status 1.
    #[track_caller]
    pub fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.terminate(&args, no_fields())
    }

    /// Logs a message with structured fields at debug level.
    #[track_caller]
    pub fn debugw<I, F>(&self, message: &str, fields: I)
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        self.emit(Level::Debug, &message, fields);
    }

    /// Logs a message with structured fields at info level.
    #[track_caller]
    pub fn infow<I, F>(&self, message: &str, fields: I)
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        self.emit(Level::Info, &message, fields);
    }

    /// Logs a message with structured fields at warn level.
    #[track_caller]
    pub fn warnw<I, F>(&self, message: &str, fields: I)
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        self.emit(Level::Warn, &message, fields);
    }

    /// Logs a message with structured fields at error level.
    #[track_caller]
    pub fn errorw<I, F>(&self, message: &str, fields: I)
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        self.emit(Level::Error, &message, fields);
    }

    /// Logs a message with structured fields at fatal level, then exits the
    /// process with status 1.
    #[track_caller]
    pub fn fatalw<I, F>(&self, message: &str, fields: I) -> !
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        self.terminate(&message, fields)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("backend", &self.backend)
            .finish()
    }
}

const fn no_fields() -> [Field; 0] {
    []
}
