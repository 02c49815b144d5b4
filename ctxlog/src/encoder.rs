//! Record encoding.
//!
//! This module turns one log entry plus its structured fields into bytes. The
//! naming policy lives in [`EncoderConfig`]; the layout is chosen by
//! [`Encoding`]:
//!
//! ```text
//! json:    {"level":"info","time":"2024-05-01T12:00:00Z","logger":"api","file":"src/main.rs:42","msg":"started","trace_id":"abc123"}
//! console: 2024-05-01T12:00:00Z\tinfo\tapi\tsrc/main.rs:42\tstarted\t{"trace_id":"abc123"}
//! ```
//!
//! Keys are written in a fixed order (level, time, name, caller, message, then
//! fields in binding order). An empty key in the config omits that entry.

use chrono::{DateTime, Local, SecondsFormat};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::panic::Location;

use crate::config::Encoding;
use crate::field::Field;
use crate::level::Level;

/// How level names are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LevelFormat {
    /// `info`
    #[default]
    Lowercase,
    /// `INFO`
    Uppercase,
}

/// How timestamps are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeFormat {
    /// RFC 3339 with second precision, e.g. `2024-05-01T12:00:00+02:00`.
    #[default]
    Rfc3339,
    /// RFC 3339 with nanosecond precision.
    Rfc3339Nanos,
}

/// How call sites are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CallerFormat {
    /// Last directory and file name, e.g. `src/logger.rs:42`.
    #[default]
    Short,
    /// The path as recorded by the compiler.
    Full,
}

/// Field-naming and formatting policy shared by both encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Key of the message.
    pub message_key: String,
    /// Key of the level.
    pub level_key: String,
    /// Key of the logger name.
    pub name_key: String,
    /// Key of the call site.
    pub caller_key: String,
    /// Key of the timestamp.
    pub time_key: String,
    /// Level rendering.
    pub level_format: LevelFormat,
    /// Timestamp rendering.
    pub time_format: TimeFormat,
    /// Call-site rendering.
    pub caller_format: CallerFormat,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            message_key: "msg".to_string(),
            level_key: "level".to_string(),
            name_key: "logger".to_string(),
            caller_key: "file".to_string(),
            time_key: "time".to_string(),
            level_format: LevelFormat::default(),
            time_format: TimeFormat::default(),
            caller_format: CallerFormat::default(),
        }
    }
}

impl EncoderConfig {
    fn level(&self, level: Level) -> String {
        match self.level_format {
            LevelFormat::Lowercase => level.as_str().to_string(),
            LevelFormat::Uppercase => level.as_str().to_uppercase(),
        }
    }

    fn time(&self, time: &DateTime<Local>) -> String {
        match self.time_format {
            TimeFormat::Rfc3339 => time.to_rfc3339_opts(SecondsFormat::Secs, true),
            TimeFormat::Rfc3339Nanos => time.to_rfc3339_opts(SecondsFormat::Nanos, true),
        }
    }

    fn caller(&self, caller: &Caller<'_>) -> String {
        match self.caller_format {
            CallerFormat::Short => caller.short().to_string(),
            CallerFormat::Full => caller.to_string(),
        }
    }
}

/// Source location of a log call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller<'a> {
    /// Source file path.
    pub file: &'a str,
    /// Line number.
    pub line: u32,
}

impl<'a> Caller<'a> {
    /// Creates a caller from a file and line.
    pub const fn new(file: &'a str, line: u32) -> Self {
        Self { file, line }
    }

    /// Trims the path down to its last directory and file name.
    #[must_use]
    pub fn short(&self) -> Self {
        let file = self
            .file
            .rmatch_indices(['/', '\\'])
            .nth(1)
            .map_or(self.file, |(idx, _)| &self.file[idx + 1..]);
        Self {
            file,
            line: self.line,
        }
    }
}

impl From<&'static Location<'static>> for Caller<'static> {
    fn from(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for Caller<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// The fixed part of a record.
#[derive(Debug, Clone)]
pub struct Entry<'a> {
    /// Severity.
    pub level: Level,
    /// When the record was created.
    pub time: DateTime<Local>,
    /// Dotted logger name, if the logger was named.
    pub name: Option<&'a str>,
    /// Call site, if known.
    pub caller: Option<Caller<'a>>,
    /// Rendered message.
    pub message: &'a str,
}

/// Encodes entries in one of the supported layouts.
#[derive(Debug, Clone)]
pub struct Encoder {
    encoding: Encoding,
    config: EncoderConfig,
}

impl Encoder {
    /// Creates an encoder.
    pub const fn new(encoding: Encoding, config: EncoderConfig) -> Self {
        Self { encoding, config }
    }

    /// Layout produced by this encoder.
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Appends one newline-terminated record to `buf`.
    ///
    /// `bound` fields precede `extra` fields in the output.
    pub fn encode(
        &self,
        entry: &Entry<'_>,
        bound: &[Field],
        extra: &[Field],
        buf: &mut Vec<u8>,
    ) -> io::Result<()> {
        match self.encoding {
            Encoding::Json => self.encode_json(entry, bound, extra, buf)?,
            Encoding::Console => self.encode_console(entry, bound, extra, buf)?,
        }
        buf.push(b'\n');
        Ok(())
    }

    fn encode_json(
        &self,
        entry: &Entry<'_>,
        bound: &[Field],
        extra: &[Field],
        buf: &mut Vec<u8>,
    ) -> io::Result<()> {
        let config = &self.config;
        let mut object = JsonObject::open(buf);

        object.entry(&config.level_key, &config.level(entry.level))?;
        object.entry(&config.time_key, &config.time(&entry.time))?;
        if let Some(name) = entry.name {
            object.entry(&config.name_key, name)?;
        }
        if let Some(caller) = &entry.caller {
            object.entry(&config.caller_key, &config.caller(caller))?;
        }
        object.entry(&config.message_key, entry.message)?;
        for field in bound.iter().chain(extra) {
            object.entry(&field.key, &field.value)?;
        }

        object.close();
        Ok(())
    }

    fn encode_console(
        &self,
        entry: &Entry<'_>,
        bound: &[Field],
        extra: &[Field],
        buf: &mut Vec<u8>,
    ) -> io::Result<()> {
        let config = &self.config;
        let mut columns = Vec::with_capacity(5);

        if !config.time_key.is_empty() {
            columns.push(config.time(&entry.time));
        }
        if !config.level_key.is_empty() {
            columns.push(config.level(entry.level));
        }
        if let Some(name) = entry.name.filter(|_| !config.name_key.is_empty()) {
            columns.push(name.to_string());
        }
        if let Some(caller) = entry.caller.filter(|_| !config.caller_key.is_empty()) {
            columns.push(config.caller(&caller));
        }
        if !config.message_key.is_empty() {
            columns.push(entry.message.to_string());
        }

        buf.extend_from_slice(columns.join("\t").as_bytes());

        if !bound.is_empty() || !extra.is_empty() {
            buf.push(b'\t');
            let mut object = JsonObject::open(buf);
            for field in bound.iter().chain(extra) {
                object.entry(&field.key, &field.value)?;
            }
            object.close();
        }
        Ok(())
    }
}

/// Writes a JSON object key by key, preserving insertion order.
struct JsonObject<'a> {
    buf: &'a mut Vec<u8>,
    empty: bool,
}

impl<'a> JsonObject<'a> {
    fn open(buf: &'a mut Vec<u8>) -> Self {
        buf.push(b'{');
        Self { buf, empty: true }
    }

    fn entry<V>(&mut self, key: &str, value: &V) -> io::Result<()>
    where
        V: Serialize + ?Sized,
    {
        if key.is_empty() {
            return Ok(());
        }
        if !self.empty {
            self.buf.push(b',');
        }
        self.empty = false;
        serde_json::to_writer(&mut *self.buf, key)?;
        self.buf.write_all(b":")?;
        serde_json::to_writer(&mut *self.buf, value)?;
        Ok(())
    }

    fn close(self) {
        self.buf.push(b'}');
    }
}
