//! Declarative logger configuration.
//!
//! [`Config`] is the surface an external config loader fills in (YAML, TOML,
//! environment, ...). It keeps the raw strings so that loaders stay trivial;
//! the names are validated once, when [`Logger::new`](crate::Logger::new)
//! consumes the configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigError;
use crate::level::Level;

const DEFAULT_LEVEL: &str = "debug";
const DEFAULT_ENCODING: &str = "json";

/// Logger configuration.
///
/// Missing fields take their defaults when deserialized:
///
/// | field | allowed values | default |
/// |---|---|---|
/// | `level` | `debug`, `info`, `warn`, `error` | `debug` |
/// | `encoding` | `json`, `console` | `json` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum level to emit.
    pub level: String,
    /// Output format.
    pub encoding: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

impl Config {
    /// Creates a configuration with the default level and encoding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum level name.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Sets the encoding name.
    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Parses the minimum level.
    ///
    /// `fatal` is a valid record level but not a valid threshold.
    pub fn parse_level(&self) -> Result<Level, ConfigError> {
        match self.level.parse::<Level>()? {
            Level::Fatal => Err(ConfigError::InvalidLevel(self.level.clone())),
            level => Ok(level),
        }
    }

    /// Parses the encoding.
    pub fn parse_encoding(&self) -> Result<Encoding, ConfigError> {
        self.encoding.parse()
    }
}

/// Output format of emitted records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// One JSON object per line.
    #[default]
    Json,
    /// Tab-separated, human-oriented layout.
    Console,
}

impl Encoding {
    /// Name used in configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Console => "console",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "console" => Ok(Self::Console),
            other => Err(ConfigError::InvalidEncoding(other.to_string())),
        }
    }
}
