//! Severity levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigError;

/// Severity of a log record, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Diagnostic detail, usually disabled in production.
    Debug,
    /// Routine operational messages.
    Info,
    /// Something unexpected that the process recovered from.
    Warn,
    /// A failed operation.
    Error,
    /// An unrecoverable failure. Fatal records terminate the process.
    Fatal,
}

impl Level {
    /// All levels in ascending severity.
    pub const ALL: [Self; 5] = [
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
    ];

    /// Lowercase name used on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    /// Accepts the all-lowercase or all-uppercase level name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" | "DEBUG" => Ok(Self::Debug),
            "info" | "INFO" => Ok(Self::Info),
            "warn" | "WARN" => Ok(Self::Warn),
            "error" | "ERROR" => Ok(Self::Error),
            "fatal" | "FATAL" => Ok(Self::Fatal),
            other => Err(ConfigError::InvalidLevel(other.to_string())),
        }
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Info,
            tracing::Level::WARN => Self::Warn,
            tracing::Level::ERROR => Self::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn parse_accepts_lower_and_upper_case() {
        for level in Level::ALL {
            assert_eq!(level.as_str().parse::<Level>(), Ok(level));
            assert_eq!(level.as_str().to_uppercase().parse::<Level>(), Ok(level));
        }
    }

    #[test]
    fn parse_rejects_mixed_case_and_unknown_names() {
        assert_eq!(
            "Info".parse::<Level>(),
            Err(ConfigError::InvalidLevel("Info".to_string()))
        );
        assert!("".parse::<Level>().is_err());
        assert!("trace".parse::<Level>().is_err());
    }

    #[test]
    fn tracing_levels_map_onto_nearest_level() {
        assert_eq!(Level::from(tracing::Level::TRACE), Level::Debug);
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warn);
    }
}
