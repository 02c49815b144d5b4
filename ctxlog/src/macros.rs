//! Formatting shorthands for [`Logger`](crate::Logger).
//!
//! The `*f!` macros wrap their arguments in [`format_args!`] and call the
//! matching formatted method, so the record's caller is the macro's call site.

/// Logs a formatted message at debug level.
///
/// ```rust
/// use ctxlog::{debugf, BackendConfig, Encoding, Level, Logger, MemorySink};
/// use std::sync::Arc;
///
/// let out = MemorySink::new();
/// let backend = BackendConfig::new(Level::Debug, Encoding::Json)
///     .build_with_sinks(Arc::new(out.clone()), Arc::new(MemorySink::new()));
/// let logger = Logger::from_backend(backend);
///
/// let shard = 3;
/// debugf!(logger, "rebalancing shard {shard}");
/// assert_eq!(out.records()[0]["msg"], "rebalancing shard 3");
/// ```
#[macro_export]
macro_rules! debugf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debugf(::std::format_args!($($arg)+))
    };
}

/// Logs a formatted message at info level.
#[macro_export]
macro_rules! infof {
    ($logger:expr, $($arg:tt)+) => {
        $logger.infof(::std::format_args!($($arg)+))
    };
}

/// Logs a formatted message at warn level.
#[macro_export]
macro_rules! warnf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.warnf(::std::format_args!($($arg)+))
    };
}

/// Logs a formatted message at error level.
#[macro_export]
macro_rules! errorf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.errorf(::std::format_args!($($arg)+))
    };
}

/// Logs a formatted message at fatal level, then exits the process.
///
/// See [`Logger::fatal`](crate::Logger::fatal).
#[macro_export]
macro_rules! fatalf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.fatalf(::std::format_args!($($arg)+))
    };
}

/// Builds an array of [`Field`](crate::Field)s with mixed value types.
///
/// ```rust
/// use ctxlog::fields;
///
/// let fields = fields!["user" => 42, "admin" => false, "region" => "eu-west-1"];
/// assert_eq!(fields.len(), 3);
/// assert_eq!(fields[1].key, "admin");
/// ```
#[macro_export]
macro_rules! fields {
    () => {{
        let empty: [$crate::Field; 0] = [];
        empty
    }};
    ($($key:expr => $value:expr),+ $(,)?) => {
        [$($crate::Field::new($key, $value)),+]
    };
}

#[cfg(test)]
mod tests {
    use crate::backend::BackendConfig;
    use crate::config::Encoding;
    use crate::level::Level;
    use crate::logger::Logger;
    use crate::sink::MemorySink;
    use crate::Field;
    use serde_json::json;
    use std::sync::Arc;

    fn capture() -> (Logger, MemorySink) {
        let output = MemorySink::new();
        let backend = BackendConfig::new(Level::Debug, Encoding::Json)
            .build_with_sinks(Arc::new(output.clone()), Arc::new(MemorySink::new()));
        (Logger::from_backend(backend), output)
    }

    #[test]
    fn formatting_macros_log_at_their_level() {
        let (logger, output) = capture();
        let n = 2;

        debugf!(logger, "d{n}");
        infof!(logger, "i{}", n);
        warnf!(logger, "w{n:>3}");
        errorf!(&logger, "e{n}");

        let records = output.records();
        let got: Vec<_> = records
            .iter()
            .map(|r| (r["level"].clone(), r["msg"].clone()))
            .collect();
        assert_eq!(
            got,
            vec![
                (json!("debug"), json!("d2")),
                (json!("info"), json!("i2")),
                (json!("warn"), json!("w  2")),
                (json!("error"), json!("e2")),
            ]
        );
    }

    #[test]
    fn caller_is_the_macro_call_site() {
        let (logger, output) = capture();
        let line = line!() + 1;
        infof!(logger, "here");

        let records = output.records();
        assert_eq!(records[0]["file"], json!(format!("src/macros.rs:{line}")));
    }

    #[test]
    fn fields_macro_mixes_value_types() {
        let (logger, output) = capture();
        logger.infow(
            "placed",
            fields!["order" => 7, "express" => true, "sku" => "A-1",],
        );

        let record = &output.records()[0];
        assert_eq!(record["order"], json!(7));
        assert_eq!(record["express"], json!(true));
        assert_eq!(record["sku"], json!("A-1"));

        let empty: [Field; 0] = fields![];
        assert!(empty.is_empty());
    }
}
