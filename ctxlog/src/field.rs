//! Structured fields attached to log records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// One key/value pair on a log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name as written to the record.
    pub key: String,
    /// Field value.
    pub value: Value,
}

impl Field {
    /// Creates a field from anything convertible into a JSON value.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a field holding a duration rendered for humans, e.g. `1.5s`.
    pub fn duration(key: impl Into<String>, duration: Duration) -> Self {
        Self::new(key, format!("{duration:?}"))
    }

    /// Creates a field holding the `Display` rendering of `value`.
    pub fn display(key: impl Into<String>, value: impl std::fmt::Display) -> Self {
        Self::new(key, value.to_string())
    }
}

impl<K, V> From<(K, V)> for Field
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MetaKey;
    use serde_json::json;

    #[test]
    fn tuples_convert_into_fields() {
        let field: Field = ("attempt", 3).into();
        assert_eq!(field, Field::new("attempt", json!(3)));
    }

    #[test]
    fn meta_keys_use_their_wire_name() {
        let field: Field = (MetaKey::AcceptLanguage, "en-US".to_string()).into();
        assert_eq!(field.key, "accept-language");
        assert_eq!(field.value, json!("en-US"));
    }

    #[test]
    fn durations_render_as_readable_strings() {
        let field = Field::duration("elapsed", Duration::from_millis(1500));
        assert_eq!(field.value, json!("1.5s"));
    }

    #[test]
    fn fields_compare_by_key_and_value() {
        fn assert_eq_impl<T: Eq>() {}
        assert_eq_impl::<Field>();

        let tags = [Field::new("retry", true), Field::new("shard", 4)];
        assert!(tags.contains(&Field::new("shard", 4)));
        assert_ne!(Field::new("shard", 4), Field::new("shard", "4"));
    }
}
