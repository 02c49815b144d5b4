//! Request metadata carried through an execution context.
//!
//! This module defines the fixed vocabulary of observability fields a request
//! can carry ([`MetaKey`]) and the two functions that move those fields into
//! and out of a [`Context`]. Values are plain strings; an empty string is
//! treated as "not collected" on both sides, so it never reaches a log record.
//!
//! ```rust
//! use ctxlog::meta::{self, MetaKey};
//! use ctxlog::Context;
//!
//! let ctx = meta::inject(
//!     &Context::background(),
//!     [(MetaKey::TraceId, "abc123"), (MetaKey::IpAddress, "")],
//! );
//!
//! let extracted = meta::extract(Some(&ctx));
//! assert_eq!(extracted.get(&MetaKey::TraceId).map(String::as_str), Some("abc123"));
//! assert!(!extracted.contains_key(&MetaKey::IpAddress));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::context::Context;
use crate::errors::ConfigError;

/// Metadata extracted from a context, keyed by field.
pub type Metadata = HashMap<MetaKey, String>;

/// A field in the fixed metadata vocabulary.
///
/// The set is closed: arbitrary key/value pairs belong on the logger via
/// [`Logger::with`](crate::Logger::with), not in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetaKey {
    /// Identifier tracing a request across services.
    #[serde(rename = "trace_id")]
    TraceId,
    /// User making the request.
    #[serde(rename = "request_user_id")]
    RequestUserId,
    /// Kind of user making the request.
    #[serde(rename = "request_user_type")]
    RequestUserType,
    /// Client IP address.
    #[serde(rename = "ip_address")]
    IpAddress,
    /// User agent header of the request.
    #[serde(rename = "user_agent")]
    UserAgent,
    /// Network address that sent the request.
    #[serde(rename = "remote_addr")]
    RemoteAddr,
    /// Page the request was linked from.
    #[serde(rename = "referer")]
    Referer,
    /// Name of the running service.
    #[serde(rename = "service_name")]
    ServiceName,
    /// Version of the running service.
    #[serde(rename = "service_version")]
    ServiceVersion,
    /// Language and locale preferred by the client.
    #[serde(rename = "accept-language")]
    AcceptLanguage,
    /// Client application name.
    #[serde(rename = "x-client-app-name")]
    ClientAppName,
    /// Operating system of the client application.
    #[serde(rename = "x-client-app-os")]
    ClientAppOs,
    /// Version of the client application.
    #[serde(rename = "x-client-app-version")]
    ClientAppVersion,
    /// Timezone offset reported by the client.
    #[serde(rename = "x-tz-offset")]
    TzOffset,
}

impl MetaKey {
    /// Every key, in the order fields are attached to log records.
    pub const ALL: [Self; 14] = [
        Self::TraceId,
        Self::RequestUserId,
        Self::RequestUserType,
        Self::IpAddress,
        Self::UserAgent,
        Self::RemoteAddr,
        Self::Referer,
        Self::ServiceName,
        Self::ServiceVersion,
        Self::AcceptLanguage,
        Self::ClientAppName,
        Self::ClientAppOs,
        Self::ClientAppVersion,
        Self::TzOffset,
    ];

    /// Field name used in log records.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TraceId => "trace_id",
            Self::RequestUserId => "request_user_id",
            Self::RequestUserType => "request_user_type",
            Self::IpAddress => "ip_address",
            Self::UserAgent => "user_agent",
            Self::RemoteAddr => "remote_addr",
            Self::Referer => "referer",
            Self::ServiceName => "service_name",
            Self::ServiceVersion => "service_version",
            Self::AcceptLanguage => "accept-language",
            Self::ClientAppName => "x-client-app-name",
            Self::ClientAppOs => "x-client-app-os",
            Self::ClientAppVersion => "x-client-app-version",
            Self::TzOffset => "x-tz-offset",
        }
    }
}

impl fmt::Display for MetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MetaKey> for String {
    fn from(key: MetaKey) -> Self {
        key.as_str().to_string()
    }
}

impl FromStr for MetaKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownMetaKey(s.to_string()))
    }
}

/// Derives a context carrying the non-empty entries of `fields`.
///
/// Entries with an empty value are skipped: they neither overwrite nor clear a
/// value bound further up. An empty input returns a context equivalent to
/// `ctx`.
///
/// Any iterator of pairs works, including a [`Metadata`] map. An optional map
/// is passed flattened; `None` adds nothing:
///
/// ```rust
/// use ctxlog::{meta, Context, MetaKey, Metadata};
///
/// let inbound: Option<Metadata> =
///     Some(Metadata::from([(MetaKey::TraceId, "abc123".to_string())]));
/// let ctx = meta::inject(&Context::background(), inbound.into_iter().flatten());
/// assert_eq!(meta::lookup(&ctx, MetaKey::TraceId), Some("abc123"));
///
/// let absent: Option<Metadata> = None;
/// let unchanged = meta::inject(&ctx, absent.into_iter().flatten());
/// assert_eq!(unchanged.depth(), ctx.depth());
/// ```
#[must_use]
pub fn inject<I, V>(ctx: &Context, fields: I) -> Context
where
    I: IntoIterator<Item = (MetaKey, V)>,
    V: Into<String>,
{
    fields
        .into_iter()
        .map(|(key, value)| (key, value.into()))
        .filter(|(_, value)| !value.is_empty())
        .fold(ctx.clone(), |ctx, (key, value)| ctx.with_value(key, value))
}

/// Reads every metadata field bound in `ctx`.
///
/// Only keys bound to a non-empty string are returned; a binding of any other
/// type reads as absent. Cancellation and deadlines have no effect.
pub fn extract(ctx: Option<&Context>) -> Metadata {
    let Some(ctx) = ctx else {
        return Metadata::new();
    };

    MetaKey::ALL
        .into_iter()
        .filter_map(|key| lookup(ctx, key).map(|value| (key, value.to_string())))
        .collect()
}

/// Reads one metadata field, with the same rules as [`extract`].
pub fn lookup(ctx: &Context, key: MetaKey) -> Option<&str> {
    let raw = ctx.raw_value(&key)?;
    raw.downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| raw.downcast_ref::<&'static str>().copied())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_key() -> impl Strategy<Value = MetaKey> {
        prop::sample::select(MetaKey::ALL.to_vec())
    }

    fn arb_metadata() -> impl Strategy<Value = Metadata> {
        prop::collection::hash_map(arb_key(), "[a-zA-Z0-9 ._:/-]{1,32}", 0..MetaKey::ALL.len())
    }

    proptest! {
        #[test]
        fn inject_then_extract_round_trips(metadata in arb_metadata()) {
            let ctx = inject(&Context::background(), metadata.clone());
            prop_assert_eq!(extract(Some(&ctx)), metadata);
        }

        #[test]
        fn empty_values_never_come_back(
            metadata in arb_metadata(),
            empties in prop::collection::hash_set(arb_key(), 1..4),
        ) {
            let mut input = metadata;
            for key in &empties {
                input.insert(*key, String::new());
            }

            let extracted = extract(Some(&inject(&Context::background(), input)));
            for key in &empties {
                prop_assert!(!extracted.contains_key(key));
            }
        }

        #[test]
        fn wire_names_parse_back(key in arb_key()) {
            prop_assert_eq!(key.as_str().parse::<MetaKey>(), Ok(key));
        }
    }

    #[test]
    fn extract_without_context_is_empty() {
        assert!(extract(None).is_empty());
        assert!(extract(Some(&Context::background())).is_empty());
    }

    #[test]
    fn empty_value_does_not_clear_an_existing_binding() {
        let ctx = inject(&Context::background(), [(MetaKey::TraceId, "abc")]);
        let ctx = inject(&ctx, [(MetaKey::TraceId, "")]);
        assert_eq!(lookup(&ctx, MetaKey::TraceId), Some("abc"));
    }

    #[test]
    fn absent_map_adds_no_layers() {
        let base = Context::background().with_value(MetaKey::Referer, "x".to_string());
        let none: Option<Metadata> = None;
        let ctx = inject(&base, none.into_iter().flatten());
        assert_eq!(ctx.depth(), base.depth());
    }

    #[test]
    fn reinjection_yields_newest_value_and_leaves_parent_alone() {
        let first = inject(&Context::background(), [(MetaKey::RequestUserId, "1")]);
        let second = inject(&first, [(MetaKey::RequestUserId, "2")]);

        assert_eq!(lookup(&first, MetaKey::RequestUserId), Some("1"));
        assert_eq!(lookup(&second, MetaKey::RequestUserId), Some("2"));
    }

    #[test]
    fn non_string_bindings_read_as_absent() {
        let ctx = Context::background()
            .with_value(MetaKey::TraceId, 42_u64)
            .with_value(MetaKey::ServiceName, "billing");

        let extracted = extract(Some(&ctx));
        assert!(!extracted.contains_key(&MetaKey::TraceId));
        assert_eq!(
            extracted.get(&MetaKey::ServiceName).map(String::as_str),
            Some("billing")
        );
    }

    #[test]
    fn string_keys_cannot_impersonate_meta_keys() {
        let ctx = Context::background().with_value("trace_id", "abc".to_string());
        assert!(extract(Some(&ctx)).is_empty());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&MetaKey::AcceptLanguage).unwrap();
        assert_eq!(json, "\"accept-language\"");
        let key: MetaKey = serde_json::from_str("\"x-tz-offset\"").unwrap();
        assert_eq!(key, MetaKey::TzOffset);
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(
            "tenant_id".parse::<MetaKey>(),
            Err(ConfigError::UnknownMetaKey("tenant_id".to_string()))
        );
    }
}
