//! Key/value attributes.

use std::time::Duration;

use time::OffsetDateTime;

use crate::Value;

/// A key/value pair attached to a log event or to a derived handler.
///
/// An attribute whose value is a [`Value::Group`] is flattened into dotted keys when formatted.
#[derive(Clone, Debug, Default)]
pub struct Attr {
    /// The key. An empty key on a leaf attribute discards it.
    pub key: String,

    /// The value.
    pub value: Value,
}

impl Attr {
    /// Creates an attribute from anything convertible into a [`Value`].
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The empty-attribute sentinel: an empty key and the zero value.
    ///
    /// A rewrite hook returns this to remove an attribute from the output.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A string attribute.
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Value::String(value.into()))
    }

    /// A signed integer attribute.
    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, Value::Int64(value))
    }

    /// An unsigned integer attribute.
    pub fn uint(key: impl Into<String>, value: u64) -> Self {
        Self::new(key, Value::Uint64(value))
    }

    /// A floating point attribute.
    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, Value::Float64(value))
    }

    /// A boolean attribute.
    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, Value::Bool(value))
    }

    /// A duration attribute.
    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Self::new(key, Value::Duration(value))
    }

    /// A time attribute.
    pub fn time(key: impl Into<String>, value: OffsetDateTime) -> Self {
        Self::new(key, Value::Time(value))
    }

    /// A group of attributes nested under `key`.
    ///
    /// An empty key inlines the children into the enclosing group.
    pub fn group(key: impl Into<String>, attrs: impl IntoIterator<Item = Self>) -> Self {
        Self::new(key, Value::Group(attrs.into_iter().collect()))
    }

    /// An attribute whose value is produced only when it is formatted.
    pub fn deferred<F>(key: impl Into<String>, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::new(key, Value::deferred(producer))
    }
}

impl<K, V> From<(K, V)> for Attr
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}
