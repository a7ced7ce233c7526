//! Typed attribute values.

use std::{fmt, sync::Arc, time::Duration};

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{Attr, encode};

/// Errors produced by an [`AnyValue`]'s text-marshaling capability.
///
/// These never reach the caller of [`Handler::handle`][crate::Handler::handle]: an attribute whose
/// value fails to marshal is dropped from the line.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    /// The value could not be serialized to JSON.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any other marshaling failure.
    #[error("{0}")]
    Custom(String),
}

/// An arbitrary object carried by [`Value::Opaque`].
///
/// Objects that know how to render themselves as text override [`AnyValue::marshal_text`];
/// everything else falls back to its [`Debug`][fmt::Debug] representation.
pub trait AnyValue: fmt::Debug + Send + Sync {
    /// The text-marshaling capability.
    ///
    /// Returns `None` if the object does not have one.
    fn marshal_text(&self) -> Option<Result<String, MarshalError>> {
        None
    }
}

impl AnyValue for serde_json::Value {
    fn marshal_text(&self) -> Option<Result<String, MarshalError>> {
        Some(serde_json::to_string(self).map_err(MarshalError::from))
    }
}

/// A producer of a value that is only computed if the attribute is actually formatted.
pub trait LogValuer: Send + Sync {
    /// Computes the value.
    fn log_value(&self) -> Value;
}

impl<F> LogValuer for F
where
    F: Fn() -> Value + Send + Sync,
{
    fn log_value(&self) -> Value {
        self()
    }
}

/// The value half of an [`Attr`].
#[derive(Clone, Default)]
pub enum Value {
    /// The zero value. Paired with an empty key it forms the [`Attr::empty`] sentinel.
    #[default]
    Empty,

    /// Text.
    String(String),

    /// A signed integer.
    Int64(i64),

    /// An unsigned integer.
    Uint64(u64),

    /// A floating point number.
    Float64(f64),

    /// A boolean.
    Bool(bool),

    /// A span of time.
    Duration(Duration),

    /// An instant, rendered with the handler's time layout.
    Time(OffsetDateTime),

    /// A named group of attributes, flattened into dotted keys.
    Group(Vec<Attr>),

    /// A value computed on demand.
    Deferred(Arc<dyn LogValuer>),

    /// Any other object.
    Opaque(Arc<dyn AnyValue>),
}

impl Value {
    /// Wraps an object rendered through its [`Display`][fmt::Display] implementation.
    pub fn display<T>(value: T) -> Self
    where
        T: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self::Opaque(Arc::new(Displayed(value)))
    }

    /// Wraps an error, rendered as its message.
    pub fn error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::display(error)
    }

    /// Wraps a serializable object, rendered as compact JSON.
    ///
    /// If serialization fails when the attribute is formatted, the attribute is dropped.
    pub fn json<T>(value: T) -> Self
    where
        T: serde::Serialize + fmt::Debug + Send + Sync + 'static,
    {
        Self::Opaque(Arc::new(Json(value)))
    }

    /// Wraps a producer that computes the value when the attribute is formatted.
    pub fn deferred<F>(producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::Deferred(Arc::new(producer))
    }

    /// Resolves a [`Value::Deferred`] by running its producer once.
    ///
    /// Any other value is returned as is. A producer that yields another deferred value is not
    /// run again.
    #[must_use]
    pub fn resolve(self) -> Self {
        match self {
            Self::Deferred(producer) => producer.log_value(),
            other => other,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::String(v) => f.debug_tuple("String").field(v).finish(),
            Self::Int64(v) => f.debug_tuple("Int64").field(v).finish(),
            Self::Uint64(v) => f.debug_tuple("Uint64").field(v).finish(),
            Self::Float64(v) => f.debug_tuple("Float64").field(v).finish(),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Duration(v) => f.debug_tuple("Duration").field(v).finish(),
            Self::Time(v) => f.debug_tuple("Time").field(v).finish(),
            Self::Group(v) => f.debug_tuple("Group").field(v).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
            Self::Opaque(v) => f.debug_tuple("Opaque").field(v).finish(),
        }
    }
}

/// Raw, unquoted text of the value. Times use RFC 3339.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::String(v) => f.write_str(v),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Uint64(v) => write!(f, "{v}"),
            Self::Float64(v) => f.write_str(&encode::float(*v)),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Duration(v) => f.write_str(&encode::duration(*v)),
            Self::Time(v) => match v.format(&Rfc3339) {
                Ok(formatted) => f.write_str(&formatted),
                Err(_) => write!(f, "{v}"),
            },
            Self::Group(attrs) => {
                f.write_str("[")?;
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}={}", attr.key, attr.value)?;
                }
                f.write_str("]")
            }
            Self::Deferred(producer) => write!(f, "{}", producer.log_value()),
            Self::Opaque(object) => match object.marshal_text() {
                Some(Ok(text)) => f.write_str(&text),
                Some(Err(_)) => Ok(()),
                None => write!(f, "{object:?}"),
            },
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int64(i64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Uint64(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Uint64(u64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Duration> for Value {
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(value: OffsetDateTime) -> Self {
        Self::Time(value)
    }
}

impl From<Vec<Attr>> for Value {
    fn from(value: Vec<Attr>) -> Self {
        Self::Group(value)
    }
}

/// Opaque wrapper rendering through `Display`.
#[derive(Debug)]
struct Displayed<T>(T);

impl<T> AnyValue for Displayed<T>
where
    T: fmt::Display + fmt::Debug + Send + Sync,
{
    fn marshal_text(&self) -> Option<Result<String, MarshalError>> {
        Some(Ok(self.0.to_string()))
    }
}

/// Opaque wrapper rendering as compact JSON.
#[derive(Debug)]
struct Json<T>(T);

impl<T> AnyValue for Json<T>
where
    T: serde::Serialize + fmt::Debug + Send + Sync,
{
    fn marshal_text(&self) -> Option<Result<String, MarshalError>> {
        Some(serde_json::to_string(&self.0).map_err(MarshalError::from))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn deferred_values_resolve_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let value = Value::deferred(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::Int64(42)
        });

        let resolved = value.resolve();
        assert!(matches!(resolved, Value::Int64(42)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_deferred_values_are_not_resolved_again() {
        let value = Value::deferred(|| Value::deferred(|| Value::Bool(true)));
        assert!(matches!(value.resolve(), Value::Deferred(_)));
    }

    #[test]
    fn display_renders_raw_text() {
        assert_eq!(Value::from("a b").to_string(), "a b");
        assert_eq!(Value::from(Duration::from_secs(5)).to_string(), "5s");
        assert_eq!(
            Value::Group(vec![Attr::int("d", 4), Attr::string("e", "f")]).to_string(),
            "[d=4 e=f]"
        );
        assert_eq!(
            Value::error(std::fmt::Error).to_string(),
            "an error occurred when formatting an argument"
        );
    }

    #[test]
    fn json_values_marshal_to_compact_json() {
        let value = Value::json(serde_json::json!({ "id": 7 }));
        assert_eq!(value.to_string(), r#"{"id":7}"#);
    }
}
