//! Capture of `tracing` span and event fields as [`Attr`]s.

use std::fmt;

use tracing::field::{Field, Visit};

use crate::{Attr, Value, keys};

/// Collects the fields of a span or an event, in recording order.
#[derive(Debug, Default)]
pub(crate) struct FieldStorage {
    /// The collected attributes.
    attrs: Vec<Attr>,

    /// The primary message of an event, if captured.
    message: Option<String>,

    /// Whether the `message` field is captured separately rather than kept as an attribute.
    capture_message: bool,
}

impl FieldStorage {
    /// Storage for an event, whose `message` field becomes the line's message.
    pub(crate) fn for_event() -> Self {
        Self {
            capture_message: true,
            ..Self::default()
        }
    }

    /// Storage for a span, where `message` is an ordinary attribute.
    pub(crate) fn for_span() -> Self {
        Self::default()
    }

    /// Records a field's value, diverting the message if this storage captures it.
    fn record_value(&mut self, name: &str, value: Value) {
        if self.capture_message && name == keys::MESSAGE {
            if self.message.is_none() {
                self.message = Some(value.to_string());
            }
        } else {
            self.attrs.push(Attr::new(name, value));
        }
    }

    pub(crate) fn into_parts(self) -> (Option<String>, Vec<Attr>) {
        (self.message, self.attrs)
    }

    pub(crate) fn into_attrs(self) -> Vec<Attr> {
        self.attrs
    }
}

impl Visit for FieldStorage {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field.name(), Value::Float64(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field.name(), Value::Int64(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field.name(), Value::Uint64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field.name(), Value::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if self.capture_message && field.name() == keys::MESSAGE {
            self.message = Some(value.to_owned()); // `record_str()` is preferred for `message`
        } else {
            self.record_value(field.name(), Value::from(value));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_value(field.name(), Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            // Fields of events bridged from the `log` crate are already reflected in metadata
            name if name.starts_with("log.") => (),
            name => {
                let name = name.strip_prefix("r#").unwrap_or(name);
                self.record_value(name, Value::String(format!("{value:?}")));
            }
        }
    }
}
