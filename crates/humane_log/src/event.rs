//! Log events as handed to a [`Handler`][crate::Handler].

use std::{borrow::Cow, fmt, panic::Location};

use time::OffsetDateTime;

use crate::{Attr, Level};

/// The code location that emitted an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    /// Source file path.
    pub file: Cow<'static, str>,

    /// Line number within `file`.
    pub line: u32,
}

impl Source {
    /// Creates a source location.
    pub fn new(file: impl Into<Cow<'static, str>>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

impl From<&'static Location<'static>> for Source {
    fn from(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line())
    }
}

/// A single log event.
///
/// Events are built by the caller, formatted by one [`Handler::handle`][crate::Handler::handle]
/// call and never retained.
#[derive(Clone, Debug)]
pub struct LogEvent {
    /// Severity.
    pub level: Level,

    /// The message, emitted verbatim.
    pub message: String,

    /// When the event happened. `None` omits the time attribute.
    pub time: Option<OffsetDateTime>,

    /// Event-local attributes, emitted after those of the handler.
    pub attrs: Vec<Attr>,

    /// Where the event was emitted.
    pub source: Option<Source>,
}

impl LogEvent {
    /// Creates an event stamped with the current UTC time.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            time: Some(OffsetDateTime::now_utc()),
            attrs: Vec::new(),
            source: None,
        }
    }

    /// Sets the event time.
    #[must_use]
    pub fn at(mut self, time: OffsetDateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Clears the event time, so no time attribute is emitted.
    #[must_use]
    pub fn without_time(mut self) -> Self {
        self.time = None;
        self
    }

    /// Appends one attribute.
    #[must_use]
    pub fn with_attr(mut self, attr: impl Into<Attr>) -> Self {
        self.attrs.push(attr.into());
        self
    }

    /// Appends attributes in order.
    #[must_use]
    pub fn with_attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the source location to the caller of this method.
    #[must_use]
    #[track_caller]
    pub fn with_caller(self) -> Self {
        self.with_source(Location::caller().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_caller_records_this_file() {
        let event = LogEvent::new(Level::INFO, "here").with_caller();
        let source = event.source.expect("source is set");
        assert!(source.file.ends_with("event.rs"));
        assert_eq!(source.to_string(), format!("{}:{}", source.file, source.line));
    }

    #[test]
    fn builders_append_in_order() {
        let event = LogEvent::new(Level::WARN, "m")
            .without_time()
            .with_attr(("a", 1))
            .with_attrs([Attr::bool("b", true)]);

        assert!(event.time.is_none());
        let keys: Vec<_> = event.attrs.iter().map(|attr| attr.key.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
    }
}
