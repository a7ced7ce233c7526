//! `humane_log` formats structured log events as human-friendly [logfmt] lines:
//!
//! ```text
//!  INFO | request served | request.method=GET request.status=200 time=2009-11-10T23:00:00+00:00
//! ```
//!
//! It offers:
//! - A [`Handler`] that renders a [`LogEvent`] (level, message and a tree of [`Attr`]s that may
//!   be nested into groups) as a single line, flattening groups into dotted keys and quoting
//!   keys and values only where needed.
//! - Cheap derivation of per-context handlers through [`Handler::with_attrs`] and
//!   [`Handler::with_group`], backed by an immutable chain shared between derived handlers.
//! - A rewrite hook ([`ReplaceAttr`]) applied to every attribute but the level and the message.
//! - With the `layer` feature (enabled by default), a [`HumaneLayer`] for the [`tracing`]
//!   ecosystem and a [`build_logging_components`] function wiring it to the console or to
//!   rolling files.
//!
//! [logfmt]: https://brandur.org/logfmt#human

mod attr;
mod chain;
mod config;
mod encode;
mod event;
mod flatten;
mod handler;
mod level;
mod value;

#[cfg(feature = "layer")]
mod components;
#[cfg(feature = "layer")]
mod layer;
#[cfg(feature = "layer")]
mod storage;

#[cfg(feature = "layer")]
pub use self::{
    components::{
        ConsoleLoggingConfig, ConsoleStream, FileLoggingConfig, LoggerConfig, LoggerError,
        LoggingComponents, Rotation, build_logging_components,
    },
    layer::HumaneLayer,
};
pub use self::{
    attr::Attr,
    chain::Frame,
    config::{HandlerConfig, ReplaceAttr},
    encode::{DEFAULT_TIME_FORMAT, needs_quoting},
    event::{LogEvent, Source},
    handler::Handler,
    level::{Level, LevelVar, Leveler},
    value::{AnyValue, LogValuer, MarshalError, Value},
};

/// Reserved attribute keys.
///
/// A rewrite hook can match on these to alter or remove the pseudo-attributes the handler adds
/// to every line.
pub mod keys {
    /// Key of the event time attribute.
    pub const TIME: &str = "time";

    /// Key of the source location attribute.
    pub const SOURCE: &str = "source";

    /// Name of the `tracing` field holding an event's message.
    pub const MESSAGE: &str = "message";
}
