//! Handler configuration.

use std::{fmt, sync::Arc};

use serde::Deserialize;

use crate::{Attr, Level, LevelVar};

/// A rewrite hook, applied to every attribute except the level and the message.
///
/// It receives the names of the groups enclosing the attribute (outermost first, not including the
/// attribute's own key) and returns the attribute to emit. Returning [`Attr::empty`], or any
/// attribute with an empty key, removes it from the line.
pub type ReplaceAttr = Arc<dyn Fn(&[&str], Attr) -> Attr + Send + Sync>;

/// Configuration shared by a root [`Handler`][crate::Handler] and every handler derived from it.
///
/// Nothing here is ever rejected. Missing fields fall back to their defaults, and a time layout
/// that cannot be parsed is rendered literally.
///
/// # Example
///
/// ```
/// use humane_log::{HandlerConfig, Level};
///
/// let config: HandlerConfig =
///     serde_json::from_str(r#"{ "level": "debug", "time_format": "[year]-[month]-[day]" }"#)
///         .unwrap();
/// assert_eq!(config.level, Level::DEBUG);
/// assert!(!config.add_source);
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Minimum level of events reported as enabled. Defaults to [`Level::INFO`].
    pub level: Level,

    /// A runtime-adjustable minimum level. When set, it takes precedence over `level`.
    #[serde(skip)]
    pub level_var: Option<LevelVar>,

    /// Layout for time values, in the `time` crate's format description syntax.
    /// Empty selects [`DEFAULT_TIME_FORMAT`][crate::DEFAULT_TIME_FORMAT].
    ///
    /// If the layout's literal text needs quoting, every formatted time is quoted as a whole.
    pub time_format: String,

    /// Rewrite hook. Defaults to none.
    #[serde(skip)]
    pub replace_attr: Option<ReplaceAttr>,

    /// Whether to append a `source=file:line` attribute. Defaults to `false`.
    pub add_source: bool,
}

impl fmt::Debug for HandlerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerConfig")
            .field("level", &self.level)
            .field("level_var", &self.level_var)
            .field("time_format", &self.time_format)
            .field("replace_attr", &self.replace_attr.as_ref().map(|_| ".."))
            .field("add_source", &self.add_source)
            .finish()
    }
}
