//! Severity levels, their fixed-width labels, and runtime-adjustable minimum levels.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicI32, Ordering},
    },
};

use serde::Deserialize;

/// Width of the level column in a formatted line.
const LABEL_WIDTH: usize = 5;

/// The severity of a log event.
///
/// Levels are plain integers, so any value between the named constants is a valid custom level.
/// Higher values are more severe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(from = "LevelRepr")]
pub struct Level(i32);

impl Level {
    /// Detailed diagnostics.
    pub const DEBUG: Self = Self(-4);

    /// Informational messages.
    pub const INFO: Self = Self(0);

    /// Conditions worth looking at.
    pub const WARN: Self = Self(4);

    /// Failures.
    pub const ERROR: Self = Self(8);

    /// Creates a level from its numeric severity.
    #[must_use]
    pub const fn new(severity: i32) -> Self {
        Self(severity)
    }

    /// Numeric severity of this level.
    #[must_use]
    pub const fn severity(self) -> i32 {
        self.0
    }

    /// The fixed-width label used at the start of every formatted line.
    ///
    /// The four standard levels map to five-column labels so that messages line up;
    /// any other level renders as its [`Display`][fmt::Display] name, right-padded to the
    /// same width.
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::DEBUG => "DEBUG".to_owned(),
            Self::INFO => " INFO".to_owned(),
            Self::WARN => " WARN".to_owned(),
            Self::ERROR => "ERROR".to_owned(),
            other => format!("{other:<LABEL_WIDTH$}"),
        }
    }

    /// Parses a level name such as `"warn"` or `"INFO+2"`, falling back to [`Level::INFO`] for
    /// anything unrecognized.
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        let s = s.trim();
        let split = s.find(['+', '-']).unwrap_or(s.len());
        let (name, offset) = s.split_at(split);

        let base = match name.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Self::DEBUG,
            "info" => Self::INFO,
            "warn" | "warning" => Self::WARN,
            "error" => Self::ERROR,
            _ => return Self::INFO,
        };

        if offset.is_empty() {
            return base;
        }
        offset
            .parse::<i32>()
            .ok()
            .and_then(|offset| base.0.checked_add(offset))
            .map_or(base, Self)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (base, name) = if *self < Self::INFO {
            (Self::DEBUG, "DEBUG")
        } else if *self < Self::WARN {
            (Self::INFO, "INFO")
        } else if *self < Self::ERROR {
            (Self::WARN, "WARN")
        } else {
            (Self::ERROR, "ERROR")
        };

        let offset = i64::from(self.0) - i64::from(base.0);
        if offset == 0 {
            f.pad(name)
        } else {
            f.pad(&format!("{name}{offset:+}"))
        }
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Self(Self::DEBUG.0 - 4),
            tracing::Level::DEBUG => Self::DEBUG,
            tracing::Level::INFO => Self::INFO,
            tracing::Level::WARN => Self::WARN,
            tracing::Level::ERROR => Self::ERROR,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Severity(i32),
    Name(String),
}

impl From<LevelRepr> for Level {
    fn from(repr: LevelRepr) -> Self {
        match repr {
            LevelRepr::Severity(severity) => Self(severity),
            LevelRepr::Name(name) => Self::from_str_lossy(&name),
        }
    }
}

/// Anything that can report a minimum level.
pub trait Leveler: Send + Sync {
    /// The level currently in effect.
    fn level(&self) -> Level;
}

impl Leveler for Level {
    fn level(&self) -> Level {
        *self
    }
}

/// A minimum level that can be changed while handlers using it are live.
///
/// Clones share the same underlying value.
#[derive(Clone, Debug, Default)]
pub struct LevelVar(Arc<AtomicI32>);

impl LevelVar {
    /// Creates a variable holding `level`.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self(Arc::new(AtomicI32::new(level.0)))
    }

    /// Replaces the level seen by every handler sharing this variable.
    pub fn set(&self, level: Level) {
        self.0.store(level.0, Ordering::Relaxed);
    }
}

impl Leveler for LevelVar {
    fn level(&self) -> Level {
        Level(self.0.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_labels_share_a_column() {
        assert_eq!(Level::DEBUG.label(), "DEBUG");
        assert_eq!(Level::INFO.label(), " INFO");
        assert_eq!(Level::WARN.label(), " WARN");
        assert_eq!(Level::ERROR.label(), "ERROR");
    }

    #[test]
    fn custom_levels_render_relative_to_nearest_standard_level() {
        assert_eq!(Level::new(2).to_string(), "INFO+2");
        assert_eq!(Level::new(-8).to_string(), "DEBUG-4");
        assert_eq!(Level::new(7).to_string(), "WARN+3");
        assert_eq!(Level::new(12).to_string(), "ERROR+4");
        assert_eq!(Level::new(2).label(), "INFO+2");
    }

    #[test]
    fn names_parse_leniently() {
        assert_eq!(Level::from_str_lossy("debug"), Level::DEBUG);
        assert_eq!(Level::from_str_lossy("WARNING"), Level::WARN);
        assert_eq!(Level::from_str_lossy("INFO+2"), Level::new(2));
        assert_eq!(Level::from_str_lossy("error-1"), Level::new(7));
        assert_eq!(Level::from_str_lossy("verbose"), Level::INFO);
    }

    #[test]
    fn deserializes_from_names_and_numbers() {
        let level: Level = serde_json::from_str(r#""warn""#).expect("level name");
        assert_eq!(level, Level::WARN);

        let level: Level = serde_json::from_str("-4").expect("level number");
        assert_eq!(level, Level::DEBUG);
    }

    #[test]
    fn tracing_levels_map_onto_severities() {
        assert_eq!(Level::from(tracing::Level::TRACE), Level::new(-8));
        assert_eq!(Level::from(tracing::Level::WARN), Level::WARN);
        assert!(Level::from(tracing::Level::TRACE) < Level::DEBUG);
    }

    #[test]
    fn level_var_updates_are_shared_across_clones() {
        let var = LevelVar::new(Level::INFO);
        let shared = var.clone();
        shared.set(Level::ERROR);
        assert_eq!(var.level(), Level::ERROR);
    }
}
