//! Value encoding and the quoting rules shared by keys and values.

use std::{borrow::Cow, fmt::Write as _, time::Duration};

use time::{
    OffsetDateTime,
    format_description::{self, OwnedFormatItem},
};
use unicode_general_category::{GeneralCategory, get_general_category};

use crate::Value;

/// Layout used when none is configured.
pub const DEFAULT_TIME_FORMAT: &str =
    "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]";

/// ASCII bytes that can appear in a key or value without quoting.
///
/// Every printable character is safe except space, `"` and `=`. Control characters are not.
#[allow(clippy::as_conversions, clippy::indexing_slicing)] // `From` is not usable in const context
static SAFE_SET: [bool; 128] = {
    let mut set = [false; 128];
    let mut b = b'!';
    while b <= 0x7f {
        set[b as usize] = !matches!(b, b'"' | b'=');
        b += 1;
    }
    set
};

/// Reports whether `s` must be quoted to be read back as a single key or value.
pub fn needs_quoting(s: &str) -> bool {
    s.chars().any(|c| {
        if c.is_ascii() {
            let safe = u8::try_from(c)
                .ok()
                .and_then(|b| SAFE_SET.get(usize::from(b)))
                .copied()
                .unwrap_or(false);
            !safe
        } else {
            c.is_whitespace() || !is_printable(c)
        }
    })
}

/// Letters, marks, numbers, punctuation, symbols and the ASCII space are printable.
fn is_printable(c: char) -> bool {
    c == ' '
        || !matches!(
            get_general_category(c),
            GeneralCategory::Control
                | GeneralCategory::Format
                | GeneralCategory::Surrogate
                | GeneralCategory::PrivateUse
                | GeneralCategory::Unassigned
                | GeneralCategory::SpaceSeparator
                | GeneralCategory::LineSeparator
                | GeneralCategory::ParagraphSeparator
        )
}

/// Appends `s` to `out`, quoted and escaped if [`needs_quoting`] says so.
pub(crate) fn push_text(out: &mut String, s: &str) {
    if needs_quoting(s) {
        push_quoted(out, s);
    } else {
        out.push_str(s);
    }
}

/// Quotes `s`, escaping `"`, `\` and every character that is not printable.
fn push_quoted(out: &mut String, s: &str) {
    out.reserve(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{b}' => out.push_str("\\v"),
            c if is_printable(c) => out.push(c),
            c if c.is_ascii() => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c if u32::from(c) <= 0xffff => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => {
                let _ = write!(out, "\\U{:08x}", u32::from(c));
            }
        }
    }
    out.push('"');
}

fn text(s: Cow<'_, str>) -> String {
    let mut out = String::with_capacity(s.len());
    push_text(&mut out, &s);
    out
}

/// A parsed time layout together with its quoting decision.
///
/// Every formatted time is quoted when the layout's literal text needs quoting. The substituted
/// date and time fields are not inspected.
#[derive(Debug)]
pub(crate) struct TimeLayout {
    source: String,
    items: Option<OwnedFormatItem>,
    quote: bool,
}

impl TimeLayout {
    /// Parses `layout`; an empty layout selects [`DEFAULT_TIME_FORMAT`].
    ///
    /// Layouts that fail to parse are kept and rendered literally.
    pub(crate) fn new(layout: &str) -> Self {
        let source = if layout.is_empty() {
            DEFAULT_TIME_FORMAT
        } else {
            layout
        };
        let items = format_description::parse_owned::<2>(source).ok();
        let quote = match &items {
            Some(items) => literal_needs_quoting(items),
            None => {
                tracing::trace!(
                    layout = source,
                    "time layout did not parse, rendering it literally"
                );
                needs_quoting(source)
            }
        };

        Self {
            source: source.to_owned(),
            items,
            quote,
        }
    }

    /// Formats `time`, returning `None` if the layout cannot be applied to it.
    pub(crate) fn format(&self, time: OffsetDateTime) -> Option<String> {
        let formatted = match &self.items {
            Some(items) => match time.format(items) {
                Ok(formatted) => formatted,
                Err(error) => {
                    tracing::trace!(%error, "dropping time value that failed to format");
                    return None;
                }
            },
            None => self.source.clone(),
        };

        if self.quote {
            let mut out = String::with_capacity(formatted.len() + 2);
            push_quoted(&mut out, &formatted);
            Some(out)
        } else {
            Some(formatted)
        }
    }
}

/// Reports whether the literal text of a layout needs quoting. Component modifiers are ignored.
fn literal_needs_quoting(item: &OwnedFormatItem) -> bool {
    match item {
        OwnedFormatItem::Literal(bytes) => needs_quoting(&String::from_utf8_lossy(bytes)),
        OwnedFormatItem::Compound(items) | OwnedFormatItem::First(items) => {
            items.iter().any(literal_needs_quoting)
        }
        OwnedFormatItem::Optional(item) => literal_needs_quoting(item),
        _ => false,
    }
}

/// Encodes a resolved value for emission.
///
/// Returns `None` if the value cannot be rendered, in which case the attribute is dropped.
pub(crate) fn value(value: &Value, layout: &TimeLayout) -> Option<String> {
    match value {
        Value::Empty => Some(String::new()),
        Value::String(s) => Some(text(Cow::Borrowed(s.as_str()))),
        Value::Int64(v) => Some(v.to_string()),
        Value::Uint64(v) => Some(v.to_string()),
        Value::Float64(v) => Some(float(*v)),
        Value::Bool(v) => Some(v.to_string()),
        Value::Duration(v) => Some(duration(*v)),
        Value::Time(v) => layout.format(*v),
        Value::Group(_) => Some(text(Cow::Owned(value.to_string()))),
        Value::Deferred(_) => Some(text(Cow::Owned(format!("{value:?}")))),
        Value::Opaque(object) => match object.marshal_text() {
            Some(Ok(marshaled)) => Some(text(Cow::Owned(marshaled))),
            Some(Err(error)) => {
                tracing::trace!(%error, "dropping attribute whose value failed to marshal");
                None
            }
            None => Some(text(Cow::Owned(format!("{object:?}")))),
        },
    }
}

/// Shortest round-trip text of a float.
///
/// Scientific notation is used when the decimal exponent is below -4 or at least 21.
pub(crate) fn float(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_owned();
    }
    if v.is_infinite() {
        return if v.is_sign_positive() { "+Inf" } else { "-Inf" }.to_owned();
    }

    let scientific = format!("{v:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return v.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return v.to_string();
    };

    if v == 0.0 || (-4..21).contains(&exponent) {
        v.to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
    }
}

/// Canonical short-unit text of a duration, such as `1.5ms` or `1h2m3s`.
pub(crate) fn duration(d: Duration) -> String {
    const NANOS_PER_MICRO: u128 = 1_000;
    const NANOS_PER_MILLI: u128 = 1_000_000;
    const NANOS_PER_SEC: u128 = 1_000_000_000;

    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_owned();
    }

    let mut out = String::new();
    if nanos < NANOS_PER_MICRO {
        let _ = write!(out, "{nanos}ns");
    } else if nanos < NANOS_PER_MILLI {
        push_fraction(&mut out, nanos, NANOS_PER_MICRO, 3);
        out.push_str("µs");
    } else if nanos < NANOS_PER_SEC {
        push_fraction(&mut out, nanos, NANOS_PER_MILLI, 6);
        out.push_str("ms");
    } else {
        let secs = d.as_secs();
        let (hours, minutes, seconds) = (secs / 3600, secs / 60 % 60, secs % 60);
        if hours > 0 {
            let _ = write!(out, "{hours}h");
        }
        if hours > 0 || minutes > 0 {
            let _ = write!(out, "{minutes}m");
        }
        let subsec = u128::from(d.subsec_nanos());
        push_fraction(
            &mut out,
            u128::from(seconds) * NANOS_PER_SEC + subsec,
            NANOS_PER_SEC,
            9,
        );
        out.push('s');
    }
    out
}

/// Writes `value / unit` with up to `digits` fractional digits and no trailing zeros.
fn push_fraction(out: &mut String, value: u128, unit: u128, digits: usize) {
    let whole = value / unit;
    let fraction = value % unit;
    let _ = write!(out, "{whole}");
    if fraction != 0 {
        let padded = format!("{fraction:0digits$}");
        let _ = write!(out, ".{}", padded.trim_end_matches('0'));
    }
}
