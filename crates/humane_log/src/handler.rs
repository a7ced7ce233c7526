//! The handler: configuration, derivation and line output.

use std::{
    fmt,
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    Attr, HandlerConfig, Level, Leveler, LogEvent, ReplaceAttr,
    chain::{Chain, Frame},
    encode::{self, TimeLayout},
    flatten::{Flattener, GroupPath},
    keys,
};

type Sink = Mutex<Box<dyn Write + Send>>;

/// Settings resolved once from a [`HandlerConfig`].
struct Settings {
    level: Box<dyn Leveler>,
    layout: TimeLayout,
    replace_attr: Option<ReplaceAttr>,
    add_source: bool,
}

impl From<HandlerConfig> for Settings {
    fn from(config: HandlerConfig) -> Self {
        let level: Box<dyn Leveler> = match config.level_var {
            Some(var) => Box::new(var),
            None => Box::new(config.level),
        };
        Self {
            level,
            layout: TimeLayout::new(&config.time_format),
            replace_attr: config.replace_attr,
            add_source: config.add_source,
        }
    }
}

/// Formats log events as lines of the form
///
/// ```text
/// LEVEL | message | key=value group.key="quoted value" time=...
/// ```
///
/// and writes each line to a shared sink.
///
/// Handlers are always held in an [`Arc`]. [`with_attrs`][Self::with_attrs] and
/// [`with_group`][Self::with_group] derive new handlers sharing the configuration and the sink;
/// a derivation that would change nothing returns the receiver itself.
///
/// # Example
///
/// ```
/// use std::{
///     io::Write,
///     sync::{Arc, Mutex},
/// };
///
/// use humane_log::{Attr, Handler, HandlerConfig, Level, LogEvent};
///
/// #[derive(Clone, Default)]
/// struct Buffer(Arc<Mutex<Vec<u8>>>);
///
/// impl Write for Buffer {
///     fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
///         self.0.lock().unwrap().write(buf)
///     }
///
///     fn flush(&mut self) -> std::io::Result<()> {
///         Ok(())
///     }
/// }
///
/// let buffer = Buffer::default();
/// let handler = Handler::new(buffer.clone(), HandlerConfig::default());
/// let requests = handler.with_group("request").with_attrs([Attr::string("method", "GET")]);
///
/// let event = LogEvent::new(Level::WARN, "slow response")
///     .without_time()
///     .with_attr(Attr::int("status", 200));
/// requests.handle(&event).unwrap();
///
/// let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
/// assert_eq!(output, " WARN | slow response | request.method=GET request.status=200\n");
/// ```
pub struct Handler {
    settings: Arc<Settings>,
    sink: Arc<Sink>,
    chain: Chain,
}

impl Handler {
    /// Creates a root handler writing to `writer`.
    pub fn new(writer: impl Write + Send + 'static, config: HandlerConfig) -> Arc<Self> {
        Arc::new(Self {
            settings: Arc::new(Settings::from(config)),
            sink: Arc::new(Mutex::new(Box::new(writer))),
            chain: Chain::default(),
        })
    }

    /// Reports whether events at `level` should be handled.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.settings.level.level()
    }

    /// Formats `event` and writes it to the sink as a single line.
    ///
    /// The level is not checked here; callers are expected to consult [`enabled`][Self::enabled]
    /// first.
    ///
    /// # Errors
    ///
    /// Returns the sink's write error, if any.
    pub fn handle(&self, event: &LogEvent) -> io::Result<()> {
        let line = self.format(event);
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_all(line.as_bytes())
    }

    /// Renders `event` as it would be written by [`handle`][Self::handle], newline included.
    pub fn format(&self, event: &LogEvent) -> String {
        let settings = &*self.settings;
        let flattener = Flattener::new(&settings.layout, settings.replace_attr.as_ref());

        let mut line = String::with_capacity(128);
        line.push_str(&event.level.label());
        line.push_str(" | ");
        line.push_str(&event.message);
        line.push_str(" |");

        let mut emit = |key: &str, value: &str| {
            line.push(' ');
            encode::push_text(&mut line, key);
            line.push('=');
            line.push_str(value);
        };

        self.chain.replay(&flattener, &event.attrs, &mut emit);

        if settings.add_source {
            let source = event
                .source
                .as_ref()
                .map_or_else(|| "???:0".to_owned(), ToString::to_string);
            flattener.flatten(
                GroupPath::root(),
                &[Attr::string(keys::SOURCE, source)],
                &mut emit,
            );
        }

        if let Some(time) = event.time {
            flattener.flatten(GroupPath::root(), &[Attr::time(keys::TIME, time)], &mut emit);
        }

        line.push('\n');
        line
    }

    /// Returns a handler that also emits `attrs`, qualified by the groups opened so far.
    ///
    /// An empty `attrs` returns this handler unchanged.
    pub fn with_attrs(self: &Arc<Self>, attrs: impl IntoIterator<Item = Attr>) -> Arc<Self> {
        let attrs: Vec<Attr> = attrs.into_iter().collect();
        if attrs.is_empty() {
            return Arc::clone(self);
        }
        self.derive(Frame::AttrBatch(attrs))
    }

    /// Returns a handler that qualifies every attribute added after this call with `name`.
    ///
    /// An empty `name` returns this handler unchanged.
    pub fn with_group(self: &Arc<Self>, name: impl Into<String>) -> Arc<Self> {
        let name = name.into();
        if name.is_empty() {
            return Arc::clone(self);
        }
        self.derive(Frame::GroupPush(name))
    }

    fn derive(&self, frame: Frame) -> Arc<Self> {
        Arc::new(Self {
            settings: Arc::clone(&self.settings),
            sink: Arc::clone(&self.sink),
            chain: self.chain.push(frame),
        })
    }

    /// The derivation history of this handler, oldest first.
    pub fn frames(&self) -> Vec<Frame> {
        self.chain.frames().into_iter().cloned().collect()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("level", &self.settings.level.level())
            .field("time_format", &self.settings.layout)
            .field("add_source", &self.settings.add_source)
            .field("frames", &self.chain.frames())
            .finish_non_exhaustive()
    }
}
