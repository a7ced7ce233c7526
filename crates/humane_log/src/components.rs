//! Construction of ready-to-install [`HumaneLayer`]s for console and file output.

use std::num::NonZeroUsize;

pub use tracing_appender::rolling::Rotation;

use crate::{Handler, HandlerConfig, HumaneLayer, Level};

/// Configuration for the logging components built by [`build_logging_components`].
#[derive(Clone, Debug, Default)]
pub struct LoggerConfig {
    /// Formatting options shared by every destination.
    pub handler: HandlerConfig,

    /// Configuration for console logging. If `None`, console logging is disabled.
    pub console_config: Option<ConsoleLoggingConfig>,

    /// Configuration for file logging. If `None`, file logging is disabled.
    pub file_config: Option<FileLoggingConfig>,

    /// Whether span fields and the events inside a span are grouped under the span's name.
    pub group_spans: bool,
}

/// Configuration for console logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsoleLoggingConfig {
    /// The stream to write to.
    pub stream: ConsoleStream,

    /// Minimum level for console logs, overriding [`HandlerConfig::level`].
    pub level: Option<Level>,
}

/// A standard stream of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleStream {
    /// Standard output.
    Stdout,

    /// Standard error.
    Stderr,
}

/// Configuration for file logging.
#[derive(Clone, Debug)]
pub struct FileLoggingConfig {
    /// Directory where log files will be stored.
    pub directory: String,

    /// Prefix for log file names.
    pub file_name_prefix: String,

    /// Rotation strategy for log files.
    pub file_rotation: Rotation,

    /// Maximum number of log files to keep. If `None`, all files are kept.
    pub max_log_files: Option<NonZeroUsize>,

    /// Minimum level for file logs, overriding [`HandlerConfig::level`].
    pub level: Option<Level>,
}

/// Holds the constructed layers and their associated worker guards.
///
/// Logs are written only as long as the guards are kept alive.
#[derive(Debug)]
pub struct LoggingComponents {
    /// The console layer, if configured.
    pub console_log_layer: Option<HumaneLayer>,

    /// The file layer, if configured.
    pub file_log_layer: Option<HumaneLayer>,

    /// Worker guards of the non-blocking writers behind the layers.
    pub guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
}

/// Errors that can occur while building the logging components.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Represents an error during initialization of the rolling file appender.
    #[error("Failed to initialize rolling file appender: {0}")]
    FileAppenderInitialization(#[from] tracing_appender::rolling::InitError),
}

/// Builds a [`HumaneLayer`] per configured destination, each writing through a non-blocking
/// writer.
///
/// # Example
///
/// ```no_run
/// use humane_log::{
///     ConsoleLoggingConfig, ConsoleStream, Level, LoggerConfig, build_logging_components,
/// };
/// use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
///
/// let config = LoggerConfig {
///     console_config: Some(ConsoleLoggingConfig {
///         stream: ConsoleStream::Stderr,
///         level: Some(Level::DEBUG),
///     }),
///     ..LoggerConfig::default()
/// };
///
/// let components = build_logging_components(config).expect("logging components");
/// let _guards = components.guards; // Keep guards in scope
///
/// tracing_subscriber::registry()
///     .with(components.console_log_layer)
///     .init();
///
/// tracing::info!(user = "ada", "logged in");
/// ```
///
/// # Errors
///
/// Returns [`LoggerError`] if the rolling file appender cannot be created.
pub fn build_logging_components(config: LoggerConfig) -> Result<LoggingComponents, LoggerError> {
    let mut guards = Vec::new();

    let layer = |writer, level: Option<Level>| {
        let mut handler_config = config.handler.clone();
        if let Some(level) = level {
            handler_config.level = level;
            handler_config.level_var = None;
        }
        HumaneLayer::new(Handler::new(writer, handler_config)).with_span_groups(config.group_spans)
    };

    // Console logging
    let console_log_layer = if let Some(console_config) = config.console_config {
        let (writer, guard) = match console_config.stream {
            ConsoleStream::Stdout => tracing_appender::non_blocking(std::io::stdout()),
            ConsoleStream::Stderr => tracing_appender::non_blocking(std::io::stderr()),
        };
        guards.push(guard);
        Some(layer(writer, console_config.level))
    } else {
        None
    };

    // File logging
    let file_log_layer = if let Some(file_config) = &config.file_config {
        let mut file_appender_builder = tracing_appender::rolling::RollingFileAppender::builder()
            .rotation(file_config.file_rotation.clone())
            .filename_prefix(file_config.file_name_prefix.as_str());

        if let Some(max_log_files) = file_config.max_log_files {
            file_appender_builder = file_appender_builder.max_log_files(usize::from(max_log_files));
        }

        let file_appender = file_appender_builder.build(&file_config.directory)?;
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        guards.push(guard);
        Some(layer(writer, file_config.level))
    } else {
        None
    };

    Ok(LoggingComponents {
        console_log_layer,
        file_log_layer,
        guards,
    })
}
