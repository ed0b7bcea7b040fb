//! Logging configuration and setup.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, MakeWriter, format::FmtSpan};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::{TelemetryError, TelemetryResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Log format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line format.
    Pretty,
    /// Compact single-line format (default).
    #[default]
    Compact,
    /// JSON format for structured logging.
    Json,
    /// Full format with all fields.
    Full,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            "full" => Ok(Self::Full),
            other => Err(TelemetryError::ConfigError(format!(
                "unknown log format '{other}'"
            ))),
        }
    }
}

/// Log output target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Log to stdout.
    Stdout,
    /// Log to stderr.
    #[default]
    Stderr,
    /// Log to daily-rotated files in this directory.
    File(PathBuf),
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct LogConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    #[serde(default = "default_level")]
    pub level: String,
    /// Log format.
    #[serde(default)]
    pub format: LogFormat,
    /// Log target.
    #[serde(default)]
    pub target: LogTarget,
    /// File name prefix when logging to a directory.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    /// Whether to include timestamps.
    #[serde(default = "default_true")]
    pub timestamps: bool,
    /// Whether to include file/line info.
    #[serde(default)]
    pub file_info: bool,
    /// Whether to include thread IDs.
    #[serde(default)]
    pub thread_ids: bool,
    /// Whether to emit span open/close events.
    #[serde(default)]
    pub span_events: bool,
    /// Whether to use ANSI colors.
    #[serde(default = "default_true")]
    pub ansi: bool,
    /// Directive overrides (e.g., `fanout_events=trace`).
    #[serde(default)]
    pub directives: Vec<String>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_file_prefix() -> String {
    "fanout".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            file_prefix: default_file_prefix(),
            timestamps: true,
            file_info: false,
            thread_ids: false,
            span_events: false,
            ansi: true,
            directives: Vec::new(),
        }
    }
}

impl LogConfig {
    /// Create a new log config with the specified level.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    /// Set the log format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the log target.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Log to daily-rotated files under `directory`, named after `prefix`.
    #[must_use]
    pub fn with_file_logging(
        mut self,
        directory: impl Into<PathBuf>,
        prefix: impl Into<String>,
    ) -> Self {
        self.target = LogTarget::File(directory.into());
        self.file_prefix = prefix.into();
        self.ansi = false;
        self
    }

    /// Add a directive override.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Disable timestamps.
    #[must_use]
    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    /// Enable file/line info.
    #[must_use]
    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    /// Enable span events. Useful for watching walkers start and stop.
    #[must_use]
    pub fn with_span_events(mut self) -> Self {
        self.span_events = true;
        self
    }

    /// Disable ANSI colors.
    #[must_use]
    pub fn without_ansi(mut self) -> Self {
        self.ansi = false;
        self
    }

    /// Build the env filter from config.
    pub(crate) fn build_filter(&self) -> TelemetryResult<EnvFilter> {
        let mut filter = EnvFilter::try_new(&self.level)
            .map_err(|e| TelemetryError::ConfigError(e.to_string()))?;

        for directive in &self.directives {
            filter = filter.add_directive(directive.parse().map_err(
                |e: tracing_subscriber::filter::ParseError| {
                    TelemetryError::ConfigError(e.to_string())
                },
            )?);
        }

        Ok(filter)
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// Build the formatting layer for `writer`.
    fn build_layer<W>(&self, writer: W) -> BoxedLayer
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let base = fmt::layer()
            .with_writer(writer)
            .with_ansi(self.ansi)
            .with_file(self.file_info)
            .with_line_number(self.file_info)
            .with_thread_ids(self.thread_ids)
            .with_span_events(self.span_events());

        match (self.format, self.timestamps) {
            (LogFormat::Json, true) => base.json().boxed(),
            (LogFormat::Json, false) => base.json().without_time().boxed(),
            (LogFormat::Pretty, true) => base.pretty().boxed(),
            (LogFormat::Pretty, false) => base.pretty().without_time().boxed(),
            (LogFormat::Compact, true) => base.compact().boxed(),
            (LogFormat::Compact, false) => base.compact().without_time().boxed(),
            (LogFormat::Full, true) => base.boxed(),
            (LogFormat::Full, false) => base.without_time().boxed(),
        }
    }
}

/// Set up logging with the given configuration.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the log directory
/// cannot be created, or a global subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.build_filter()?;

    let layer = match &config.target {
        LogTarget::Stdout => config.build_layer(std::io::stdout),
        LogTarget::Stderr => config.build_layer(std::io::stderr),
        LogTarget::File(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                TelemetryError::ConfigError(format!("failed to create log directory: {e}"))
            })?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, &config.file_prefix);
            config.build_layer(appender)
        },
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))
}

/// Set up default logging (info level, stderr, compact format).
///
/// # Errors
///
/// Returns an error if logging cannot be initialized.
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::default())
}

#[cfg(feature = "config")]
impl TryFrom<&fanout_config::LoggingSection> for LogConfig {
    type Error = TelemetryError;

    fn try_from(section: &fanout_config::LoggingSection) -> Result<Self, Self::Error> {
        Ok(Self {
            level: section.level.clone(),
            format: section.format.parse()?,
            directives: section.directives.clone(),
            ..Self::default()
        })
    }
}
