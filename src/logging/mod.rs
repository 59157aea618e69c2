//! Logging configuration and initialization
//!
//! The library itself only emits `tracing` events. Binaries and tests call
//! one of the `init_*` functions to install a subscriber, either with an
//! explicit [`LoggingConfig`] or from the environment.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Standard tracing filter, takes precedence (e.g. "gguf_theta=debug")
//! - `GGUF_THETA_LOG_LEVEL`: Simple log level (error, warn, info, debug, trace)
//! - `GGUF_THETA_LOG_FORMAT`: Console format ("human" or "json")
//! - `GGUF_THETA_LOG_FILE`: Optional file that receives JSON records

use once_cell::sync::OnceCell;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

static TRACING_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Environment variable for log level override
pub const LOG_LEVEL_ENV: &str = "GGUF_THETA_LOG_LEVEL";

/// Environment variable for console format (json/human)
pub const LOG_FORMAT_ENV: &str = "GGUF_THETA_LOG_FORMAT";

/// Environment variable for log file path
pub const LOG_FILE_ENV: &str = "GGUF_THETA_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Errors that can occur during logging initialization
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("invalid log format: {0}")]
    InvalidLogFormat(String),

    #[error("failed to create log directory: {0}")]
    DirectoryCreationFailed(String),

    #[error("failed to open log file: {0}")]
    FileOpenFailed(String),

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInstalled(String),
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }

    /// Directive understood by [`EnvFilter`]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLogLevel(s.to_string())),
        }
    }
}

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "human" | "pretty" | "console" => Ok(LogFormat::Human),
            "json" | "structured" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidLogFormat(s.to_string())),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Include file/line in console records
    pub with_file_info: bool,
    /// Emit span close events
    pub with_span_events: bool,
    /// File receiving JSON records in addition to the console
    pub log_file: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration from the `GGUF_THETA_LOG_*` variables
    ///
    /// Unset variables keep their defaults; values that do not parse are
    /// reported instead of silently ignored.
    pub fn from_env() -> Result<Self, LoggingError> {
        let mut config = Self::new();
        if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
            config.level = level.parse()?;
        }
        if let Ok(format) = std::env::var(LOG_FORMAT_ENV) {
            config.format = format.parse()?;
        }
        if let Ok(file) = std::env::var(LOG_FILE_ENV) {
            config.log_file = Some(PathBuf::from(file));
        }
        Ok(config)
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file_info(mut self, with_file_info: bool) -> Self {
        self.with_file_info = with_file_info;
        self
    }

    pub fn with_span_events(mut self, with_span_events: bool) -> Self {
        self.with_span_events = with_span_events;
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }
}

/// Initialize logging from the environment, ignoring failures
///
/// Idempotent: only the first call installs a subscriber.
pub fn init_logging_default() {
    let _ = init_logging_from_env();
}

/// Initialize logging from the environment
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let config = LoggingConfig::from_env()?;
    init_with_config(&config)
}

/// Initialize logging with `config`
///
/// Later calls after a successful one are no-ops.
pub fn init_with_config(config: &LoggingConfig) -> Result<(), LoggingError> {
    if is_initialized() {
        return Ok(());
    }
    install(config)?;
    let _ = TRACING_INITIALIZED.set(());
    Ok(())
}

/// Check if tracing has been initialized by this module
pub fn is_initialized() -> bool {
    TRACING_INITIALIZED.get().is_some()
}

fn install(config: &LoggingConfig) -> Result<(), LoggingError> {
    let mut layers: Vec<BoxedLayer> = vec![console_layer(config)];
    if let Some(path) = &config.log_file {
        layers.push(file_layer(config, path)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(build_env_filter(config.level)?)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))
}

fn console_layer(config: &LoggingConfig) -> BoxedLayer {
    match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(false)
            .with_file(config.with_file_info)
            .with_line_number(config.with_file_info)
            .with_span_events(span_events(config.with_span_events))
            .boxed(),
        LogFormat::Human => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(config.with_file_info)
            .with_line_number(config.with_file_info)
            .with_span_events(span_events(config.with_span_events))
            .boxed(),
    }
}

/// JSON records appended to `log_path`, whatever the console format
fn file_layer(config: &LoggingConfig, log_path: &Path) -> Result<BoxedLayer, LoggingError> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| LoggingError::DirectoryCreationFailed(e.to_string()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| LoggingError::FileOpenFailed(e.to_string()))?;

    Ok(fmt::layer()
        .json()
        .with_writer(Mutex::new(file))
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_span_events(span_events(config.with_span_events))
        .boxed())
}

fn span_events(enabled: bool) -> FmtSpan {
    if enabled {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

/// `RUST_LOG` wins over the configured level
fn build_env_filter(level: LogLevel) -> Result<EnvFilter, LoggingError> {
    match std::env::var("RUST_LOG") {
        Ok(rust_log) => {
            EnvFilter::try_new(rust_log).map_err(|e| LoggingError::InvalidLogLevel(e.to_string()))
        }
        Err(_) => Ok(EnvFilter::new(level.as_filter_str())),
    }
}
