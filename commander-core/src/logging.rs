//! ``src/logging.rs``
//!
//! Global `tracing` setup: JSONL events to a rolling file through a
//! non-blocking `tracing-appender` writer, or plain lines to stderr.
//! Events carry `marker` and `operation_type` fields so log files can be
//! filtered per subsystem.

use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static LOGGER_INSTALLED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    pub log_file_prefix: CompactString,
    pub log_level: CompactString,
    pub max_log_files: usize,
    pub rotation: LogRotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Never,
    Daily,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: CompactString::const_new("commander"),
            log_level: CompactString::const_new("info"),
            max_log_files: 10,
            rotation: LogRotation::Daily,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Invalid log directory: {0}")]
    InvalidLogDirectory(String),

    #[error("Failed to create log directory: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogTarget {
    #[default]
    JsonFile,
    Stderr,
}

#[derive(Debug, Default)]
pub struct LoggerBuilder {
    config: LoggerConfig,
    target: LogTarget,
}

impl LoggerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: &str) -> Self {
        self.config.log_level = CompactString::new(level);
        self
    }

    #[must_use]
    pub const fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Install the global subscriber. Keep the returned guard alive until
    /// exit or buffered events are lost.
    pub fn build(self) -> Result<WorkerGuard> {
        if LOGGER_INSTALLED.swap(true, Ordering::AcqRel) {
            return Err(LoggingError::AlreadyInitialized.into());
        }

        let result: Result<WorkerGuard> = self.install();
        if result.is_err() {
            LOGGER_INSTALLED.store(false, Ordering::Release);
        }

        result
    }

    fn install(self) -> Result<WorkerGuard> {
        validate_config(&self.config)?;
        let filter: EnvFilter = make_filter(&self.config.log_level)?;

        match self.target {
            LogTarget::JsonFile => {
                setup_log_directory(&self.config.log_dir)?;

                let rotation: Rotation = match self.config.rotation {
                    LogRotation::Never => Rotation::NEVER,
                    LogRotation::Daily => Rotation::DAILY,
                };

                let file_appender: RollingFileAppender = RollingFileAppender::builder()
                    .rotation(rotation)
                    .filename_prefix(self.config.log_file_prefix.as_str())
                    .filename_suffix("jsonl")
                    .max_log_files(self.config.max_log_files)
                    .build(&self.config.log_dir)
                    .context("Failed to create file appender")?;

                let (writer, guard): (NonBlocking, WorkerGuard) =
                    tracing_appender::non_blocking(file_appender);

                let json_layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_current_span(false)
                    .with_thread_names(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(writer)
                    .with_filter(filter);

                tracing_subscriber::registry()
                    .with(json_layer)
                    .try_init()
                    .context("Failed to install global tracing subscriber")?;

                Ok(guard)
            }
            LogTarget::Stderr => {
                let (writer, guard): (NonBlocking, WorkerGuard) =
                    tracing_appender::non_blocking(std::io::stderr());

                let fmt_layer = tracing_subscriber::fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_target(false)
                    .with_writer(writer)
                    .with_filter(filter);

                tracing_subscriber::registry()
                    .with(fmt_layer)
                    .try_init()
                    .context("Failed to install global tracing subscriber")?;

                Ok(guard)
            }
        }
    }
}

/// `RUST_LOG` directives plus the configured level.
fn make_filter(level: &str) -> Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive(Directive::from_str(level).context("Invalid log level in config")?))
}

fn validate_config(config: &LoggerConfig) -> Result<()> {
    if config.log_file_prefix.is_empty() {
        return Err(
            LoggingError::ConfigError("Log file prefix must not be empty".to_string()).into(),
        );
    }

    if config.max_log_files == 0 {
        return Err(
            LoggingError::ConfigError("Max log files must be greater than 0".to_string()).into(),
        );
    }

    validate_log_directory(&config.log_dir)?;
    Ok(())
}

fn validate_log_directory(path: &Path) -> Result<()> {
    if path.components().count() == 0 {
        return Err(LoggingError::InvalidLogDirectory("Empty path".to_string()).into());
    }

    if path.components().any(|c: Component<'_>| c == Component::ParentDir) {
        return Err(LoggingError::InvalidLogDirectory(
            "Path contains parent directory references".to_string(),
        )
        .into());
    }

    Ok(())
}

fn setup_log_directory(log_dir: &Path) -> Result<()> {
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir)
            .map_err(LoggingError::DirectoryCreationFailed)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }
    Ok(())
}
