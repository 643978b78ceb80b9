//! Structured logging setup.
//!
//! The store emits `tracing` events and never installs a subscriber on its
//! own. Embedders that want output call [`enable_logging`] once at startup.

use std::env;
use std::fs::{File, OpenOptions};
use std::io;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const TRACE_ENV: &str = "OPTSTORE_TRACE";
pub const LOG_FORMAT_ENV: &str = "OPTSTORE_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "OPTSTORE_LOG_FILE";

/// Errors raised while installing the subscriber
#[derive(Debug)]
pub enum LoggingError {
    /// `OPTSTORE_LOG_FORMAT` is neither `pretty` nor `json`
    InvalidFormat(String),
    /// Filter directive could not be parsed
    InvalidFilter(String),
    /// `OPTSTORE_LOG_FILE` could not be opened for appending
    LogFile(io::Error),
    /// Subscriber installation failed
    Init(String),
}

impl LoggingError {
    pub fn code(&self) -> &'static str {
        match self {
            LoggingError::InvalidFormat(_) => "LOG_FORMAT_INVALID",
            LoggingError::InvalidFilter(_) => "LOG_FILTER_INVALID",
            LoggingError::LogFile(_) => "LOG_FILE_UNAVAILABLE",
            LoggingError::Init(_) => "LOG_INIT_FAILED",
        }
    }
}

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggingError::InvalidFormat(format) => write!(
                f,
                "[{}] invalid {LOG_FORMAT_ENV} '{format}' (expected 'json' or 'pretty')",
                self.code()
            ),
            LoggingError::InvalidFilter(err) => {
                write!(f, "[{}] invalid log filter: {err}", self.code())
            }
            LoggingError::LogFile(err) => {
                write!(f, "[{}] failed to open log file: {err}", self.code())
            }
            LoggingError::Init(err) => {
                write!(f, "[{}] failed to initialize logging: {err}", self.code())
            }
        }
    }
}

impl std::error::Error for LoggingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoggingError::LogFile(err) => Some(err),
            _ => None,
        }
    }
}

/// Output layout for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Parse a format name, ignoring ASCII case.
    pub fn parse(value: &str) -> Result<Self, LoggingError> {
        if value.eq_ignore_ascii_case("pretty") {
            Ok(LogFormat::Pretty)
        } else if value.eq_ignore_ascii_case("json") {
            Ok(LogFormat::Json)
        } else {
            Err(LoggingError::InvalidFormat(value.to_string()))
        }
    }

    fn from_env() -> Result<Self, LoggingError> {
        match env::var(LOG_FORMAT_ENV) {
            Ok(value) => Self::parse(&value),
            Err(_) => Ok(LogFormat::default()),
        }
    }
}

fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if level.eq_ignore_ascii_case("off") {
        Ok(EnvFilter::default().add_directive(LevelFilter::OFF.into()))
    } else {
        EnvFilter::try_new(level).map_err(|err| LoggingError::InvalidFilter(err.to_string()))
    }
}

fn open_log_file(path: &str) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(LoggingError::LogFile)
}

fn map_init_err<E: std::fmt::Display>(err: E) -> LoggingError {
    LoggingError::Init(err.to_string())
}

/// Enable structured logging for optstore.
///
/// When `level` is None, this reads `OPTSTORE_TRACE` if set. If
/// `OPTSTORE_TRACE` is unset, the default level is `off`. Returns `Ok(true)`
/// when logging is initialized, `Ok(false)` if a subscriber is already
/// configured.
pub fn enable_logging(level: Option<&str>) -> Result<bool, LoggingError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }

    let level_value = level
        .map(str::to_string)
        .or_else(|| env::var(TRACE_ENV).ok())
        .unwrap_or_else(|| "off".to_string());
    let filter = build_filter(&level_value)?;
    let format = LogFormat::from_env()?;
    let log_file = env::var(LOG_FILE_ENV).ok();

    match format {
        LogFormat::Json => {
            let stderr_layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .json();
            let base = tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer);
            if let Some(path) = log_file {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(open_log_file(&path)?)
                    .with_ansi(false)
                    .json();
                base.with(file_layer).try_init().map_err(map_init_err)?;
            } else {
                base.try_init().map_err(map_init_err)?;
            }
        }
        LogFormat::Pretty => {
            let stderr_layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .pretty();
            let base = tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer);
            if let Some(path) = log_file {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(open_log_file(&path)?)
                    .with_ansi(false)
                    .pretty();
                base.with(file_layer).try_init().map_err(map_init_err)?;
            } else {
                base.try_init().map_err(map_init_err)?;
            }
        }
    }

    tracing::debug!(
        component = "logging",
        operation = "enable_logging",
        status = "success",
        level = %level_value,
        format = ?format,
        "Logging initialized"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names_are_case_insensitive() {
        assert_eq!(LogFormat::parse("JSON").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty").unwrap(), LogFormat::Pretty);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = LogFormat::parse("xml").unwrap_err();
        assert_eq!(err.code(), "LOG_FORMAT_INVALID");
        assert!(err.to_string().contains("'xml'"));
    }

    #[test]
    fn off_and_directives_build_filters() {
        assert!(build_filter("off").is_ok());
        assert!(build_filter("OFF").is_ok());
        assert!(build_filter("optstore_core=debug").is_ok());
        assert!(matches!(
            build_filter("optstore_core=loud"),
            Err(LoggingError::InvalidFilter(_))
        ));
    }
}
