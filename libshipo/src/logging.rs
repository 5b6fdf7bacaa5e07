//! Logging setup for the shipo binary
//!
//! Logs always go to stderr so stdout stays reserved for post results.
//!
//! # Examples
//!
//! ```no_run
//! use libshipo::logging::{LoggingConfig, LogFormat};
//!
//! // JSON logs at debug level
//! LoggingConfig::new(LogFormat::Json, "debug".to_string(), false).init();
//!
//! // Or respect SHIPO_LOG_FORMAT / SHIPO_LOG_LEVEL
//! libshipo::logging::init_from_env(false);
//! ```

use std::str::FromStr;

pub const LOG_FORMAT_ENV: &str = "SHIPO_LOG_FORMAT";
pub const LOG_LEVEL_ENV: &str = "SHIPO_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text output (no colors, for piping)
    Text,
    /// Machine-parseable JSON (one JSON object per line)
    Json,
    /// Pretty-printed with colors (for development)
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Configuration for logging initialization
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub verbose: bool,
}

impl LoggingConfig {
    /// Create a new logging configuration
    ///
    /// # Arguments
    ///
    /// * `format` - Log output format (text, json, or pretty)
    /// * `level` - Minimum log level (error, warn, info, debug, trace)
    /// * `verbose` - If true, forces debug level
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
        }
    }

    /// Filter directive used for this configuration
    ///
    /// `RUST_LOG` still wins when set.
    pub fn directive(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.level
        }
    }

    /// Initialize logging with the configured settings
    ///
    /// Call once at startup; a second call is ignored.
    pub fn init(&self) {
        use tracing_subscriber::EnvFilter;

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directive()));

        let result = match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .flatten_event(true)
                .with_target(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .without_time()
                .try_init(),
        };

        if let Err(e) = result {
            eprintln!("Logging already initialized: {}", e);
        }
    }
}

/// Build a configuration from `SHIPO_LOG_FORMAT` and `SHIPO_LOG_LEVEL`
///
/// Falls back to text format at info level.
pub fn config_from_env(verbose: bool) -> LoggingConfig {
    let format = std::env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(LogFormat::Text);

    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());

    LoggingConfig::new(format, level, verbose)
}

/// Initialize logging from the environment
pub fn init_from_env(verbose: bool) {
    config_from_env(verbose).init();
}
