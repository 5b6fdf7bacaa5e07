//! Error types for Shipo

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShipoError>;

#[derive(Error, Debug)]
pub enum ShipoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Daily post limit of {limit} reached. Try again tomorrow!")]
    LimitReached { platform: String, limit: u64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ShipoError {
    /// Returns the process exit code for this error
    ///
    /// Every failure is terminal for the run and maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            ShipoError::Config(_)
            | ShipoError::Platform(_)
            | ShipoError::LimitReached { .. }
            | ShipoError::InvalidInput(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found; please create {} with your handle, password, and limit", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("invalid config line: {0}")]
    MalformedLine(String),

    #[error("'{0}' not found in the config file")]
    MissingField(String),

    #[error("'{0}' must not be empty in the config file")]
    EmptyField(String),

    #[error("'limit' must be a non-negative integer (got '{0}')")]
    InvalidLimit(String),
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}
