//! Configuration error types

use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors. All are fatal to the command being run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid JSON for the expected schema
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field has an unacceptable value
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "MIRROR_CONFIG_READ",
            ConfigError::Parse(_) => "MIRROR_CONFIG_PARSE",
            ConfigError::Invalid(_) => "MIRROR_CONFIG_INVALID",
        }
    }
}
