//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero status. Display is
//! `CODE: detail`, which is what main prints to stderr.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::slot::SlotError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    /// Config file missing, unreadable or invalid
    #[error("MIRROR_CLI_CONFIG_ERROR: {0} ({code})", code = .0.code())]
    Config(#[from] ConfigError),

    /// Writing the response failed
    #[error("MIRROR_CLI_IO_ERROR: {0}")]
    Io(#[from] io::Error),

    /// Serializing the response failed
    #[error("MIRROR_CLI_IO_ERROR: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Argument rejected after parsing
    #[error("MIRROR_CLI_INVALID_ARGUMENT: {0}")]
    InvalidArgument(String),

    /// Slot operation could not complete
    #[error("MIRROR_CLI_SLOT_ERROR: {0} ({code})", code = .0.code())]
    Slot(SlotError),
}

impl CliError {
    /// Invalid argument
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        CliError::InvalidArgument(msg.into())
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        match self {
            CliError::Config(_) => "MIRROR_CLI_CONFIG_ERROR",
            CliError::Io(_) | CliError::Json(_) => "MIRROR_CLI_IO_ERROR",
            CliError::InvalidArgument(_) => "MIRROR_CLI_INVALID_ARGUMENT",
            CliError::Slot(_) => "MIRROR_CLI_SLOT_ERROR",
        }
    }

    /// Error text without the code prefix
    pub fn message(&self) -> String {
        let full = self.to_string();
        match full.split_once(": ") {
            Some((_, detail)) => detail.to_string(),
            None => full,
        }
    }
}

impl From<SlotError> for CliError {
    fn from(e: SlotError) -> Self {
        match e {
            SlotError::InvalidName(_) => CliError::InvalidArgument(e.to_string()),
            other => CliError::Slot(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::ConnectorError;

    #[test]
    fn test_display_carries_code() {
        let err = CliError::invalid_argument("bad port");
        assert_eq!(err.to_string(), "MIRROR_CLI_INVALID_ARGUMENT: bad port");
        assert_eq!(err.message(), "bad port");
    }

    #[test]
    fn test_invalid_slot_name_is_argument_error() {
        let err: CliError = SlotError::InvalidName("Bad".to_string()).into();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    #[test]
    fn test_unreachable_slot_keeps_slot_code() {
        let err: CliError = SlotError::Drop {
            host: "sdw1".to_string(),
            port: 20000,
            source: ConnectorError::connection("sdw1:20000", "refused"),
        }
        .into();
        assert_eq!(err.code_str(), "MIRROR_CLI_SLOT_ERROR");
        assert!(err.to_string().ends_with("(MIRROR_SLOT_DROP_UNREACHABLE)"));
    }

    #[test]
    fn test_config_error_maps_to_config_code() {
        let err: CliError = ConfigError::Invalid("batch_size".to_string()).into();
        assert_eq!(err.code_str(), "MIRROR_CLI_CONFIG_ERROR");
        assert!(err.message().contains("MIRROR_CONFIG_INVALID"));
    }
}
