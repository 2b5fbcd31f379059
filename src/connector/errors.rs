//! Connector error types
//!
//! Two kinds only, and callers branch on them:
//! - `Connection`: the primary could not be reached or the session died
//! - `Statement`: the primary answered and rejected the statement

use thiserror::Error;

/// Result type for connector operations
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Errors raised by a [`Connector`](super::Connector) or [`Connection`](super::Connection).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    /// Host unreachable, authentication failure, or connection lost mid-statement
    #[error("connection to {target} failed: {message}")]
    Connection {
        /// `host:port` of the target
        target: String,
        /// Underlying driver message
        message: String,
    },

    /// The server rejected or failed the statement
    #[error("{message}")]
    Statement {
        /// Server error message
        message: String,
        /// SQLSTATE code, when the server supplied one
        sqlstate: Option<String>,
    },
}

impl ConnectorError {
    /// Create a connection error.
    pub fn connection(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a statement error without SQLSTATE.
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement {
            message: message.into(),
            sqlstate: None,
        }
    }

    /// Create a statement error carrying a SQLSTATE code.
    pub fn statement_with_state(message: impl Into<String>, sqlstate: impl Into<String>) -> Self {
        Self::Statement {
            message: message.into(),
            sqlstate: Some(sqlstate.into()),
        }
    }

    /// True for connection-layer failures.
    pub fn is_connection(&self) -> bool {
        matches!(self, ConnectorError::Connection { .. })
    }

    /// True for statement-layer failures.
    pub fn is_statement(&self) -> bool {
        matches!(self, ConnectorError::Statement { .. })
    }

    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ConnectorError::Connection { .. } => "MIRROR_CONNECTOR_CONNECTION",
            ConnectorError::Statement { .. } => "MIRROR_CONNECTOR_STATEMENT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinguishable() {
        let conn = ConnectorError::connection("sdw1:5432", "refused");
        let stmt = ConnectorError::statement("replication slot \"s1\" already exists");

        assert!(conn.is_connection());
        assert!(!conn.is_statement());
        assert!(stmt.is_statement());
        assert!(!stmt.is_connection());
        assert_ne!(conn.code(), stmt.code());
    }

    #[test]
    fn test_statement_display_is_server_message() {
        let err = ConnectorError::statement_with_state("slot busy", "55006");
        assert_eq!(err.to_string(), "slot busy");
    }

    #[test]
    fn test_connection_display_names_target() {
        let err = ConnectorError::connection("bar:1234", "timed out");
        assert_eq!(err.to_string(), "connection to bar:1234 failed: timed out");
    }
}
