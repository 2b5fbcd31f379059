//! Replication slot error types
//!
//! - Connection failures are always surfaced, wrapped with the operation and target
//! - Statement failures surface only from `slot_exists`; drop/create log and return `false`

use thiserror::Error;

use crate::connector::ConnectorError;

/// Result type for slot operations
pub type SlotResult<T> = Result<T, SlotError>;

/// Errors surfaced by [`ReplicationSlot`](super::ReplicationSlot) operations.
#[derive(Debug, Clone, Error)]
pub enum SlotError {
    /// Existence check could not reach the primary
    #[error("Failed to query pg_replication_slots for host:{host}, port:{port}: {source}")]
    ExistenceCheck {
        host: String,
        port: u16,
        #[source]
        source: ConnectorError,
    },

    /// Drop could not reach the primary
    #[error("Failed to drop replication slot for host:{host}, port:{port}: {source}")]
    Drop {
        host: String,
        port: u16,
        #[source]
        source: ConnectorError,
    },

    /// Create could not reach the primary
    #[error("Failed to create replication slot for host:{host}, port:{port}: {source}")]
    Create {
        host: String,
        port: u16,
        #[source]
        source: ConnectorError,
    },

    /// The existence query itself was rejected
    #[error(transparent)]
    Statement(ConnectorError),

    /// Slot name is not a legal PostgreSQL slot identifier
    #[error("Invalid replication slot name '{0}': expected 1-63 characters of [a-z0-9_]")]
    InvalidName(String),
}

impl SlotError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            SlotError::ExistenceCheck { .. } => "MIRROR_SLOT_EXISTS_UNREACHABLE",
            SlotError::Drop { .. } => "MIRROR_SLOT_DROP_UNREACHABLE",
            SlotError::Create { .. } => "MIRROR_SLOT_CREATE_UNREACHABLE",
            SlotError::Statement(_) => "MIRROR_SLOT_STATEMENT",
            SlotError::InvalidName(_) => "MIRROR_SLOT_INVALID_NAME",
        }
    }

    /// True when the primary could not be reached at all.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            SlotError::ExistenceCheck { .. } | SlotError::Drop { .. } | SlotError::Create { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failures_carry_fixed_prefix() {
        let source = ConnectorError::connection("bar:1234", "refused");

        let err = SlotError::Drop {
            host: "bar".into(),
            port: 1234,
            source: source.clone(),
        };
        assert!(err
            .to_string()
            .starts_with("Failed to drop replication slot for host:bar, port:1234"));
        assert!(err.is_connection_failure());

        let err = SlotError::ExistenceCheck {
            host: "bar".into(),
            port: 1234,
            source,
        };
        assert!(err.to_string().starts_with("Failed to query pg_replication_slots for"));
    }

    #[test]
    fn test_statement_is_not_connection_failure() {
        let err = SlotError::Statement(ConnectorError::statement("permission denied"));
        assert!(!err.is_connection_failure());
        assert_eq!(err.to_string(), "permission denied");
        assert_eq!(err.code(), "MIRROR_SLOT_STATEMENT");
    }
}
