//! Replication Slot Manager
//!
//! Physical replication slots pin WAL on a primary until a standby has
//! consumed it. This module inspects, creates and drops them remotely:
//! - `slot_exists` surfaces every failure to the caller
//! - `drop_slot`/`create_slot` surface only connection failures; a rejected
//!   statement is logged and reported as `Ok(false)`
//!
//! [`SlotManager`] binds a connector, a logger and connection defaults, and
//! hands out [`ReplicationSlot`] handles.

mod errors;
mod replication_slot;

use std::sync::Arc;

pub use errors::{SlotError, SlotResult};
pub use replication_slot::ReplicationSlot;

use crate::connector::{ConnectionTarget, Connector};
use crate::observability::Logger;

/// Longest slot name PostgreSQL accepts (NAMEDATALEN - 1).
pub const MAX_SLOT_NAME_LEN: usize = 63;

/// Operations on one slot, as seen by callers that only need the lifecycle.
pub trait SlotLifecycle {
    /// True iff the slot exists on the primary.
    fn slot_exists(&self) -> SlotResult<bool>;
    /// Drop the slot; `Ok(false)` if the primary refused.
    fn drop_slot(&self) -> SlotResult<bool>;
    /// Create the slot; `Ok(false)` if the primary refused.
    fn create_slot(&self) -> SlotResult<bool>;
}

/// Produces slot handles for `(host, port, slot_name)`.
pub trait SlotProvider {
    /// Bind a handle.
    fn slot(&self, host: &str, port: u16, slot_name: &str) -> Box<dyn SlotLifecycle>;
}

/// Shared connector, logger and connection defaults for slot handles.
#[derive(Clone)]
pub struct SlotManager {
    connector: Arc<dyn Connector>,
    logger: Logger,
    template: ConnectionTarget,
}

impl SlotManager {
    /// Manager using default connection settings.
    pub fn new(connector: Arc<dyn Connector>, logger: Logger) -> Self {
        Self {
            connector,
            logger,
            template: ConnectionTarget::new("", 0),
        }
    }

    /// Use `template` for every field except host and port.
    pub fn with_connection_defaults(mut self, template: ConnectionTarget) -> Self {
        self.template = template;
        self
    }

    /// Bind a concrete handle.
    pub fn replication_slot(&self, host: &str, port: u16, slot_name: &str) -> ReplicationSlot {
        let target = ConnectionTarget {
            host: host.to_string(),
            port,
            ..self.template.clone()
        };
        ReplicationSlot::with_target(
            target,
            slot_name,
            Arc::clone(&self.connector),
            self.logger.clone(),
        )
    }
}

impl SlotProvider for SlotManager {
    fn slot(&self, host: &str, port: u16, slot_name: &str) -> Box<dyn SlotLifecycle> {
        Box::new(self.replication_slot(host, port, slot_name))
    }
}

impl std::fmt::Debug for SlotManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotManager")
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

/// Check a slot name against PostgreSQL's rules.
pub fn validate_slot_name(name: &str) -> SlotResult<()> {
    let legal = !name.is_empty()
        && name.len() <= MAX_SLOT_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if legal {
        Ok(())
    } else {
        Err(SlotError::InvalidName(name.to_string()))
    }
}
