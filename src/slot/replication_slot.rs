//! Physical replication slot handle
//!
//! A `ReplicationSlot` holds no state about the slot itself. Every call
//! opens a fresh session against the primary and inspects or changes the
//! `pg_replication_slots` catalog there.

use std::sync::Arc;

use crate::connector::{quote_literal, ConnectionTarget, ConnectorError, Connector};
use crate::observability::{Event, Logger};

use super::errors::{SlotError, SlotResult};
use super::SlotLifecycle;

/// Handle onto one named slot on one primary.
#[derive(Clone)]
pub struct ReplicationSlot {
    target: ConnectionTarget,
    slot_name: String,
    connector: Arc<dyn Connector>,
    logger: Logger,
}

impl ReplicationSlot {
    /// Bind a handle to `(host, port, slot_name)` with default connection settings.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        slot_name: impl Into<String>,
        connector: Arc<dyn Connector>,
        logger: Logger,
    ) -> Self {
        Self::with_target(ConnectionTarget::new(host, port), slot_name, connector, logger)
    }

    /// Bind a handle using a fully specified connection target.
    pub fn with_target(
        target: ConnectionTarget,
        slot_name: impl Into<String>,
        connector: Arc<dyn Connector>,
        logger: Logger,
    ) -> Self {
        Self {
            target,
            slot_name: slot_name.into(),
            connector,
            logger,
        }
    }

    /// Primary host.
    pub fn host(&self) -> &str {
        &self.target.host
    }

    /// Primary port.
    pub fn port(&self) -> u16 {
        self.target.port
    }

    /// Slot name.
    pub fn slot_name(&self) -> &str {
        &self.slot_name
    }

    /// Returns true iff the catalog holds a row for this slot.
    ///
    /// Connection failures are wrapped in [`SlotError::ExistenceCheck`];
    /// a rejected query is returned as [`SlotError::Statement`].
    pub fn slot_exists(&self) -> SlotResult<bool> {
        self.logger.debug(
            Event::SlotExistsCheck,
            format!(
                "Checking if slot {} exists for host:{}, port:{}",
                self.slot_name,
                self.host(),
                self.port()
            ),
        );

        let sql = format!(
            "SELECT count(*) FROM pg_catalog.pg_replication_slots WHERE slot_name = {}",
            quote_literal(&self.slot_name)
        );

        let count = self
            .connector
            .connect(&self.target)
            .and_then(|mut conn| conn.query_singleton(&sql))
            .map_err(|e| match e {
                ConnectorError::Connection { .. } => SlotError::ExistenceCheck {
                    host: self.host().to_string(),
                    port: self.port(),
                    source: e,
                },
                ConnectorError::Statement { .. } => SlotError::Statement(e),
            })?;

        if count == 0 {
            self.logger.debug(
                Event::SlotExistsCheck,
                format!(
                    "Slot {} does not exist for host:{}, port:{}",
                    self.slot_name,
                    self.host(),
                    self.port()
                ),
            );
            return Ok(false);
        }

        Ok(true)
    }

    /// Drop the slot on the primary.
    ///
    /// Returns `Ok(false)` when the primary rejects the statement (for
    /// example the slot is absent or still active). Failing to reach the
    /// primary is returned as [`SlotError::Drop`].
    pub fn drop_slot(&self) -> SlotResult<bool> {
        self.logger.debug(
            Event::SlotDrop,
            format!(
                "Dropping slot {} for host:{}, port:{}",
                self.slot_name,
                self.host(),
                self.port()
            ),
        );

        let sql = format!(
            "SELECT pg_catalog.pg_drop_replication_slot({})",
            quote_literal(&self.slot_name)
        );

        match self.execute(&sql) {
            Ok(()) => {
                self.logger.debug(
                    Event::SlotDrop,
                    format!(
                        "Successfully dropped replication slot {} for host:{}, port:{}",
                        self.slot_name,
                        self.host(),
                        self.port()
                    ),
                );
                Ok(true)
            }
            Err(e @ ConnectorError::Statement { .. }) => {
                self.logger.exception(
                    Event::SlotDropFailed,
                    format!(
                        "Failed to query pg_drop_replication_slot for host:{}, port:{}: {}",
                        self.host(),
                        self.port(),
                        e
                    ),
                    &e,
                );
                Ok(false)
            }
            Err(e) => Err(SlotError::Drop {
                host: self.host().to_string(),
                port: self.port(),
                source: e,
            }),
        }
    }

    /// Create the slot on the primary as a physical slot.
    ///
    /// Returns `Ok(false)` when the primary rejects the statement (for
    /// example the slot already exists). Failing to reach the primary is
    /// returned as [`SlotError::Create`].
    pub fn create_slot(&self) -> SlotResult<bool> {
        self.logger.debug(
            Event::SlotCreate,
            format!(
                "Creating slot {} for host:{}, port:{}",
                self.slot_name,
                self.host(),
                self.port()
            ),
        );

        let sql = format!(
            "SELECT pg_catalog.pg_create_physical_replication_slot({})",
            quote_literal(&self.slot_name)
        );

        match self.execute(&sql) {
            Ok(()) => {
                self.logger.debug(
                    Event::SlotCreate,
                    format!(
                        "Successfully created replication slot {} for host:{}, port:{}",
                        self.slot_name,
                        self.host(),
                        self.port()
                    ),
                );
                Ok(true)
            }
            Err(e @ ConnectorError::Statement { .. }) => {
                self.logger.exception(
                    Event::SlotCreateFailed,
                    format!(
                        "Failed to query pg_create_physical_replication_slot for host:{}, port:{}: {}",
                        self.host(),
                        self.port(),
                        e
                    ),
                    &e,
                );
                Ok(false)
            }
            Err(e) => Err(SlotError::Create {
                host: self.host().to_string(),
                port: self.port(),
                source: e,
            }),
        }
    }

    fn execute(&self, sql: &str) -> Result<(), ConnectorError> {
        let mut conn = self.connector.connect(&self.target)?;
        conn.query(sql)
    }
}

impl SlotLifecycle for ReplicationSlot {
    fn slot_exists(&self) -> SlotResult<bool> {
        ReplicationSlot::slot_exists(self)
    }

    fn drop_slot(&self) -> SlotResult<bool> {
        ReplicationSlot::drop_slot(self)
    }

    fn create_slot(&self) -> SlotResult<bool> {
        ReplicationSlot::create_slot(self)
    }
}

impl std::fmt::Debug for ReplicationSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationSlot")
            .field("target", &self.target)
            .field("slot_name", &self.slot_name)
            .finish_non_exhaustive()
    }
}
