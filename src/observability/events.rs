//! Observability events for mirrorctl
//!
//! Every log line carries one of these codes so that downstream tooling can
//! filter without parsing message text.

use std::fmt;

/// Observable events during mirror provisioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    // Replication slots
    /// Slot existence check started or found the slot absent
    SlotExistsCheck,
    /// Slot drop attempted or completed
    SlotDrop,
    /// Slot drop rejected by the primary
    SlotDropFailed,
    /// Slot creation attempted or completed
    SlotCreate,
    /// Slot creation rejected by the primary
    SlotCreateFailed,

    // Base backup
    /// Backup command resolved
    BackupCommandBuilt,

    // Walsender cleanup
    /// Kill command dispatched for one primary
    WalsenderKill,
    /// Kill command failed for one primary
    WalsenderKillFailed,
    /// Walsender cleanup batch finished
    WalsenderBatchComplete,

    // Worker pool
    /// A work unit panicked inside a worker
    WorkerPanicked,

    // Configuration
    /// Configuration loaded
    ConfigLoaded,
}

impl Event {
    /// Returns the event name string
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SlotExistsCheck => "SLOT_EXISTS_CHECK",
            Event::SlotDrop => "SLOT_DROP",
            Event::SlotDropFailed => "SLOT_DROP_FAILED",
            Event::SlotCreate => "SLOT_CREATE",
            Event::SlotCreateFailed => "SLOT_CREATE_FAILED",
            Event::BackupCommandBuilt => "BACKUP_COMMAND_BUILT",
            Event::WalsenderKill => "WALSENDER_KILL",
            Event::WalsenderKillFailed => "WALSENDER_KILL_FAILED",
            Event::WalsenderBatchComplete => "WALSENDER_BATCH_COMPLETE",
            Event::WorkerPanicked => "WORKER_PANICKED",
            Event::ConfigLoaded => "CONFIG_LOADED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_screaming_snake_case() {
        let events = [
            Event::SlotExistsCheck,
            Event::SlotDrop,
            Event::SlotDropFailed,
            Event::SlotCreate,
            Event::SlotCreateFailed,
            Event::BackupCommandBuilt,
            Event::WalsenderKill,
            Event::WalsenderKillFailed,
            Event::WalsenderBatchComplete,
            Event::WorkerPanicked,
            Event::ConfigLoaded,
        ];
        for event in events {
            let name = event.as_str();
            assert!(name.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }
}
