//! Base backup request
//!
//! Everything needed to provision one mirror data directory from a primary.
//! Built once per attempt and never mutated afterwards.

use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the backup binary.
pub const PG_BASEBACKUP: &str = "pg_basebackup";

/// Paths excluded from the copy when the caller supplies none.
pub const DEFAULT_EXCLUDE_PATHS: [&str; 3] = ["./db_dumps", "./promote", "./db_analyze"];

/// How the backup tool retrieves the WAL needed to make the copy consistent.
///
/// The legacy `-x`/`--xlog` switch has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalMethod {
    /// Collect WAL files at the end of the backup
    Fetch,
    /// Stream WAL over a second connection while the backup runs
    Stream,
}

impl WalMethod {
    /// Value passed to `--wal-method`.
    pub fn as_str(&self) -> &'static str {
        match self {
            WalMethod::Fetch => "fetch",
            WalMethod::Stream => "stream",
        }
    }
}

impl fmt::Display for WalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters of one base backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseBackupRequest {
    /// Mirror data directory to populate
    pub target_datadir: String,
    /// Primary host to copy from
    pub source_host: String,
    /// Primary port to copy from
    pub source_port: u16,
    /// Slot to stream through; empty is treated as absent
    pub replication_slot_name: Option<String>,
    /// Recreate the slot as part of the backup
    pub create_slot: bool,
    /// Forced WAL method when no slot is used
    pub wal_method: Option<WalMethod>,
    /// Path to the backup binary
    pub binary: PathBuf,
    /// Overwrite a non-empty target directory
    pub force_overwrite: bool,
    /// Write recovery configuration so the copy starts as a standby
    pub recovery_mode: bool,
    /// Database id the copy is stamped with
    pub target_dbid: i32,
    /// Redirect verbose progress output to this file
    pub progress_file: Option<PathBuf>,
    /// Paths excluded from the copy; defaults apply when empty
    pub exclude_paths: Vec<String>,
}

impl BaseBackupRequest {
    /// Request with defaults: no slot, recovery mode on, default exclusions.
    pub fn new(
        target_datadir: impl Into<String>,
        source_host: impl Into<String>,
        source_port: u16,
    ) -> Self {
        Self {
            target_datadir: target_datadir.into(),
            source_host: source_host.into(),
            source_port,
            replication_slot_name: None,
            create_slot: false,
            wal_method: None,
            binary: PathBuf::from(PG_BASEBACKUP),
            force_overwrite: false,
            recovery_mode: true,
            target_dbid: 0,
            progress_file: None,
            exclude_paths: Vec::new(),
        }
    }

    /// Stream through the named slot.
    pub fn with_replication_slot(mut self, name: impl Into<String>) -> Self {
        self.replication_slot_name = Some(name.into());
        self
    }

    /// Request slot recreation.
    pub fn with_create_slot(mut self, create_slot: bool) -> Self {
        self.create_slot = create_slot;
        self
    }

    /// Force a WAL method; ignored when a slot is set.
    pub fn with_wal_method(mut self, method: WalMethod) -> Self {
        self.wal_method = Some(method);
        self
    }

    /// Resolve the binary under `<gphome>/bin`.
    pub fn with_gphome(mut self, gphome: impl AsRef<Path>) -> Self {
        self.binary = gphome.as_ref().join("bin").join(PG_BASEBACKUP);
        self
    }

    /// Use an explicit binary path.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Overwrite a non-empty target directory.
    pub fn with_force_overwrite(mut self, force: bool) -> Self {
        self.force_overwrite = force;
        self
    }

    /// Toggle writing recovery configuration.
    pub fn with_recovery_mode(mut self, recovery_mode: bool) -> Self {
        self.recovery_mode = recovery_mode;
        self
    }

    /// Stamp the copy with a database id.
    pub fn with_target_dbid(mut self, dbid: i32) -> Self {
        self.target_dbid = dbid;
        self
    }

    /// Send progress output to a file.
    pub fn with_progress_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.progress_file = Some(path.into());
        self
    }

    /// Exclude a path from the copy.
    pub fn with_exclude_path(mut self, path: impl Into<String>) -> Self {
        self.exclude_paths.push(path.into());
        self
    }

    /// Slot name, with empty treated as absent.
    pub fn slot_name(&self) -> Option<&str> {
        self.replication_slot_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }

    /// Effective WAL method: `Stream` whenever a slot is set.
    pub fn effective_wal_method(&self) -> WalMethod {
        match self.slot_name() {
            Some(_) => WalMethod::Stream,
            None => self.wal_method.unwrap_or(WalMethod::Fetch),
        }
    }
}
