//! Base backup command builder
//!
//! Produces the exact argument list that provisions a mirror data directory
//! with `pg_basebackup`.
//!
//! # WAL retrieval
//!
//! | slot name | outcome of slot resolution       | WAL tokens                                       |
//! |-----------|----------------------------------|--------------------------------------------------|
//! | none      | n/a                              | `--wal-method fetch`                             |
//! | given     | slot absent, or dropped          | `--wal-method stream --slot <name> --create-slot`|
//! | given     | drop refused, or no create asked | `--wal-method stream --slot <name>`              |
//!
//! The legacy `-x`/`--xlog` switch is never emitted: [`WalMethod`] cannot
//! express it.
//!
//! # Usage
//!
//! ```ignore
//! let request = BaseBackupRequest::new("/data/mirror/gpseg0", "sdw1", 6000)
//!     .with_replication_slot("internal_wal_replication_slot")
//!     .with_create_slot(true);
//! let backup = PgBaseBackup::prepare(request, &slot_manager, &logger)?;
//! let argv = backup.command_tokens();
//! ```

mod command;
mod request;

pub use command::PgBaseBackup;
pub use request::{BaseBackupRequest, WalMethod, DEFAULT_EXCLUDE_PATHS, PG_BASEBACKUP};
