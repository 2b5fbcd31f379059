//! CLI module for mirrorctl
//!
//! Provides command-line interface for:
//! - backup-command: resolve slot handling and print the pg_basebackup command
//! - kill-walsenders: terminate stale walsenders on primaries over ssh
//! - slot: check, drop or create a replication slot

mod args;
mod commands;
mod errors;
mod io;

pub use args::{parse_primary, BackupArgs, Cli, Command, PrimaryAddr, SlotAction, SlotArgs};
pub use commands::{
    backup_command, backup_response, kill_response, kill_walsenders, load_config, run,
    run_command, slot, slot_response,
};
pub use errors::{CliError, CliResult};
pub use io::{write_error, write_response, write_response_to};
