//! CLI argument definitions using clap
//!
//! Commands:
//! - mirrorctl backup-command --target-datadir <dir> --source-host <host> --source-port <port>
//! - mirrorctl kill-walsenders --primary <host:port>...
//! - mirrorctl slot <exists|drop|create> --host <host> --port <port> --slot <name>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::backup::WalMethod;

/// mirrorctl - mirror rebuild helpers for Greenplum segments
#[derive(Parser, Debug)]
#[command(name = "mirrorctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file; built-in defaults apply when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the pg_basebackup command for a mirror rebuild
    BackupCommand(BackupArgs),

    /// Kill walsenders left on primaries
    KillWalsenders {
        /// Primary as host:port; repeat for each primary
        #[arg(long = "primary", value_parser = parse_primary, required = true)]
        primaries: Vec<PrimaryAddr>,

        /// Maximum concurrent ssh sessions; defaults to the config batch_size
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Inspect or change a replication slot on one primary
    Slot {
        #[command(subcommand)]
        action: SlotAction,
    },
}

/// Base backup options
#[derive(clap::Args, Debug)]
pub struct BackupArgs {
    /// Mirror data directory to populate
    #[arg(long)]
    pub target_datadir: String,

    /// Primary host to copy from
    #[arg(long)]
    pub source_host: String,

    /// Primary port
    #[arg(long)]
    pub source_port: u16,

    /// Replication slot to stream through
    #[arg(long)]
    pub slot: Option<String>,

    /// Recreate the slot as part of the backup
    #[arg(long)]
    pub create_slot: bool,

    /// WAL method when no slot is used
    #[arg(long, value_parser = parse_wal_method)]
    pub wal_method: Option<WalMethod>,

    /// Overwrite a non-empty target directory
    #[arg(long)]
    pub force_overwrite: bool,

    /// Do not write recovery configuration
    #[arg(long)]
    pub no_recovery_conf: bool,

    /// dbid of the mirror being built
    #[arg(long, default_value_t = 0)]
    pub target_dbid: i32,

    /// Capture progress output into this file
    #[arg(long)]
    pub progress_file: Option<PathBuf>,

    /// Extra path to exclude; repeat as needed
    #[arg(long = "exclude")]
    pub excludes: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum SlotAction {
    /// Report whether the slot exists
    Exists(SlotArgs),
    /// Drop the slot
    Drop(SlotArgs),
    /// Create a physical slot
    Create(SlotArgs),
}

impl SlotAction {
    /// Action name for output.
    pub fn name(&self) -> &'static str {
        match self {
            SlotAction::Exists(_) => "exists",
            SlotAction::Drop(_) => "drop",
            SlotAction::Create(_) => "create",
        }
    }

    /// Shared arguments.
    pub fn args(&self) -> &SlotArgs {
        match self {
            SlotAction::Exists(args) | SlotAction::Drop(args) | SlotAction::Create(args) => args,
        }
    }
}

/// Slot location
#[derive(clap::Args, Debug)]
pub struct SlotArgs {
    /// Primary host
    #[arg(long)]
    pub host: String,

    /// Primary port
    #[arg(long)]
    pub port: u16,

    /// Slot name
    #[arg(long)]
    pub slot: String,
}

/// A `host:port` primary address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryAddr {
    pub host: String,
    pub port: u16,
}

/// Parse `host:port`. The port is taken after the last colon.
pub fn parse_primary(value: &str) -> Result<PrimaryAddr, String> {
    let (host, port) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected host:port, got '{}'", value))?;
    if host.is_empty() {
        return Err(format!("missing host in '{}'", value));
    }
    let port = port
        .parse::<u16>()
        .map_err(|e| format!("invalid port in '{}': {}", value, e))?;
    Ok(PrimaryAddr {
        host: host.to_string(),
        port,
    })
}

/// Parse `fetch` or `stream`.
pub fn parse_wal_method(value: &str) -> Result<WalMethod, String> {
    match value {
        "fetch" => Ok(WalMethod::Fetch),
        "stream" => Ok(WalMethod::Stream),
        other => Err(format!("expected fetch or stream, got '{}'", other)),
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
