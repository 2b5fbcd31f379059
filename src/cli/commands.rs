//! CLI command implementations
//!
//! Each command loads the configuration, wires the real connector or ssh
//! executor, and writes one JSON response. The `*_response` functions take
//! their collaborators as trait objects so they run against fakes too.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::backup::{BaseBackupRequest, PgBaseBackup};
use crate::config::MirrorConfig;
use crate::connector::PgConnector;
use crate::observability::{Event, Logger};
use crate::remote::SshExecutor;
use crate::slot::{validate_slot_name, SlotManager, SlotProvider};
use crate::walsender::WalsenderTerminator;

use super::args::{BackupArgs, Command, PrimaryAddr, SlotAction};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    let result = run_command(cli.config.as_deref(), cli.command);
    if let Err(e) = &result {
        write_error(e.code_str(), &e.message())?;
    }
    result
}

/// Run the appropriate command based on CLI args
pub fn run_command(config_path: Option<&Path>, cmd: Command) -> CliResult<()> {
    let config = load_config(config_path)?;
    let logger = Logger::json(config.severity());
    if let Some(path) = config_path {
        logger.debug(
            Event::ConfigLoaded,
            format!("Loaded config from {}", path.display()),
        );
    }

    match cmd {
        Command::BackupCommand(args) => backup_command(&config, &logger, args),
        Command::KillWalsenders {
            primaries,
            batch_size,
        } => kill_walsenders(&config, &logger, &primaries, batch_size),
        Command::Slot { action } => slot(&config, &logger, &action),
    }
}

/// Load the config file, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> CliResult<MirrorConfig> {
    match path {
        Some(path) => Ok(MirrorConfig::load(path)?),
        None => Ok(MirrorConfig::default()),
    }
}

fn slot_manager(config: &MirrorConfig, logger: &Logger) -> SlotManager {
    SlotManager::new(Arc::new(PgConnector::new()), logger.clone())
        .with_connection_defaults(config.connection_defaults())
}

/// Resolve slot handling and print the pg_basebackup command.
pub fn backup_command(config: &MirrorConfig, logger: &Logger, args: BackupArgs) -> CliResult<()> {
    let slots = slot_manager(config, logger);
    write_response(backup_response(config, logger, &slots, args)?)
}

/// Build the backup command description.
pub fn backup_response(
    config: &MirrorConfig,
    logger: &Logger,
    slots: &dyn SlotProvider,
    args: BackupArgs,
) -> CliResult<Value> {
    let request = backup_request(config, args)?;
    let backup = PgBaseBackup::prepare(request, slots, logger)?;

    Ok(json!({
        "command": backup.command_string(),
        "tokens": backup.command_tokens(),
        "wal_method": backup.wal_method().as_str(),
        "create_slot": backup.creates_slot(),
    }))
}

fn backup_request(config: &MirrorConfig, args: BackupArgs) -> CliResult<BaseBackupRequest> {
    let mut request =
        BaseBackupRequest::new(args.target_datadir, args.source_host, args.source_port)
            .with_create_slot(args.create_slot)
            .with_force_overwrite(args.force_overwrite)
            .with_recovery_mode(!args.no_recovery_conf)
            .with_target_dbid(args.target_dbid);

    if let Some(slot) = args.slot {
        validate_slot_name(&slot)?;
        request = request.with_replication_slot(slot);
    }
    if let Some(method) = args.wal_method {
        request = request.with_wal_method(method);
    }
    if let Some(path) = args.progress_file {
        request = request.with_progress_file(path);
    }
    for path in args.excludes {
        request = request.with_exclude_path(path);
    }

    Ok(config.apply_to_backup(request))
}

/// Run one slot action against a primary.
pub fn slot(config: &MirrorConfig, logger: &Logger, action: &SlotAction) -> CliResult<()> {
    let slots = slot_manager(config, logger);
    write_response(slot_response(&slots, action)?)
}

/// Execute a slot action and describe its result.
pub fn slot_response(slots: &dyn SlotProvider, action: &SlotAction) -> CliResult<Value> {
    let args = action.args();
    validate_slot_name(&args.slot)?;

    let slot = slots.slot(&args.host, args.port, &args.slot);
    let result = match action {
        SlotAction::Exists(_) => slot.slot_exists()?,
        SlotAction::Drop(_) => slot.drop_slot()?,
        SlotAction::Create(_) => slot.create_slot()?,
    };

    Ok(json!({
        "host": args.host,
        "port": args.port,
        "slot": args.slot,
        "action": action.name(),
        "result": result,
    }))
}

/// Kill stale walsenders over ssh.
pub fn kill_walsenders(
    config: &MirrorConfig,
    logger: &Logger,
    primaries: &[PrimaryAddr],
    batch_size: Option<usize>,
) -> CliResult<()> {
    let batch_size = batch_size.unwrap_or(config.batch_size);
    if batch_size == 0 {
        return Err(CliError::invalid_argument("batch size must be > 0"));
    }

    let executor = SshExecutor::new(config.connect_timeout())
        .with_options(config.ssh_options.iter().cloned());
    let terminator = WalsenderTerminator::new(Arc::new(executor), logger.clone());
    write_response(kill_response(&terminator, primaries, batch_size))
}

/// Run the cleanup pass and describe each job.
pub fn kill_response(
    terminator: &WalsenderTerminator,
    primaries: &[PrimaryAddr],
    batch_size: usize,
) -> Value {
    let pairs: Vec<(&str, u16)> = primaries
        .iter()
        .map(|p| (p.host.as_str(), p.port))
        .collect();
    let report = terminator.kill_existing_walsenders(&pairs, batch_size);

    let jobs: Vec<Value> = report
        .jobs
        .iter()
        .map(|job| {
            json!({
                "id": job.id().to_string(),
                "host": job.host(),
                "port": job.port(),
                "state": job.state().as_str(),
                "detail": job
                    .get_results()
                    .filter(|result| !result.was_successful())
                    .map(|result| result.failure_summary()),
            })
        })
        .collect();

    json!({
        "workers": report.workers,
        "all_succeeded": report.all_succeeded(),
        "jobs": jobs,
    })
}
