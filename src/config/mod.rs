//! mirrorctl configuration
//!
//! Loaded from a JSON file; every field is optional and falls back to the
//! defaults below. Validation runs once at load time.
//!
//! ```json
//! {
//!   "batch_size": 16,
//!   "gphome": "/usr/local/greenplum-db",
//!   "database": "template1",
//!   "utility_mode": true,
//!   "connect_timeout_secs": 10,
//!   "ssh_options": ["StrictHostKeyChecking=no"],
//!   "replication_slot_name": "internal_wal_replication_slot",
//!   "log_level": "info"
//! }
//! ```

mod errors;

pub use errors::{ConfigError, ConfigResult};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backup::BaseBackupRequest;
use crate::connector::{ConnectionTarget, DEFAULT_DATABASE};
use crate::observability::Severity;
use crate::slot::validate_slot_name;

/// Default walsender cleanup concurrency.
pub const DEFAULT_BATCH_SIZE: usize = 16;

/// Largest accepted batch size.
pub const MAX_BATCH_SIZE: usize = 128;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Maximum concurrent remote commands
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Installation root; binaries are resolved under `<gphome>/bin`
    #[serde(default)]
    pub gphome: Option<PathBuf>,

    /// Database for catalog queries
    #[serde(default = "default_database")]
    pub database: String,

    /// Role for catalog queries
    #[serde(default)]
    pub user: Option<String>,

    /// Connect to primaries in utility mode
    #[serde(default = "default_utility_mode")]
    pub utility_mode: bool,

    /// Connect timeout for SQL sessions and ssh
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Extra `-o` options for ssh
    #[serde(default)]
    pub ssh_options: Vec<String>,

    /// Slot used by base backups when the command line names none
    #[serde(default)]
    pub replication_slot_name: Option<String>,

    /// Minimum log level: debug, info, warn or error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}
fn default_utility_mode() -> bool {
    true
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            gphome: None,
            database: default_database(),
            user: None,
            utility_mode: default_utility_mode(),
            connect_timeout_secs: default_connect_timeout_secs(),
            ssh_options: Vec::new(),
            replication_slot_name: None,
            log_level: default_log_level(),
        }
    }
}

impl MirrorConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration text.
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: MirrorConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field values.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::Invalid(format!(
                "batch_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }

        if self.database.is_empty() {
            return Err(ConfigError::Invalid("database must not be empty".to_string()));
        }

        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "connect_timeout_secs must be > 0".to_string(),
            ));
        }

        if Severity::parse(&self.log_level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "Invalid log_level: '{}'. Expected debug, info, warn or error.",
                self.log_level
            )));
        }

        if let Some(name) = &self.replication_slot_name {
            validate_slot_name(name).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }

        Ok(())
    }

    /// Parsed log level.
    pub fn severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Info)
    }

    /// Connect timeout as a duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Connection settings shared by every primary.
    pub fn connection_defaults(&self) -> ConnectionTarget {
        let mut target = ConnectionTarget::new("", 0)
            .with_database(self.database.clone())
            .with_utility_mode(self.utility_mode)
            .with_connect_timeout(self.connect_timeout());
        if let Some(user) = &self.user {
            target = target.with_user(user.clone());
        }
        target
    }

    /// Apply installation-wide settings to a backup request.
    pub fn apply_to_backup(&self, mut request: BaseBackupRequest) -> BaseBackupRequest {
        if let Some(gphome) = &self.gphome {
            request = request.with_gphome(gphome);
        }
        if request.slot_name().is_none() {
            if let Some(name) = &self.replication_slot_name {
                request = request.with_replication_slot(name.clone());
            }
        }
        request
    }
}
