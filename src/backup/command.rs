//! pg_basebackup command construction
//!
//! Slot resolution (pre-check and drop) happens once in [`PgBaseBackup::prepare`].
//! After that, token generation is a pure function of the prepared value.

use crate::observability::{Event, LogRecord, Logger, Severity};
use crate::slot::{SlotProvider, SlotResult};

use super::request::{BaseBackupRequest, WalMethod, DEFAULT_EXCLUDE_PATHS};

/// A base backup whose slot handling has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgBaseBackup {
    request: BaseBackupRequest,
    create_slot: bool,
}

impl PgBaseBackup {
    /// Resolve slot handling against the primary and return the command.
    ///
    /// When a slot name is set and `create_slot` is requested, an existing
    /// slot is dropped first. `--create-slot` is emitted only if the slot is
    /// gone afterwards: it was absent, or the drop succeeded. A refused drop
    /// leaves the slot in place and the backup streams through it.
    ///
    /// Connection failures during the pre-check or drop are returned.
    pub fn prepare(
        request: BaseBackupRequest,
        slots: &dyn SlotProvider,
        logger: &Logger,
    ) -> SlotResult<Self> {
        let create_slot = match request.slot_name() {
            Some(name) if request.create_slot => {
                let slot = slots.slot(&request.source_host, request.source_port, name);
                if slot.slot_exists()? {
                    slot.drop_slot()?
                } else {
                    true
                }
            }
            _ => false,
        };

        let backup = Self::from_resolved(request, create_slot);
        logger.log(
            LogRecord::new(
                Severity::Debug,
                Event::BackupCommandBuilt,
                format!("Base backup command: {}", backup.command_string()),
            )
            .with_field("host", &backup.request.source_host)
            .with_field("port", backup.request.source_port)
            .with_field("wal_method", backup.wal_method()),
        );
        Ok(backup)
    }

    /// Wrap a request whose slot handling was decided by the caller.
    ///
    /// `create_slot` has no effect without a slot name.
    pub fn from_resolved(request: BaseBackupRequest, create_slot: bool) -> Self {
        let create_slot = create_slot && request.slot_name().is_some();
        Self {
            request,
            create_slot,
        }
    }

    /// The underlying request.
    pub fn request(&self) -> &BaseBackupRequest {
        &self.request
    }

    /// Whether `--create-slot` will be emitted.
    pub fn creates_slot(&self) -> bool {
        self.create_slot
    }

    /// WAL method the command uses.
    pub fn wal_method(&self) -> WalMethod {
        self.request.effective_wal_method()
    }

    /// The argument vector, binary first.
    pub fn command_tokens(&self) -> Vec<String> {
        let request = &self.request;
        let mut tokens = vec![
            request.binary.display().to_string(),
            "-c".to_string(),
            "fast".to_string(),
            "-D".to_string(),
            request.target_datadir.clone(),
            "-h".to_string(),
            request.source_host.clone(),
            "-p".to_string(),
            request.source_port.to_string(),
        ];

        tokens.extend(self.wal_arguments());

        if request.force_overwrite {
            tokens.push("--force-overwrite".to_string());
        }
        if request.recovery_mode {
            tokens.push("--write-recovery-conf".to_string());
        }
        tokens.push("--target-gp-dbid".to_string());
        tokens.push(request.target_dbid.to_string());

        if request.progress_file.is_some() {
            tokens.push("--progress".to_string());
            tokens.push("--verbose".to_string());
        }

        if request.exclude_paths.is_empty() {
            for path in DEFAULT_EXCLUDE_PATHS {
                tokens.push("-E".to_string());
                tokens.push(path.to_string());
            }
        } else {
            for path in &request.exclude_paths {
                tokens.push("-E".to_string());
                tokens.push(path.clone());
            }
        }

        tokens.push("--no-verify-checksums".to_string());
        tokens
    }

    /// Shell form of the command, redirecting output to the progress file if set.
    pub fn command_string(&self) -> String {
        let mut command = self
            .command_tokens()
            .iter()
            .map(|token| shell_quote(token))
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(progress) = &self.request.progress_file {
            command.push_str(" > ");
            command.push_str(&shell_quote(&progress.display().to_string()));
            command.push_str(" 2>&1");
        }
        command
    }

    fn wal_arguments(&self) -> Vec<String> {
        let method = self.wal_method();
        let mut args = vec!["--wal-method".to_string(), method.as_str().to_string()];
        if let Some(name) = self.request.slot_name() {
            args.push("--slot".to_string());
            args.push(name.to_string());
            if self.create_slot {
                args.push("--create-slot".to_string());
            }
        }
        args
    }
}

/// Quote a token for a POSIX shell, leaving plain tokens untouched.
pub(crate) fn shell_quote(token: &str) -> String {
    let plain = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if plain {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', "'\"'\"'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MemoryLogSink;
    use crate::slot::{SlotError, SlotLifecycle};
    use crate::connector::ConnectorError;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    #[derive(Clone, Copy)]
    enum Answer {
        Yes,
        No,
        Unreachable,
    }

    impl Answer {
        fn resolve(self) -> SlotResult<bool> {
            match self {
                Answer::Yes => Ok(true),
                Answer::No => Ok(false),
                Answer::Unreachable => Err(SlotError::Drop {
                    host: "bar".into(),
                    port: 1234,
                    source: ConnectorError::connection("bar:1234", "refused"),
                }),
            }
        }
    }

    struct FakeSlot {
        exists: Answer,
        drop: Answer,
        calls: Rc<RefCell<Vec<&'static str>>>,
    }

    impl SlotLifecycle for FakeSlot {
        fn slot_exists(&self) -> SlotResult<bool> {
            self.calls.borrow_mut().push("exists");
            self.exists.resolve()
        }

        fn drop_slot(&self) -> SlotResult<bool> {
            self.calls.borrow_mut().push("drop");
            self.drop.resolve()
        }

        fn create_slot(&self) -> SlotResult<bool> {
            self.calls.borrow_mut().push("create");
            Ok(true)
        }
    }

    struct FakeProvider {
        exists: Answer,
        drop: Answer,
        calls: Rc<RefCell<Vec<&'static str>>>,
    }

    impl FakeProvider {
        fn new(exists: Answer, drop: Answer) -> Self {
            Self {
                exists,
                drop,
                calls: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    impl SlotProvider for FakeProvider {
        fn slot(&self, _host: &str, _port: u16, _slot_name: &str) -> Box<dyn SlotLifecycle> {
            Box::new(FakeSlot {
                exists: self.exists,
                drop: self.drop,
                calls: Rc::clone(&self.calls),
            })
        }
    }

    fn logger() -> Logger {
        Logger::new(Arc::new(MemoryLogSink::new()))
    }

    fn slot_request() -> BaseBackupRequest {
        BaseBackupRequest::new("foo", "bar", 1234)
            .with_replication_slot("some-replication-slot-name")
            .with_create_slot(true)
    }

    #[test]
    fn test_full_token_order_without_slot() {
        let backup = PgBaseBackup::from_resolved(BaseBackupRequest::new("foo", "bar", 1234), false);
        assert_eq!(
            backup.command_tokens(),
            vec![
                "pg_basebackup",
                "-c",
                "fast",
                "-D",
                "foo",
                "-h",
                "bar",
                "-p",
                "1234",
                "--wal-method",
                "fetch",
                "--write-recovery-conf",
                "--target-gp-dbid",
                "0",
                "-E",
                "./db_dumps",
                "-E",
                "./promote",
                "-E",
                "./db_analyze",
                "--no-verify-checksums",
            ]
        );
    }

    #[test]
    fn test_slot_tokens_follow_wal_method() {
        let provider = FakeProvider::new(Answer::Yes, Answer::Yes);
        let backup = PgBaseBackup::prepare(slot_request(), &provider, &logger()).unwrap();
        let tokens = backup.command_tokens();

        let at = tokens.iter().position(|t| t == "--wal-method").unwrap();
        assert_eq!(
            tokens[at..at + 5].to_vec(),
            vec![
                "--wal-method",
                "stream",
                "--slot",
                "some-replication-slot-name",
                "--create-slot"
            ]
        );
    }

    #[test]
    fn test_absent_slot_is_created_without_drop() {
        let provider = FakeProvider::new(Answer::No, Answer::No);
        let backup = PgBaseBackup::prepare(slot_request(), &provider, &logger()).unwrap();

        assert!(backup.creates_slot());
        assert_eq!(*provider.calls.borrow(), vec!["exists"]);
    }

    #[test]
    fn test_create_not_requested_skips_slot_lookup() {
        let provider = FakeProvider::new(Answer::Yes, Answer::Yes);
        let request = slot_request().with_create_slot(false);
        let backup = PgBaseBackup::prepare(request, &provider, &logger()).unwrap();

        assert!(!backup.creates_slot());
        assert!(provider.calls.borrow().is_empty());
        assert!(backup.command_tokens().contains(&"--slot".to_string()));
    }

    #[test]
    fn test_unreachable_primary_propagates() {
        let provider = FakeProvider::new(Answer::Yes, Answer::Unreachable);
        let err = PgBaseBackup::prepare(slot_request(), &provider, &logger()).unwrap_err();
        assert!(err.is_connection_failure());
    }

    #[test]
    fn test_from_resolved_ignores_create_without_slot() {
        let backup = PgBaseBackup::from_resolved(BaseBackupRequest::new("foo", "bar", 1234), true);
        assert!(!backup.creates_slot());
        assert!(!backup.command_tokens().contains(&"--create-slot".to_string()));
    }

    #[test]
    fn test_optional_flags() {
        let request = BaseBackupRequest::new("foo", "bar", 1234)
            .with_force_overwrite(true)
            .with_recovery_mode(false)
            .with_target_dbid(7)
            .with_progress_file("/tmp/progress.out")
            .with_exclude_path("./log");
        let tokens = PgBaseBackup::from_resolved(request, false).command_tokens();

        assert!(tokens.contains(&"--force-overwrite".to_string()));
        assert!(!tokens.contains(&"--write-recovery-conf".to_string()));
        assert!(tokens.contains(&"--progress".to_string()));
        assert!(tokens.contains(&"--verbose".to_string()));
        assert!(tokens.contains(&"./log".to_string()));
        assert!(!tokens.contains(&"./db_dumps".to_string()));

        let at = tokens.iter().position(|t| t == "--target-gp-dbid").unwrap();
        assert_eq!(tokens[at + 1], "7");
    }

    #[test]
    fn test_command_string_redirects_progress() {
        let request = BaseBackupRequest::new("/data/my mirror", "bar", 1234)
            .with_progress_file("/tmp/progress.out");
        let command = PgBaseBackup::from_resolved(request, false).command_string();

        assert!(command.starts_with("pg_basebackup -c fast -D '/data/my mirror' -h bar"));
        assert!(command.ends_with(" > /tmp/progress.out 2>&1"));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("plain-token_1.2"), "plain-token_1.2");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("it's"), "'it'\"'\"'s'");
    }
}
