//! Remote command execution
//!
//! - [`RemoteExecutor`] runs a shell command on a named host
//! - The outcome is always a [`CommandResult`]; executors never return errors,
//!   an unreachable host or a missing `ssh` binary is a failed result
//! - Timeouts are the executor's concern (`ConnectTimeout` for ssh)

mod ssh;

pub use ssh::SshExecutor;

use std::fmt;

/// Outcome of one remote command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandResult {
    /// Exit status; `None` if the process was killed or never started
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// The command never ran to completion (spawn failure, worker panic)
    pub halted: bool,
}

impl CommandResult {
    /// Result of a process that exited with `code`.
    pub fn exited(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
            halted: false,
        }
    }

    /// Result of a command that could not be run at all.
    pub fn halted(reason: impl Into<String>) -> Self {
        Self {
            exit_code: None,
            stdout: String::new(),
            stderr: reason.into(),
            halted: true,
        }
    }

    /// Zero exit status and not halted.
    pub fn was_successful(&self) -> bool {
        !self.halted && self.exit_code == Some(0)
    }

    /// Short description of a failure for log lines.
    pub fn failure_summary(&self) -> String {
        let stderr = self.stderr.trim();
        match (self.exit_code, stderr.is_empty()) {
            (_, false) => stderr.to_string(),
            (Some(code), true) => format!("exit status {}", code),
            (None, true) => "terminated without exit status".to_string(),
        }
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "rc={}", code)?,
            None => write!(f, "rc=none")?,
        }
        write!(f, ", halted={}, stdout='{}', stderr='{}'", self.halted, self.stdout.trim(), self.stderr.trim())
    }
}

/// Runs commands on remote hosts.
pub trait RemoteExecutor: Send + Sync {
    /// Run `command` on `host` and wait for it.
    fn execute(&self, host: &str, command: &str) -> CommandResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_predicate() {
        assert!(CommandResult::exited(0, "", "").was_successful());
        assert!(!CommandResult::exited(1, "", "error").was_successful());
        assert!(!CommandResult::halted("ssh: not found").was_successful());
    }

    #[test]
    fn test_failure_summary_prefers_stderr() {
        assert_eq!(CommandResult::exited(1, "", "error\n").failure_summary(), "error");
        assert_eq!(CommandResult::exited(255, "", "").failure_summary(), "exit status 255");
        assert_eq!(
            CommandResult::default().failure_summary(),
            "terminated without exit status"
        );
    }

    #[test]
    fn test_display() {
        let result = CommandResult::exited(1, "out\n", "err\n");
        assert_eq!(result.to_string(), "rc=1, halted=false, stdout='out', stderr='err'");
    }
}
