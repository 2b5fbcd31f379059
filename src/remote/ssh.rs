//! ssh-based executor

use std::process::{Command, Stdio};
use std::time::Duration;

use super::{CommandResult, RemoteExecutor};

/// Runs commands through the system `ssh` client in batch mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshExecutor {
    program: String,
    connect_timeout: Duration,
    extra_options: Vec<String>,
}

impl SshExecutor {
    /// Executor using `ssh` from `PATH`.
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            program: "ssh".to_string(),
            connect_timeout,
            extra_options: Vec::new(),
        }
    }

    /// Add `-o` options, e.g. `StrictHostKeyChecking=no`.
    pub fn with_options(mut self, options: impl IntoIterator<Item = String>) -> Self {
        self.extra_options.extend(options);
        self
    }

    /// Use a different client binary.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Full argument list passed to the client.
    pub fn arguments(&self, host: &str, command: &str) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
        ];
        for option in &self.extra_options {
            args.push("-o".to_string());
            args.push(option.clone());
        }
        args.push(host.to_string());
        args.push(command.to_string());
        args
    }
}

impl Default for SshExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl RemoteExecutor for SshExecutor {
    fn execute(&self, host: &str, command: &str) -> CommandResult {
        let output = Command::new(&self.program)
            .args(self.arguments(host, command))
            .stdin(Stdio::null())
            .output();

        match output {
            Ok(output) => CommandResult {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                halted: false,
            },
            Err(e) => CommandResult::halted(format!("failed to run {}: {}", self.program, e)),
        }
    }
}
