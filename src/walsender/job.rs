//! One walsender kill job per primary

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::pool::WorkUnit;
use crate::remote::{CommandResult, RemoteExecutor};

/// Lifecycle of a kill job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Not yet run
    Pending,
    /// Command reported success
    Succeeded,
    /// Command reported failure, could not run, or panicked
    Failed,
}

impl JobState {
    /// Returns the state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "PENDING",
            JobState::Succeeded => "SUCCEEDED",
            JobState::Failed => "FAILED",
        }
    }

    /// True once the job has finished.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Pending)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shell command that SIGKILLs every walsender of the postmaster on `port`.
///
/// Succeeds when there is nothing to kill.
pub fn kill_walsender_command(port: u16) -> String {
    format!(
        "ps -eo pid=,args= | grep -E 'postgres: +{}, +walsender' | grep -v grep | awk '{{print $1}}' | xargs -r kill -9",
        port
    )
}

/// Kill command for one `(host, port)` primary.
pub struct WalsenderKillJob {
    id: Uuid,
    host: String,
    port: u16,
    command: String,
    state: JobState,
    result: Option<CommandResult>,
    executor: Arc<dyn RemoteExecutor>,
}

impl WalsenderKillJob {
    /// Pending job targeting `host:port`.
    pub fn new(host: impl Into<String>, port: u16, executor: Arc<dyn RemoteExecutor>) -> Self {
        Self {
            id: Uuid::new_v4(),
            host: host.into(),
            port,
            command: kill_walsender_command(port),
            state: JobState::Pending,
            result: None,
            executor,
        }
    }

    /// Job id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Target host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Target port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Remote command text.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Current state.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Result, once run.
    pub fn get_results(&self) -> Option<&CommandResult> {
        self.result.as_ref()
    }

    /// True iff the job finished and its command succeeded.
    pub fn was_successful(&self) -> bool {
        self.state == JobState::Succeeded
    }
}

impl WorkUnit for WalsenderKillJob {
    fn run(&mut self) {
        let result = self.executor.execute(&self.host, &self.command);
        self.state = if result.was_successful() {
            JobState::Succeeded
        } else {
            JobState::Failed
        };
        self.result = Some(result);
    }

    fn abandon(&mut self, reason: &str) {
        self.result = Some(CommandResult::halted(reason));
        self.state = JobState::Failed;
    }
}

impl fmt::Debug for WalsenderKillJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalsenderKillJob")
            .field("id", &self.id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("state", &self.state)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}
