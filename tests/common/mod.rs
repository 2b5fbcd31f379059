//! Shared fakes for integration tests
//!
//! - `FakeConnector`: scripted SQL sessions, records every statement
//! - `FakeExecutor`: scripted remote commands, records every (host, command)

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use mirrorctl::connector::{
    Connection, ConnectionTarget, Connector, ConnectorError, ConnectorResult,
};
use mirrorctl::observability::{Logger, MemoryLogSink};
use mirrorctl::remote::{CommandResult, RemoteExecutor};

// =============================================================================
// Logging
// =============================================================================

pub fn memory_logger() -> (Logger, MemoryLogSink) {
    let sink = MemoryLogSink::new();
    (Logger::new(Arc::new(sink.clone())), sink)
}

// =============================================================================
// SQL sessions
// =============================================================================

/// Connector whose sessions answer from a fixed script.
#[derive(Default)]
pub struct FakeConnector {
    slot_count: i64,
    unreachable: bool,
    rejected: Vec<&'static str>,
    statements: Arc<Mutex<Vec<String>>>,
    targets: Mutex<Vec<ConnectionTarget>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existence queries return `count`.
    pub fn with_slot_count(mut self, count: i64) -> Self {
        self.slot_count = count;
        self
    }

    /// Every connect attempt fails.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Statements containing `fragment` are rejected by the server.
    pub fn rejecting(mut self, fragment: &'static str) -> Self {
        self.rejected.push(fragment);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub fn targets(&self) -> Vec<ConnectionTarget> {
        self.targets.lock().unwrap().clone()
    }
}

impl Connector for FakeConnector {
    fn connect(&self, target: &ConnectionTarget) -> ConnectorResult<Box<dyn Connection>> {
        self.targets.lock().unwrap().push(target.clone());
        if self.unreachable {
            return Err(ConnectorError::connection(
                target.address(),
                "could not connect to server: Connection refused",
            ));
        }
        Ok(Box::new(FakeConnection {
            slot_count: self.slot_count,
            rejected: self.rejected.clone(),
            statements: Arc::clone(&self.statements),
        }))
    }
}

struct FakeConnection {
    slot_count: i64,
    rejected: Vec<&'static str>,
    statements: Arc<Mutex<Vec<String>>>,
}

impl FakeConnection {
    fn record(&self, sql: &str) -> ConnectorResult<()> {
        self.statements.lock().unwrap().push(sql.to_string());
        match self.rejected.iter().find(|fragment| sql.contains(**fragment)) {
            Some(fragment) => Err(ConnectorError::statement_with_state(
                format!("ERROR: {} failed", fragment),
                "42704",
            )),
            None => Ok(()),
        }
    }
}

impl Connection for FakeConnection {
    fn query_singleton(&mut self, sql: &str) -> ConnectorResult<i64> {
        self.record(sql)?;
        Ok(self.slot_count)
    }

    fn query(&mut self, sql: &str) -> ConnectorResult<()> {
        self.record(sql)
    }
}

// =============================================================================
// Remote commands
// =============================================================================

/// Executor that fails or panics on chosen ports and records every call.
#[derive(Default)]
pub struct FakeExecutor {
    failing_ports: Vec<u16>,
    panicking_ports: Vec<u16>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, port: u16) -> Self {
        self.failing_ports.push(port);
        self
    }

    pub fn panicking_on(mut self, port: u16) -> Self {
        self.panicking_ports.push(port);
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl RemoteExecutor for FakeExecutor {
    fn execute(&self, host: &str, command: &str) -> CommandResult {
        self.calls
            .lock()
            .unwrap()
            .push((host.to_string(), command.to_string()));

        let targets = |ports: &[u16]| {
            ports
                .iter()
                .any(|port| command == mirrorctl::walsender::kill_walsender_command(*port))
        };
        if targets(&self.panicking_ports) {
            panic!("executor blew up");
        }
        let failing = targets(&self.failing_ports);
        if failing {
            CommandResult::exited(1, "", "ssh: connect to host: Connection refused")
        } else {
            CommandResult::exited(0, "", "")
        }
    }
}
