//! Structured JSON logger for mirrorctl
//!
//! - One log line = one event
//! - `event` first, then `severity`, then fields in key order
//! - Synchronous, no buffering
//! - Sinks are injected; nothing here is global

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};

use super::events::Event;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Operation traces
    Debug = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures, including caught exceptions
    Error = 3,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }

    /// Parse a configured level name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "debug" => Some(Severity::Debug),
            "info" => Some(Severity::Info),
            "warn" | "warning" => Some(Severity::Warn),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity of the entry.
    pub severity: Severity,
    /// Event code.
    pub event: Event,
    /// Human-readable message.
    pub message: String,
    /// Structured context fields.
    pub fields: Vec<(String, String)>,
}

impl LogRecord {
    /// Create a record without fields.
    pub fn new(severity: Severity, event: Event, message: impl Into<String>) -> Self {
        Self {
            severity,
            event,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Attach a context field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((key.into(), value.to_string()));
        self
    }

    /// Look up a field value by key.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render as a single JSON line (without trailing newline).
    pub fn to_json_line(&self, timestamp: &str) -> String {
        let mut output = String::with_capacity(256);

        output.push('{');

        output.push_str("\"event\":\"");
        escape_json_string(&mut output, self.event.as_str());
        output.push('"');

        output.push_str(",\"severity\":\"");
        output.push_str(self.severity.as_str());
        output.push('"');

        let mut sorted: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        sorted.push(("message", self.message.as_str()));
        sorted.push(("ts", timestamp));
        sorted.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted {
            output.push_str(",\"");
            escape_json_string(&mut output, key);
            output.push_str("\":\"");
            escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push('}');
        output
    }
}

/// Escape special characters for JSON strings
fn escape_json_string(output: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c.is_control() => {
                output.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => output.push(c),
        }
    }
}

/// Destination for log records.
///
/// Implementations must tolerate concurrent calls from pool workers.
pub trait LogSink: Send + Sync {
    /// Emit one record. Logging failures are swallowed by the sink.
    fn emit(&self, record: LogRecord);
}

/// Writes JSON lines to stderr, leaving stdout to command output.
#[derive(Debug, Clone, Copy)]
pub struct JsonLogSink {
    min_severity: Severity,
}

impl JsonLogSink {
    /// Create a sink that drops records below `min_severity`.
    pub fn new(min_severity: Severity) -> Self {
        Self { min_severity }
    }

    fn write_to<W: Write>(record: &LogRecord, writer: &mut W) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut line = record.to_json_line(&timestamp);
        line.push('\n');

        // Write atomically (one syscall)
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }
}

impl Default for JsonLogSink {
    fn default() -> Self {
        Self::new(Severity::Info)
    }
}

impl LogSink for JsonLogSink {
    fn emit(&self, record: LogRecord) {
        if record.severity < self.min_severity {
            return;
        }
        Self::write_to(&record, &mut io::stderr());
    }
}

/// In-memory sink for tests and embedding callers.
#[derive(Debug, Default, Clone)]
pub struct MemoryLogSink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemoryLogSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in emission order.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Messages of records at exactly `severity`, in emission order.
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|r| r.severity == severity)
            .map(|r| r.message.clone())
            .collect()
    }

    /// Number of records at exactly `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.lock().iter().filter(|r| r.severity == severity).count()
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        // A poisoned sink still holds valid records.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LogSink for MemoryLogSink {
    fn emit(&self, record: LogRecord) {
        self.lock().push(record);
    }
}

/// Cloneable handle components log through.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
}

impl Logger {
    /// Wrap a sink.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// JSON logger on stderr at the given level.
    pub fn json(min_severity: Severity) -> Self {
        Self::new(Arc::new(JsonLogSink::new(min_severity)))
    }

    /// Emit a prepared record.
    pub fn log(&self, record: LogRecord) {
        self.sink.emit(record);
    }

    /// Log at DEBUG level
    pub fn debug(&self, event: Event, message: impl Into<String>) {
        self.log(LogRecord::new(Severity::Debug, event, message));
    }

    /// Log at INFO level
    pub fn info(&self, event: Event, message: impl Into<String>) {
        self.log(LogRecord::new(Severity::Info, event, message));
    }

    /// Log at WARN level
    pub fn warn(&self, event: Event, message: impl Into<String>) {
        self.log(LogRecord::new(Severity::Warn, event, message));
    }

    /// Log a caught error at ERROR level, keeping the error chain as a field.
    pub fn exception(
        &self,
        event: Event,
        message: impl Into<String>,
        error: &dyn std::error::Error,
    ) {
        let mut chain = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push_str(": ");
            chain.push_str(&cause.to_string());
            source = cause.source();
        }
        self.log(LogRecord::new(Severity::Error, event, message).with_field("error", chain));
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}
