//! Observability subsystem for mirrorctl
//!
//! Components never log through globals: every slot handle, backup
//! builder and walsender terminator is constructed with a [`Logger`].
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use mirrorctl::observability::{Event, Logger, MemoryLogSink, Severity};
//!
//! let sink = MemoryLogSink::new();
//! let logger = Logger::new(Arc::new(sink.clone()));
//! logger.info(Event::WalsenderKill, "killing existing walsender process on primary sdw1:6000");
//! assert_eq!(sink.count(Severity::Info), 1);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{JsonLogSink, LogRecord, LogSink, Logger, MemoryLogSink, Severity};
