// ── Run log ──
//
// The orchestrator and collector report per-device progress and failures
// through an injected `RunLog` instead of a process-wide logger. The
// binary plugs in `TracingLog`; tests use `MemoryLog` and assert on the
// captured lines.

use std::sync::{Mutex, PoisonError};

use tracing::{error, info};

/// Sink for run-level progress and failure messages.
pub trait RunLog: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to `tracing` under the `panfleet::run` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl RunLog for TracingLog {
    fn info(&self, message: &str) {
        info!(target: "panfleet::run", "{message}");
    }

    fn error(&self, message: &str) {
        error!(target: "panfleet::run", "{message}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<LogLine>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages logged at error level, in order.
    pub fn errors(&self) -> Vec<String> {
        self.messages(LogLevel::Error)
    }

    /// Messages logged at info level, in order.
    pub fn infos(&self) -> Vec<String> {
        self.messages(LogLevel::Info)
    }

    fn messages(&self, level: LogLevel) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|line| line.level == level)
            .map(|line| line.message.clone())
            .collect()
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogLine {
                level,
                message: message.to_owned(),
            });
    }
}

impl RunLog for MemoryLog {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_log_keeps_order_and_level() {
        let log = MemoryLog::new();
        log.info("one");
        log.error("two");
        log.info("three");

        assert_eq!(log.infos(), ["one", "three"]);
        assert_eq!(log.errors(), ["two"]);
        assert_eq!(log.lines().len(), 3);
        assert_eq!(log.lines()[1].level, LogLevel::Error);
    }
}
