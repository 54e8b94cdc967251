//! In-process loggers: discard or capture

use parking_lot::Mutex;

use super::traits::Logger;

/// A logger that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl NoOpLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for NoOpLogger {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Severity of a captured entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A logger that records entries in memory
///
/// Useful for asserting that a condition was reported.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured entries in order
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().clone()
    }

    /// Messages captured at `level`
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Whether any entry at `level` contains `needle`
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.entries.lock().push((level, message.to_string()));
    }
}

impl Logger for MemoryLogger {
    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}
