//! Human-readable progress events.
//!
//! The tracker reports progress as plain text lines through an
//! `EventSink`. The binary uses [`TracingSink`], which routes every line
//! through `tracing` so it reaches both stdout and the daily log file.

use std::sync::Mutex;
use tracing::info;

/// Destination for human-readable progress lines.
pub trait EventSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Emits each line as an `info` event on the `tierdraw::report` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, line: &str) {
        info!(target: "tierdraw::report", "{line}");
    }
}

/// Keeps every emitted line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Whether any emitted line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl EventSink for MemorySink {
    fn emit(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}
