//! LogSink implementations.

use std::sync::{Mutex, PoisonError};

use crate::ports::LogSink;

/// Forwards lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn error(&self, line: &str) {
        tracing::error!("{line}");
    }

    fn warn(&self, line: &str) {
        tracing::warn!("{line}");
    }
}

/// Keeps every line in memory, in write order.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

impl LogSink for MemoryLogSink {
    fn error(&self, line: &str) {
        self.push(line);
    }

    fn warn(&self, line: &str) {
        self.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemoryLogSink::new();
        sink.error("first");
        sink.warn("second");
        assert_eq!(sink.lines(), vec!["first", "second"]);
    }

    #[test]
    fn tracing_sink_does_not_panic_without_subscriber() {
        TracingLogSink.error("Error handling \"start-app\": invalid action.");
    }
}
