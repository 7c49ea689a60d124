//! LogSink port - where classified failures are written.
//!
//! Injected into the dispatcher instead of a process-wide logger so that
//! callers (and tests) decide where the lines go.

pub trait LogSink: Send + Sync {
    /// Classified dispatch failures.
    fn error(&self, line: &str);

    /// Deliveries given up on after too many visits.
    fn warn(&self, line: &str);
}
