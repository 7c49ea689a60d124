//! Impls - in-process implementations of the ports.
//!
//! 開発用・テスト用。本番のストア／キュー／provisioner は別クレートで
//! ports の trait を実装する。

pub mod inmem_queue;
pub mod log_sinks;
pub mod memory_store;
pub mod provisioners;

pub use self::inmem_queue::InMemoryQueue;
pub use self::log_sinks::{MemoryLogSink, TracingLogSink};
pub use self::memory_store::InMemoryAppStore;
pub use self::provisioners::{ExecutedCommand, LoggingProvisioner, RecordingProvisioner};
