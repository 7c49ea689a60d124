//! Ports - 外部コラボレータとの境界
//!
//! The dispatcher only talks to the outside world through these traits:
//! the application store, the provisioner, the log sink, the clock, and
//! (for the worker) the message queue.

pub mod app_store;
pub mod clock;
pub mod log_sink;
pub mod message_queue;
pub mod provisioner;

pub use self::app_store::{AppStore, StoreError};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::log_sink::LogSink;
pub use self::message_queue::{MessageLease, MessageQueue, QueueCounts, QueueError};
pub use self::provisioner::{ProvisionError, Provisioner};
