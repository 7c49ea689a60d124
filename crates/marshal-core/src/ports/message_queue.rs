//! MessageQueue port - action message transport.
//!
//! At-least-once: a released message comes back. Whether a lease that is
//! dropped without `ack`/`release` ever expires is up to the implementation;
//! `InMemoryQueue` keeps it leased.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{ActionMessage, Delivery, MessageId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("message {0} is not leased")]
    NotLeased(MessageId),

    #[error("queue operation failed: {0}")]
    OperationFailed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub ready: usize,
    pub leased: usize,
    pub delayed: usize,
    pub acked: usize,
}

/// A leased message. The worker owns it and must `ack` or `release` it.
#[async_trait]
pub trait MessageLease: Send {
    fn delivery(&self) -> &Delivery;

    /// Remove the message for good.
    async fn ack(self: Box<Self>) -> Result<(), QueueError>;

    /// Hand the message back; it becomes visible again after `delay`.
    async fn release(self: Box<Self>, delay: Duration) -> Result<(), QueueError>;
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn enqueue(&self, message: ActionMessage) -> Result<MessageId, QueueError>;

    /// Waits until a message is available.
    async fn lease(&self) -> Option<Box<dyn MessageLease>>;

    async fn counts(&self) -> Result<QueueCounts, QueueError>;
}
