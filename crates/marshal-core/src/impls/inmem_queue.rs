//! InMemoryQueue - 開発用のメッセージキュー
//!
//! - ready: 今すぐ lease できる message id
//! - delayed: release された message（visible_at の早い順）
//! - records: message 本体と visit 数の正本

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::domain::{ActionMessage, Delivery, MessageId};
use crate::ports::{MessageLease, MessageQueue, QueueCounts, QueueError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageState {
    Ready,
    Leased,
    Delayed,
}

#[derive(Debug, Clone)]
struct MessageRecord {
    message: ActionMessage,
    visits: u32,
    state: MessageState,
}

/// Heap entry; reversed so `BinaryHeap` pops the earliest first.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DelayedMessage {
    visible_at: Instant,
    id: MessageId,
}

impl PartialOrd for DelayedMessage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayedMessage {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .visible_at
            .cmp(&self.visible_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

#[derive(Default)]
struct QueueState {
    records: HashMap<MessageId, MessageRecord>,
    ready: VecDeque<MessageId>,
    delayed: BinaryHeap<DelayedMessage>,
    acked: usize,
}

impl QueueState {
    fn promote_delayed(&mut self) {
        let now = Instant::now();
        while let Some(entry) = self.delayed.peek() {
            if entry.visible_at > now {
                break;
            }
            let Some(entry) = self.delayed.pop() else {
                break;
            };
            if let Some(record) = self.records.get_mut(&entry.id)
                && record.state == MessageState::Delayed
            {
                record.state = MessageState::Ready;
                self.ready.push_back(entry.id);
            }
        }
    }

    fn counts(&self) -> QueueCounts {
        let mut counts = QueueCounts {
            acked: self.acked,
            ..QueueCounts::default()
        };
        for record in self.records.values() {
            match record.state {
                MessageState::Ready => counts.ready += 1,
                MessageState::Leased => counts.leased += 1,
                MessageState::Delayed => counts.delayed += 1,
            }
        }
        counts
    }
}

/// Process-local queue with lease / ack / release semantics.
#[derive(Clone, Default)]
pub struct InMemoryQueue {
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn enqueue(&self, message: ActionMessage) -> Result<MessageId, QueueError> {
        let id = MessageId::generate();
        {
            let mut state = self.state.lock().await;
            state.records.insert(
                id,
                MessageRecord {
                    message,
                    visits: 0,
                    state: MessageState::Ready,
                },
            );
            state.ready.push_back(id);
        }
        self.notify.notify_one();
        Ok(id)
    }

    async fn lease(&self) -> Option<Box<dyn MessageLease>> {
        loop {
            let next_wake = {
                let mut state = self.state.lock().await;
                state.promote_delayed();

                while let Some(id) = state.ready.pop_front() {
                    let Some(record) = state.records.get_mut(&id) else {
                        continue;
                    };
                    record.state = MessageState::Leased;
                    record.visits += 1;
                    let delivery = Delivery {
                        id,
                        message: record.message.clone(),
                        visits: record.visits,
                    };
                    return Some(Box::new(InMemoryLease {
                        delivery,
                        queue: self.clone(),
                    }));
                }

                state.delayed.peek().map(|entry| entry.visible_at)
            };

            // 何もなければ push か次の visible_at まで待つ
            match next_wake {
                Some(wake_at) => {
                    tokio::select! {
                        _ = self.notify.notified() => {},
                        _ = tokio::time::sleep_until(wake_at) => {},
                    }
                }
                None => self.notify.notified().await,
            }
        }
    }

    async fn counts(&self) -> Result<QueueCounts, QueueError> {
        Ok(self.state.lock().await.counts())
    }
}

struct InMemoryLease {
    delivery: Delivery,
    queue: InMemoryQueue,
}

#[async_trait]
impl MessageLease for InMemoryLease {
    fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    async fn ack(self: Box<Self>) -> Result<(), QueueError> {
        let mut state = self.queue.state.lock().await;
        let leased = state
            .records
            .get(&self.delivery.id)
            .is_some_and(|record| record.state == MessageState::Leased);
        if !leased {
            return Err(QueueError::NotLeased(self.delivery.id));
        }
        state.records.remove(&self.delivery.id);
        state.acked += 1;
        Ok(())
    }

    async fn release(self: Box<Self>, delay: Duration) -> Result<(), QueueError> {
        {
            let mut state = self.queue.state.lock().await;
            let Some(record) = state.records.get_mut(&self.delivery.id) else {
                return Err(QueueError::NotLeased(self.delivery.id));
            };
            if record.state != MessageState::Leased {
                return Err(QueueError::NotLeased(self.delivery.id));
            }
            if delay.is_zero() {
                record.state = MessageState::Ready;
                state.ready.push_back(self.delivery.id);
            } else {
                record.state = MessageState::Delayed;
                let visible_at = Instant::now()
                    .checked_add(delay)
                    .unwrap_or_else(|| Instant::now() + Duration::from_secs(86_400 * 365));
                state.delayed.push(DelayedMessage {
                    visible_at,
                    id: self.delivery.id,
                });
            }
        }
        // ロック解放後に通知
        self.queue.notify.notify_one();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(app: &str) -> ActionMessage {
        ActionMessage::new("start-app", [app])
    }

    async fn lease_now(queue: &InMemoryQueue) -> Box<dyn MessageLease> {
        tokio::time::timeout(Duration::from_millis(200), queue.lease())
            .await
            .expect("lease timed out")
            .expect("queue closed")
    }

    #[tokio::test]
    async fn enqueue_and_counts() {
        let queue = InMemoryQueue::new();
        queue.enqueue(msg("nemesis")).await.unwrap();

        let counts = queue.counts().await.unwrap();
        assert_eq!(counts.ready, 1);
        assert_eq!(counts.leased, 0);
    }

    #[tokio::test]
    async fn lease_is_fifo_and_counts_visits() {
        let queue = InMemoryQueue::new();
        let first = queue.enqueue(msg("a")).await.unwrap();
        queue.enqueue(msg("b")).await.unwrap();

        let lease = lease_now(&queue).await;
        assert_eq!(lease.delivery().id, first);
        assert_eq!(lease.delivery().visits, 1);
        assert_eq!(lease.delivery().message.app_name(), Some("a"));

        let counts = queue.counts().await.unwrap();
        assert_eq!(counts.ready, 1);
        assert_eq!(counts.leased, 1);
    }

    #[tokio::test]
    async fn ack_removes_message() {
        let queue = InMemoryQueue::new();
        queue.enqueue(msg("nemesis")).await.unwrap();
        lease_now(&queue).await.ack().await.unwrap();

        let counts = queue.counts().await.unwrap();
        assert_eq!(counts, QueueCounts { acked: 1, ..QueueCounts::default() });
    }

    #[tokio::test]
    async fn released_message_comes_back_with_more_visits() {
        let queue = InMemoryQueue::new();
        let id = queue.enqueue(msg("nemesis")).await.unwrap();

        lease_now(&queue).await.release(Duration::ZERO).await.unwrap();
        let lease = lease_now(&queue).await;

        assert_eq!(lease.delivery().id, id);
        assert_eq!(lease.delivery().visits, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_message_waits_for_its_delay() {
        let queue = InMemoryQueue::new();
        queue.enqueue(msg("nemesis")).await.unwrap();
        lease_now(&queue).await.release(Duration::from_secs(2)).await.unwrap();

        assert_eq!(queue.counts().await.unwrap().delayed, 1);
        let early = tokio::time::timeout(Duration::from_secs(1), queue.lease()).await;
        assert!(early.is_err());

        let lease = tokio::time::timeout(Duration::from_secs(5), queue.lease())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lease.delivery().visits, 2);
    }

    #[tokio::test]
    async fn dropped_lease_stays_leased() {
        let queue = InMemoryQueue::new();
        queue.enqueue(msg("nemesis")).await.unwrap();
        drop(lease_now(&queue).await);

        let counts = queue.counts().await.unwrap();
        assert_eq!(counts, QueueCounts { leased: 1, ..QueueCounts::default() });
        let again = tokio::time::timeout(Duration::from_millis(50), queue.lease()).await;
        assert!(again.is_err());
    }

    #[tokio::test]
    async fn enqueue_wakes_waiting_lease() {
        let queue = InMemoryQueue::new();
        let waiter = tokio::spawn({
            let queue = queue.clone();
            async move { queue.lease().await.map(|l| l.delivery().message.clone()) }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        queue.enqueue(msg("nemesis")).await.unwrap();

        let leased = waiter.await.unwrap();
        assert_eq!(leased, Some(msg("nemesis")));
    }
}
