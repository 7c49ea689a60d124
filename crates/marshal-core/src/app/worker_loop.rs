//! WorkerGroup - lease → dispatch → decide → ack/release
//!
//! - `shutdown_tx` に true を送ると新しい lease を取らなくなる
//! - 実行中の dispatch は中断しない
//! - queue のエラーはログに出してループを続ける

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::dispatcher::Dispatcher;
use super::disposition::{DefaultDisposition, Disposition, DispositionPolicy};
use super::retry::RetryPolicy;
use crate::ports::{MessageLease, MessageQueue};

/// Worker group handle.
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    /// Spawn `n` workers sharing one dispatcher, with the default
    /// release-until-`max_visits` policy.
    pub fn spawn(
        n: usize,
        queue: Arc<dyn MessageQueue>,
        dispatcher: Arc<Dispatcher>,
        retry_policy: RetryPolicy,
        max_visits: u32,
    ) -> Self {
        let policy = Arc::new(DefaultDisposition::new(retry_policy, max_visits));
        Self::spawn_with_policy(n, queue, dispatcher, policy)
    }

    pub fn spawn_with_policy(
        n: usize,
        queue: Arc<dyn MessageQueue>,
        dispatcher: Arc<Dispatcher>,
        policy: Arc<dyn DispositionPolicy>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let worker = Worker {
                id: worker_id,
                queue: Arc::clone(&queue),
                dispatcher: Arc::clone(&dispatcher),
                policy: Arc::clone(&policy),
            };
            let mut rx = shutdown_rx.clone();
            joins.push(tokio::spawn(async move { worker.run(&mut rx).await }));
        }

        tracing::info!(workers = n, "worker group started");
        Self { shutdown_tx, joins }
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Stop taking new leases. In-flight dispatches run to completion.
    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            if let Err(e) = join.await {
                tracing::error!(error = %e, "worker task panicked");
            }
        }
        tracing::info!("worker group stopped");
    }
}

struct Worker {
    id: usize,
    queue: Arc<dyn MessageQueue>,
    dispatcher: Arc<Dispatcher>,
    policy: Arc<dyn DispositionPolicy>,
}

impl Worker {
    async fn run(&self, shutdown_rx: &mut watch::Receiver<bool>) {
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            // lease は待つので shutdown と競合させる
            let lease = tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                lease = self.queue.lease() => lease,
            };

            let Some(lease) = lease else {
                tokio::task::yield_now().await;
                continue;
            };

            self.process(lease).await;
        }
        tracing::debug!(worker = self.id, "worker stopped");
    }

    async fn process(&self, lease: Box<dyn MessageLease>) {
        let delivery = lease.delivery().clone();
        let report = self.dispatcher.handle(&delivery.message).await;

        let (id, worker) = (delivery.id, self.id);
        let result = match self.policy.decide(&delivery, &report) {
            Disposition::Ack => lease.ack().await,
            Disposition::Release { delay, reason } => {
                tracing::info!(worker, message_id = %id, ?delay, "{reason}");
                lease.release(delay).await
            }
            Disposition::Drop { reason } => {
                let line = format!(
                    "Dropping message {id} ({:?}): {reason}",
                    delivery.message.action().as_str()
                );
                self.dispatcher.log_sink().warn(&line);
                lease.ack().await
            }
        };

        if let Err(e) = result {
            tracing::error!(worker, message_id = %id, error = %e, "failed to settle message");
        }
    }
}
