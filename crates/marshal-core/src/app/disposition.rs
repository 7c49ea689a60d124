//! Disposition: what happens to a delivery after the dispatcher is done.
//!
//! Deciders are pure: given the delivery and the report they return the
//! next step. Applying it to the queue is the worker's job.

use std::time::Duration;

use super::dispatcher::DispatchReport;
use super::retry::RetryPolicy;
use crate::domain::Delivery;

#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Done with this message (success, or a failure retrying can't fix).
    Ack,

    /// Hand it back for another visit after `delay`.
    Release { delay: Duration, reason: String },

    /// Retryable, but out of visits. Removed like `Ack`, logged as a warning.
    Drop { reason: String },
}

pub trait DispositionPolicy: Send + Sync {
    fn decide(&self, delivery: &Delivery, report: &DispatchReport) -> Disposition;
}

/// Release retryable failures with exponential backoff until `max_visits`.
#[derive(Debug, Clone)]
pub struct DefaultDisposition {
    retry_policy: RetryPolicy,
    max_visits: u32,
}

impl DefaultDisposition {
    pub fn new(retry_policy: RetryPolicy, max_visits: u32) -> Self {
        Self {
            retry_policy,
            max_visits,
        }
    }
}

impl Default for DefaultDisposition {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), 5)
    }
}

impl DispositionPolicy for DefaultDisposition {
    fn decide(&self, delivery: &Delivery, report: &DispatchReport) -> Disposition {
        let Some(err) = report.failure() else {
            return Disposition::Ack;
        };
        if !err.is_retryable() {
            return Disposition::Ack;
        }
        if delivery.visits >= self.max_visits {
            return Disposition::Drop {
                reason: format!(
                    "giving up after {}/{} visits: {err}",
                    delivery.visits, self.max_visits
                ),
            };
        }
        let delay = self.retry_policy.next_delay(delivery.visits);
        Disposition::Release {
            delay,
            reason: format!(
                "visit {}/{} failed, retrying in {delay:?}: {err}",
                delivery.visits, self.max_visits
            ),
        }
    }
}
