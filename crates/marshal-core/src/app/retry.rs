//! Retry policy: decides how long a released message stays invisible.

use std::time::Duration;

use rand::Rng;

/// Exponential backoff for redelivered messages.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the second visit.
    pub base_delay: Duration,

    /// Backoff multiplier for exponential backoff.
    pub multiplier: f64,

    /// Upper bound of the random extra delay, as a fraction of the backoff.
    pub jitter: f64,
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, multiplier: f64) -> Self {
        Self {
            base_delay,
            multiplier,
            jitter: 0.1,
        }
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = 0.0;
        self
    }

    /// Backoff after the `visits`-th delivery (1-indexed), before jitter.
    ///
    /// base_delay * multiplier^(visits - 1); with base=2s, multiplier=2.0:
    /// 2s, 4s, 8s, 16s, ...
    pub fn backoff(&self, visits: u32) -> Duration {
        let exponent = visits.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    pub fn next_delay(&self, visits: u32) -> Duration {
        let backoff = self.backoff(visits);
        if self.jitter <= 0.0 {
            return backoff;
        }
        let extra = rand::thread_rng().gen_range(0.0..=self.jitter);
        backoff.saturating_add(backoff.mul_f64(extra))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 2.0)
    }
}
