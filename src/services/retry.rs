use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::time::{interval_at, timeout_at, Instant, MissedTickBehavior};

/// Fixed-interval polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Total scheduled waiting across the whole budget.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }

    /// Run `attempt` up to `max_attempts` times, waiting one interval before
    /// each call. Stops at the first `Break`, returning its value; `None`
    /// means the budget ran out.
    ///
    /// Attempts are scheduled at fixed offsets from the start, so time spent
    /// inside an attempt does not push later attempts back. An attempt that
    /// is still running when the next one is due is abandoned and counts as
    /// `Continue`. Nothing runs past `start + budget()`: the last attempt is
    /// due at that deadline and only counts if it answers without waiting.
    pub async fn run<T, F, Fut>(&self, mut attempt: F) -> Option<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = ControlFlow<T>>,
    {
        let start = Instant::now();
        let deadline = start + self.budget();
        let mut ticks = interval_at(start + self.interval, self.interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for n in 1..=self.max_attempts {
            let due = ticks.tick().await;
            let cutoff = (due + self.interval).min(deadline);
            match timeout_at(cutoff, attempt(n)).await {
                Ok(ControlFlow::Break(value)) => return Some(value),
                Ok(ControlFlow::Continue(())) => {}
                Err(_) => {
                    tracing::warn!(attempt = n, "Attempt did not finish in its window, abandoning");
                }
            }
        }

        None
    }
}
