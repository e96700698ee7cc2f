//! Settle delays between navigation steps

use crate::config::TimingConfig;
use rand::Rng;
use std::time::Duration;

/// Fixed settle delay plus uniform random jitter
#[derive(Debug, Clone)]
pub struct Pacer {
    settle: Duration,
    jitter: Duration,
}

impl Pacer {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            settle: timing.settle(),
            jitter: timing.jitter(),
        }
    }

    /// Next delay, in `[settle, settle + jitter]`
    pub fn delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.settle;
        }
        self.settle + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }

    /// Sleeps for the next delay
    pub async fn settle(&self) {
        let delay = self.delay();
        if !delay.is_zero() {
            tracing::trace!(delay_ms = delay.as_millis() as u64, "Settling");
            tokio::time::sleep(delay).await;
        }
    }
}
