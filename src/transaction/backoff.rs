use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;

/// Randomized exponential backoff between transaction attempts.
///
/// The wait for attempt `n` (0-based count of failures so far) is drawn
/// uniformly from `[0, min(cap, base * 2^n))` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base_ms: u64,
    cap_ms: u64,
}

impl BackoffPolicy {
    pub const DEFAULT_BASE_MS: u64 = 1;
    pub const DEFAULT_CAP_MS: u64 = 100;

    pub fn new(base_ms: u64, cap_ms: u64) -> Self {
        Self { base_ms, cap_ms }
    }

    pub fn base_ms(&self) -> u64 {
        self.base_ms
    }

    pub fn cap_ms(&self) -> u64 {
        self.cap_ms
    }

    /// Exclusive upper bound of the wait for `attempt`, in milliseconds
    pub fn upper_bound_ms(&self, attempt: u32) -> u64 {
        let factor = 2u64.saturating_pow(attempt);
        self.base_ms.saturating_mul(factor).min(self.cap_ms)
    }

    /// Draw a wait for `attempt` without sleeping
    pub fn delay(&self, attempt: u32) -> Duration {
        let upper = self.upper_bound_ms(attempt);
        if upper == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..upper))
    }

    /// Sleep for a freshly drawn wait; returns the time actually spent
    pub async fn backoff(&self, attempt: u32) -> Duration {
        let wait = self.delay(attempt);
        let started = Instant::now();
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        started.elapsed()
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_MS, Self::DEFAULT_CAP_MS)
    }
}
