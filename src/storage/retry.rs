//! Bounded exponential backoff for transient store failures.

use std::thread;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};
use crate::storage::config::StorageSettings;

/// Retry schedule for operations that hit a busy store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled after each failure
    pub base_delay: Duration,
    /// Upper bound on a single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self {
            max_attempts: settings.retry_attempts.max(1),
            base_delay: Duration::from_millis(settings.retry_base_delay_ms),
            ..Default::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Run `op`, retrying only [`EngineError::TransientStoreError`].
///
/// Conflicts and other errors are returned immediately. After the last
/// attempt the transient error is returned to the caller.
pub fn with_retry<T, F>(policy: &RetryPolicy, mut op: F) -> EngineResult<T>
where
    F: FnMut() -> EngineResult<T>,
{
    let mut attempt = 1;
    loop {
        match op() {
            Err(EngineError::TransientStoreError(msg)) if attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "Transient store error (attempt {}/{}), retrying in {:?}: {}",
                    attempt,
                    policy.max_attempts,
                    delay,
                    msg
                );
                thread::sleep(delay);
                attempt += 1;
            }
            result => return result,
        }
    }
}
