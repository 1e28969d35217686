use crate::utils::cancel::Cancellation;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 有上限的重試設定 (次數 + 指數退避)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
}

fn default_multiplier() -> u32 {
    2
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts,
            backoff_ms: backoff.as_millis() as u64,
            multiplier: default_multiplier(),
        }
    }

    /// Delay slept before `attempt` (1-based); the first attempt runs immediately.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = self.multiplier.max(1).saturating_pow(attempt - 2) as u64;
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }
}

/// Drives a bounded retry loop without owning the retried operation:
///
/// ```ignore
/// let mut retry = BoundedRetry::new(policy);
/// while let Some(attempt) = retry.next_attempt(&cancel, "token").await? {
///     if let Some(value) = try_once().await? {
///         return Ok(value);
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BoundedRetry {
    policy: RetryPolicy,
    attempt: u32,
}

impl BoundedRetry {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    pub async fn next_attempt(&mut self, cancel: &Cancellation, stage: &str) -> Result<Option<u32>> {
        if self.attempt >= self.policy.attempts {
            return Ok(None);
        }

        let next = self.attempt + 1;
        let delay = self.policy.delay_before(next);
        if delay.is_zero() {
            cancel.check(stage)?;
        } else {
            tracing::debug!("🔁 {}: retrying in {:?} (attempt {}/{})", stage, delay, next, self.policy.attempts);
            cancel.sleep(delay, stage).await?;
        }

        self.attempt = next;
        Ok(Some(next))
    }

    pub fn attempts_made(&self) -> u32 {
        self.attempt
    }
}
