//! Retry policy for transient lookup failures.
//!
//! A lookup that reports "try again" is repeated on the same worker thread,
//! with exponential backoff in between, until it succeeds, fails terminally,
//! or runs out of attempts.

use serde::Deserialize;
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of lookup attempts, including the first (default: 3)
    pub max_attempts: u32,
    /// Base delay for exponential backoff in milliseconds (default: 50)
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds (default: 1000)
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 50,
            max_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Retries back-to-back without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Attempts actually made; a policy of zero still runs the lookup once.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait before attempt number `attempt` (1-based).
    ///
    /// Uses exponential backoff: `base_delay * 2^(attempt-2)`, capped at
    /// `max_delay_ms`. The first attempt never waits.
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }

        let delay_ms = self
            .base_delay_ms
            .saturating_mul(1 << (attempt - 2).min(10));
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }

    /// Check if another attempt is allowed after `attempt` attempts.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.attempts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_exponential() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.backoff(1), Duration::ZERO);
        assert_eq!(policy.backoff(2), Duration::from_millis(50));
        assert_eq!(policy.backoff(3), Duration::from_millis(100));
        assert_eq!(policy.backoff(4), Duration::from_millis(200));
    }

    #[test]
    fn test_backoff_capped() {
        let policy = RetryPolicy {
            base_delay_ms: 1000,
            max_delay_ms: 2000,
            ..Default::default()
        };

        assert_eq!(policy.backoff(3), Duration::from_millis(2000));
        assert_eq!(policy.backoff(30), Duration::from_millis(2000));
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));

        let once = RetryPolicy::no_retry();
        assert!(!once.should_retry(1));
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let policy = RetryPolicy::immediate(0);
        assert_eq!(policy.attempts(), 1);
        assert!(!policy.should_retry(1));
    }
}
