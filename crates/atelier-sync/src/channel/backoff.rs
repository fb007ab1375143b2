//! Exponential backoff gating for channel retries.

use chrono::{DateTime, Utc};
use std::time::Duration;

use atelier_core::config::channel::ChannelConfig;

/// Retry gating policy: exponential backoff with a cap and a retry budget.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Base backoff used for retry_count=1.
    base: Duration,
    /// Maximum backoff cap.
    max: Duration,
    /// Maximum retries before the channel stays down until an explicit
    /// credential refresh.
    max_retries: u32,
}

impl RetryPolicy {
    /// Builds the policy from channel configuration.
    pub fn from_config(config: &ChannelConfig) -> Self {
        Self {
            base: Duration::from_millis(config.retry_backoff_base_ms),
            max: Duration::from_millis(config.retry_backoff_max_ms),
            max_retries: config.max_retries,
        }
    }

    /// Computes the backoff delay for the given retry count.
    pub fn delay(&self, retry_count: u32) -> Duration {
        if retry_count == 0 {
            return Duration::ZERO;
        }

        let base_ms = self.base.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        let shift = retry_count - 1;
        let multiplier = 1u64.checked_shl(shift).unwrap_or(u64::MAX);
        let delay_ms = base_ms.saturating_mul(multiplier).min(max_ms);

        Duration::from_millis(delay_ms)
    }

    /// Whether a retry is due, given when the last attempt started.
    pub fn is_due(
        &self,
        last_attempt: Option<DateTime<Utc>>,
        retry_count: u32,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(last_attempt) = last_attempt else {
            return true;
        };
        let backoff = chrono::Duration::from_std(self.delay(retry_count))
            .unwrap_or_else(|_| chrono::Duration::MAX);
        now >= last_attempt + backoff
    }

    /// Whether the retry budget is spent.
    pub fn exhausted(&self, retry_count: u32) -> bool {
        retry_count > self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(base_secs: u64, max_secs: u64, max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            base: Duration::from_secs(base_secs),
            max: Duration::from_secs(max_secs),
            max_retries,
        }
    }

    #[test]
    fn test_delay_caps_and_grows() {
        let policy = policy(2, 10, 20);
        assert_eq!(policy.delay(0), Duration::ZERO);
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(3), Duration::from_secs(8));
        assert_eq!(policy.delay(4), Duration::from_secs(10));
        assert_eq!(policy.delay(10), Duration::from_secs(10));
    }

    #[test]
    fn test_delay_very_large_retry_caps_at_max() {
        let policy = policy(1, 300, 20);
        assert_eq!(policy.delay(1000), Duration::from_secs(300));
    }

    #[test]
    fn test_is_due_no_last_attempt() {
        let policy = policy(2, 300, 20);
        assert!(policy.is_due(None, 0, Utc::now()));
    }

    #[test]
    fn test_is_due_recent_attempt() {
        let policy = policy(60, 300, 20);
        let now = Utc::now();
        let last = now - chrono::Duration::seconds(1);
        assert!(!policy.is_due(Some(last), 1, now));
    }

    #[test]
    fn test_is_due_old_attempt() {
        let policy = policy(2, 300, 20);
        let now = Utc::now();
        let last = now - chrono::Duration::seconds(10);
        assert!(policy.is_due(Some(last), 1, now));
    }

    #[test]
    fn test_exhausted() {
        let policy = policy(2, 300, 3);
        assert!(!policy.exhausted(3));
        assert!(policy.exhausted(4));
    }

    #[test]
    fn test_from_config_defaults() {
        let policy = RetryPolicy::from_config(&ChannelConfig::default());
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.max_retries, 20);
    }
}
