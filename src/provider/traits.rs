use std::time::Duration;

use async_trait::async_trait;

use super::error::ProviderError;
use super::types::{MediaRequest, ProviderOutput};

/// A third-party site that can turn a [`MediaRequest`] into stream locations.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Display name, also used as the error origin.
    fn name(&self) -> &'static str;

    async fn fetch(&self, media: &MediaRequest) -> Result<ProviderOutput, ProviderError>;
}

/// Bounded attempts with linear backoff: wait `base_delay * n` after attempt `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay before the attempt following `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    pub fn has_more(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert!(policy.has_more(2));
        assert!(!policy.has_more(3));
    }

    #[test]
    fn test_at_least_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
        assert!(!policy.has_more(1));
    }
}
