//! Exponential backoff schedule for retrying transient failures

use std::time::Duration;

/// Deterministic exponential backoff: `base * 2^(retry - 1)`, capped at
/// `max_delay`, with a bounded retry budget.
///
/// The policy only computes delays; callers own the sleeping so the schedule
/// stays assertable in tests.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base_delay: Duration,
    max_delay: Duration,
    max_retries: u32,
}

impl ExponentialBackoff {
    /// Create a backoff policy.
    ///
    /// # Errors
    /// Returns a message when `base_delay` exceeds `max_delay`.
    pub fn new(
        base_delay: Duration,
        max_delay: Duration,
        max_retries: u32,
    ) -> Result<Self, String> {
        if base_delay > max_delay {
            return Err(format!(
                "base_delay ({base_delay:?}) cannot be greater than max_delay ({max_delay:?})"
            ));
        }
        Ok(Self { base_delay, max_delay, max_retries })
    }

    /// Delay before retry number `retry` (1-based): the first retry waits
    /// the base delay, each further retry doubles it.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(10);
        let multiplier = 1u32 << shift;
        self.base_delay.saturating_mul(multiplier).min(self.max_delay)
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_doubles_from_base() {
        let backoff =
            ExponentialBackoff::new(Duration::from_millis(500), Duration::from_secs(30), 5)
                .unwrap();

        assert_eq!(backoff.delay_for(1), Duration::from_millis(500));
        assert_eq!(backoff.delay_for(2), Duration::from_millis(1000));
        assert_eq!(backoff.delay_for(3), Duration::from_millis(2000));
        assert_eq!(backoff.delay_for(4), Duration::from_millis(4000));
    }

    #[test]
    fn delay_is_capped() {
        let backoff =
            ExponentialBackoff::new(Duration::from_millis(500), Duration::from_secs(2), 10)
                .unwrap();

        assert_eq!(backoff.delay_for(8), Duration::from_secs(2));
    }

    #[test]
    fn large_retry_numbers_do_not_overflow() {
        let backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60), u32::MAX)
                .unwrap();

        assert_eq!(backoff.delay_for(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn base_above_max_is_rejected() {
        let result =
            ExponentialBackoff::new(Duration::from_secs(10), Duration::from_secs(1), 3);
        assert!(result.is_err());
    }
}
