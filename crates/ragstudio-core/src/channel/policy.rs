//! Linear reconnect backoff.

use std::time::Duration;

use crate::config::ChannelSettings;

/// Delay before reconnect `n` is `base_delay * n`, for `n` in `1..=max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Next reconnect after `attempts` reconnects since the last open.
    ///
    /// Returns the new attempt number and its delay, or `None` once the
    /// budget is spent.
    pub fn next_attempt(&self, attempts: u32) -> Option<(u32, Duration)> {
        if attempts >= self.max_attempts {
            return None;
        }
        let attempt = attempts + 1;
        Some((attempt, self.base_delay.saturating_mul(attempt)))
    }
}

impl From<&ChannelSettings> for ReconnectPolicy {
    fn from(settings: &ChannelSettings) -> Self {
        Self::new(settings.max_attempts, settings.base_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_delays_then_exhausted() {
        let policy = ReconnectPolicy::new(5, Duration::from_millis(1000));
        let mut attempts = 0;
        let mut delays = Vec::new();
        while let Some((attempt, delay)) = policy.next_attempt(attempts) {
            attempts = attempt;
            delays.push(delay.as_millis());
        }
        assert_eq!(delays, vec![1000, 2000, 3000, 4000, 5000]);
        assert_eq!(attempts, 5);
    }

    #[test]
    fn test_zero_budget_never_retries() {
        let policy = ReconnectPolicy::new(0, Duration::from_millis(1000));
        assert_eq!(policy.next_attempt(0), None);
    }

    #[test]
    fn test_from_settings() {
        let policy = ReconnectPolicy::from(&ChannelSettings::default());
        assert_eq!(policy.next_attempt(0), Some((1, Duration::from_millis(1000))));
    }
}
