use std::time::Duration;

/// Backoff schedule for lease readiness polling.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Delay after the first poll that still reports `initializing`.
    pub initial_interval: Duration,
    /// Upper bound for the delay between polls.
    pub max_interval: Duration,
    /// Multiplier applied to the delay after each poll.
    pub backoff_factor: f64,
    /// Give up after this long; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_secs(5),
            backoff_factor: 2.0,
            timeout: Some(Duration::from_secs(30 * 60)),
        }
    }
}

impl PollConfig {
    /// Delay before poll number `attempt + 1` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.initial_interval.as_secs_f64() * self.backoff_factor.powi(exp);
        let capped = secs.min(self.max_interval.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PollConfig::default();
        assert_eq!(config.initial_interval, Duration::from_millis(250));
        assert_eq!(config.max_interval, Duration::from_secs(5));
        assert_eq!(config.timeout, Some(Duration::from_secs(1800)));
    }

    #[test]
    fn delay_backs_off_and_caps() {
        let config = PollConfig::default();
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(250));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(5));
        assert_eq!(config.delay_for_attempt(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn attempt_zero_uses_initial_interval() {
        let config = PollConfig::default();
        assert_eq!(config.delay_for_attempt(0), config.initial_interval);
    }
}
