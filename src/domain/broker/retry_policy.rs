//! Bounded connect retry policy.

use std::time::Duration;

/// Fixed-count, fixed-delay retry policy for broker connects.
///
/// The delay is applied between attempts, so `max_attempts` attempts
/// sleep `max_attempts - 1` times before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total connect attempts before the failure is terminal.
    ///
    /// Default: 5
    pub max_attempts: u32,

    /// Pause between consecutive attempts.
    ///
    /// Default: 2 seconds
    pub delay: Duration,

    /// Upper bound for a single attempt's handshake.
    ///
    /// Default: 5 seconds
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Set the attempt bound (at least one attempt is always made).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the delay between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the per-attempt handshake timeout.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Whether another attempt follows attempt number `attempt` (1-based).
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
