//! # Wait strategy for retrying failed consumptions.
//!
//! [`WaitStrategy`] is a pure function from a consecutive-failure count to a
//! sleep duration. The dispatch loop applies it before re-dispatching while
//! the failure counter is non-zero, throttling retry storms and log volume.
//!
//! Three policies are built in:
//! - [`WaitStrategy::fixed`] — constant delay;
//! - [`WaitStrategy::incrementing`] — linear growth with a cap;
//! - [`WaitStrategy::exponential`] — doubling growth with a cap.
//!
//! Delays are computed from the attempt number alone; no state is carried
//! between calls.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use persistq::WaitStrategy;
//!
//! let wait = WaitStrategy::incrementing(
//!     Duration::from_millis(5),
//!     Duration::from_millis(100),
//!     Duration::from_secs(5),
//! );
//!
//! // Attempt 1 — the initial delay
//! assert_eq!(wait.delay_for(1), Duration::from_millis(5));
//!
//! // Attempt 3 — initial + 2 steps
//! assert_eq!(wait.delay_for(3), Duration::from_millis(205));
//!
//! // Attempt 1000 — capped at 5s
//! assert_eq!(wait.delay_for(1000), Duration::from_secs(5));
//! ```

use std::time::Duration;

use crate::error::ConfigError;

/// Pure policy mapping a consecutive-failure count to a sleep duration.
///
/// Construct via [`WaitStrategy::no_wait`], [`WaitStrategy::fixed`],
/// [`WaitStrategy::incrementing`], or [`WaitStrategy::exponential`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Always sleep the same amount.
    Fixed {
        /// The constant delay.
        delay: Duration,
    },
    /// Sleep `initial` after the first failure and `step` more after each
    /// additional failure, capped at `max`.
    Incrementing {
        /// Delay after the first failed attempt.
        initial: Duration,
        /// Increment added per additional failed attempt.
        step: Duration,
        /// Delay cap.
        max: Duration,
    },
    /// Sleep `multiplier * 2^attempt`, capped at `max`.
    Exponential {
        /// Per-attempt multiplier.
        multiplier: Duration,
        /// Delay cap.
        max: Duration,
    },
}

impl WaitStrategy {
    /// A strategy that does not sleep at all between retries.
    pub fn no_wait() -> Self {
        WaitStrategy::Fixed {
            delay: Duration::ZERO,
        }
    }

    /// A strategy that sleeps a fixed amount before every retry.
    pub fn fixed(delay: Duration) -> Self {
        WaitStrategy::Fixed { delay }
    }

    /// A strategy that sleeps `initial` after the first failure and adds
    /// `step` after each additional failure, never exceeding `max`.
    pub fn incrementing(initial: Duration, step: Duration, max: Duration) -> Self {
        WaitStrategy::Incrementing { initial, step, max }
    }

    /// A strategy that doubles `multiplier` per failed attempt up to `max`.
    ///
    /// Fails with [`ConfigError::MultiplierAboveCap`] when `multiplier >= max`,
    /// which would make the cap unreachable from below.
    pub fn exponential(multiplier: Duration, max: Duration) -> Result<Self, ConfigError> {
        if multiplier >= max {
            return Err(ConfigError::MultiplierAboveCap { multiplier, max });
        }
        Ok(WaitStrategy::Exponential { multiplier, max })
    }

    /// Computes the sleep before retry number `attempt` (1-based).
    ///
    /// Arithmetic saturates at the configured cap; an `attempt` of 0 is
    /// treated as 1.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match *self {
            WaitStrategy::Fixed { delay } => delay,
            WaitStrategy::Incrementing { initial, step, max } => {
                let grown = initial.saturating_add(step.saturating_mul(attempt - 1));
                grown.min(max)
            }
            WaitStrategy::Exponential { multiplier, max } => {
                let base_ms = multiplier.as_millis().min(u128::from(u64::MAX)) as u64;
                let delay_ms = if attempt >= 63 {
                    u64::MAX
                } else {
                    base_ms.checked_mul(1u64 << attempt).unwrap_or(u64::MAX)
                };
                Duration::from_millis(delay_ms).min(max)
            }
        }
    }
}

impl Default for WaitStrategy {
    /// Returns an incrementing strategy: 5ms initial, 100ms step, 5s cap.
    fn default() -> Self {
        WaitStrategy::incrementing(
            Duration::from_millis(5),
            Duration::from_millis(100),
            Duration::from_secs(5),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_wait_is_zero_everywhere() {
        let wait = WaitStrategy::no_wait();
        for attempt in 1..50 {
            assert_eq!(wait.delay_for(attempt), Duration::ZERO);
        }
    }

    #[test]
    fn test_fixed_ignores_attempt() {
        let wait = WaitStrategy::fixed(Duration::from_millis(250));
        assert_eq!(wait.delay_for(1), Duration::from_millis(250));
        assert_eq!(wait.delay_for(17), Duration::from_millis(250));
        assert_eq!(wait.delay_for(u32::MAX), Duration::from_millis(250));
    }

    #[test]
    fn test_incrementing_grows_linearly() {
        let wait = WaitStrategy::incrementing(
            Duration::from_millis(10),
            Duration::from_millis(20),
            Duration::from_secs(1),
        );
        assert_eq!(wait.delay_for(1), Duration::from_millis(10));
        assert_eq!(wait.delay_for(2), Duration::from_millis(30));
        assert_eq!(wait.delay_for(3), Duration::from_millis(50));
    }

    #[test]
    fn test_incrementing_caps_at_max() {
        let wait = WaitStrategy::incrementing(
            Duration::from_millis(10),
            Duration::from_millis(20),
            Duration::from_millis(45),
        );
        assert_eq!(wait.delay_for(100), Duration::from_millis(45));
    }

    #[test]
    fn test_exponential_doubles() {
        let wait =
            WaitStrategy::exponential(Duration::from_millis(1), Duration::from_secs(30)).unwrap();
        assert_eq!(wait.delay_for(1), Duration::from_millis(2));
        assert_eq!(wait.delay_for(2), Duration::from_millis(4));
        assert_eq!(wait.delay_for(3), Duration::from_millis(8));
        assert_eq!(wait.delay_for(10), Duration::from_millis(1024));
    }

    #[test]
    fn test_exponential_caps_at_max() {
        let wait =
            WaitStrategy::exponential(Duration::from_millis(1), Duration::from_secs(1)).unwrap();
        assert_eq!(wait.delay_for(40), Duration::from_secs(1));
        assert_eq!(wait.delay_for(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_exponential_rejects_multiplier_at_or_above_cap() {
        let err =
            WaitStrategy::exponential(Duration::from_secs(10), Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ConfigError::MultiplierAboveCap { .. }));
        assert!(
            WaitStrategy::exponential(Duration::from_secs(5), Duration::from_secs(5)).is_err()
        );
    }

    #[test]
    fn test_attempt_zero_treated_as_one() {
        let wait = WaitStrategy::incrementing(
            Duration::from_millis(10),
            Duration::from_millis(20),
            Duration::from_secs(1),
        );
        assert_eq!(wait.delay_for(0), wait.delay_for(1));
    }

    #[test]
    fn test_default_matches_documented_values() {
        let wait = WaitStrategy::default();
        assert_eq!(wait.delay_for(1), Duration::from_millis(5));
        assert_eq!(wait.delay_for(2), Duration::from_millis(105));
        assert_eq!(wait.delay_for(1000), Duration::from_secs(5));
    }
}
