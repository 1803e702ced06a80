//! Time-window lockout gate
//!
//! The account is locked while both hold:
//!
//! - at least `max_attempts` consecutive failures are recorded
//! - the most recent failure is less than `window` ago
//!
//! The gate is evaluated fresh on every call; nothing is scheduled. Once the
//! window has passed the gate opens again even though the failure count is
//! still at or above the threshold.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::attempts::LoginAttempts;
use crate::clock::Timestamp;
use crate::config::{AuthConfig, DEFAULT_LOCKOUT_WINDOW_SECS, DEFAULT_MAX_ATTEMPTS};

/// Threshold and window of the lockout gate
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Failures that close the gate
    pub max_attempts: u32,
    /// How long the gate stays closed after the last failure
    pub window: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            window: Duration::from_secs(DEFAULT_LOCKOUT_WINDOW_SECS),
        }
    }
}

impl From<&AuthConfig> for LockoutPolicy {
    fn from(config: &AuthConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            window: config.lockout_window(),
        }
    }
}

/// Result of evaluating the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutStatus {
    /// Whether logins are currently rejected
    pub locked: bool,
    /// Whole seconds until the gate opens (0 when unlocked)
    pub remaining_secs: u64,
    /// Failures recorded so far
    pub failed_attempts: u32,
    /// Failures allowed before locking
    pub max_attempts: u32,
}

impl LockoutStatus {
    /// Remaining lock time in whole minutes, rounded up
    pub fn remaining_minutes(&self) -> u64 {
        self.remaining_secs.div_ceil(60)
    }

    /// Attempts left before the gate closes
    pub fn attempts_remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.failed_attempts)
    }
}

impl LockoutPolicy {
    /// Whether a failure count has reached the threshold
    pub fn is_threshold_reached(&self, failed_attempts: u32) -> bool {
        failed_attempts >= self.max_attempts
    }

    /// Evaluate the gate for the given counters at `now`
    ///
    /// A recorded failure later than `now` (clock moved backwards) counts as
    /// zero elapsed time. A high count with no recorded timestamp is
    /// treated as unlocked.
    pub fn evaluate(&self, attempts: &LoginAttempts, now: Timestamp) -> LockoutStatus {
        let unlocked = LockoutStatus {
            locked: false,
            remaining_secs: 0,
            failed_attempts: attempts.failed_attempts,
            max_attempts: self.max_attempts,
        };

        if !self.is_threshold_reached(attempts.failed_attempts) {
            return unlocked;
        }

        let Some(last_failed) = attempts.last_failed_attempt else {
            return unlocked;
        };

        let elapsed_ms = (now - last_failed).num_milliseconds().max(0) as u128;
        let window_ms = self.window.as_millis();
        if elapsed_ms >= window_ms {
            return unlocked;
        }

        let remaining_ms = window_ms - elapsed_ms;
        LockoutStatus {
            locked: true,
            remaining_secs: remaining_ms.div_ceil(1000) as u64,
            ..unlocked
        }
    }

    /// Human-readable lock duration, e.g. "15 minutes"
    pub fn describe_window(&self) -> String {
        describe_secs(self.window.as_secs())
    }
}

/// Render a number of seconds at the coarsest sensible unit
pub fn describe_secs(secs: u64) -> String {
    if secs < 60 {
        count_of(secs, "second")
    } else if secs < 3600 {
        count_of(secs.div_ceil(60), "minute")
    } else {
        count_of(secs.div_ceil(3600), "hour")
    }
}

/// `n` followed by `unit`, pluralized unless `n` is one
pub(crate) fn count_of(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::from_epoch_millis;
    use chrono::Duration as ChronoDuration;

    fn t0() -> Timestamp {
        from_epoch_millis(1_700_000_000_000).unwrap()
    }

    fn attempts(count: u32, last: Option<Timestamp>) -> LoginAttempts {
        LoginAttempts {
            failed_attempts: count,
            last_failed_attempt: last,
        }
    }

    #[test]
    fn test_below_threshold_never_locked() {
        let policy = LockoutPolicy::default();
        for count in 0..5 {
            let status = policy.evaluate(&attempts(count, Some(t0())), t0());
            assert!(!status.locked);
            assert_eq!(status.remaining_secs, 0);
        }
    }

    #[test]
    fn test_locked_at_threshold() {
        let policy = LockoutPolicy::default();
        let status = policy.evaluate(&attempts(5, Some(t0())), t0());
        assert!(status.locked);
        assert_eq!(status.remaining_secs, 900);
        assert_eq!(status.remaining_minutes(), 15);
        assert_eq!(status.attempts_remaining(), 0);
    }

    #[test]
    fn test_remaining_decreases() {
        let policy = LockoutPolicy::default();
        let a = attempts(5, Some(t0()));

        let at_100 = policy.evaluate(&a, t0() + ChronoDuration::seconds(100));
        let at_101 = policy.evaluate(&a, t0() + ChronoDuration::seconds(101));
        assert_eq!(at_100.remaining_secs, 800);
        assert_eq!(at_101.remaining_secs, 799);
    }

    #[test]
    fn test_partial_second_rounds_up() {
        let policy = LockoutPolicy::default();
        let a = attempts(5, Some(t0()));
        let status = policy.evaluate(&a, t0() + ChronoDuration::milliseconds(899_500));
        assert!(status.locked);
        assert_eq!(status.remaining_secs, 1);
    }

    #[test]
    fn test_unlocked_after_window() {
        let policy = LockoutPolicy::default();
        let a = attempts(5, Some(t0()));

        assert!(!policy.evaluate(&a, t0() + ChronoDuration::seconds(900)).locked);
        let status = policy.evaluate(&a, t0() + ChronoDuration::seconds(901));
        assert!(!status.locked);
        assert_eq!(status.failed_attempts, 5);
    }

    #[test]
    fn test_missing_timestamp_is_unlocked() {
        let policy = LockoutPolicy::default();
        assert!(!policy.evaluate(&attempts(9, None), t0()).locked);
    }

    #[test]
    fn test_future_failure_counts_as_zero_elapsed() {
        let policy = LockoutPolicy::default();
        let a = attempts(5, Some(t0() + ChronoDuration::minutes(10)));
        let status = policy.evaluate(&a, t0());
        assert!(status.locked);
        assert_eq!(status.remaining_secs, 900);
    }

    #[test]
    fn test_custom_policy_from_config() {
        let config = AuthConfig {
            max_attempts: 3,
            lockout_window_secs: 60,
            ..Default::default()
        };
        let policy = LockoutPolicy::from(&config);
        assert!(policy.evaluate(&attempts(3, Some(t0())), t0()).locked);
        assert!(!policy.evaluate(&attempts(2, Some(t0())), t0()).locked);
        assert_eq!(policy.describe_window(), "1 minute");
    }

    #[test]
    fn test_describe_secs() {
        assert_eq!(describe_secs(30), "30 seconds");
        assert_eq!(describe_secs(900), "15 minutes");
        assert_eq!(describe_secs(7200), "2 hours");
        assert_eq!(describe_secs(1), "1 second");
    }
}
