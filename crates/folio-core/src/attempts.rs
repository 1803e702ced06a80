//! Persisted failed-login bookkeeping

use serde::{Deserialize, Serialize};

use crate::clock::{from_epoch_millis, to_epoch_millis, Timestamp};
use crate::error::StoreError;
use crate::store::{get_parsed, keys, KeyValueStore, Write};

/// Failed login attempts since the last successful login
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttempts {
    /// Number of consecutive failures
    pub failed_attempts: u32,
    /// When the most recent failure happened
    pub last_failed_attempt: Option<Timestamp>,
}

impl LoginAttempts {
    /// The state after one more failure at `at`
    pub fn after_failure(self, at: Timestamp) -> Self {
        Self {
            failed_attempts: self.failed_attempts.saturating_add(1),
            last_failed_attempt: Some(at),
        }
    }
}

/// Reads and writes [`LoginAttempts`] in the key-value store
#[derive(Clone)]
pub struct AttemptLedger<S> {
    store: S,
}

impl<S: KeyValueStore> AttemptLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Current counters; missing keys read as zero / none
    pub fn load(&self) -> Result<LoginAttempts, StoreError> {
        let failed_attempts =
            get_parsed::<_, u32>(&self.store, keys::FAILED_ATTEMPTS)?.unwrap_or(0);

        let last_failed_attempt =
            match get_parsed::<_, i64>(&self.store, keys::LAST_FAILED_ATTEMPT)? {
                None => None,
                Some(millis) => Some(from_epoch_millis(millis).ok_or_else(|| {
                    StoreError::Corrupt {
                        key: keys::LAST_FAILED_ATTEMPT.to_string(),
                        value: millis.to_string(),
                    }
                })?),
            };

        Ok(LoginAttempts {
            failed_attempts,
            last_failed_attempt,
        })
    }

    /// Count one more failure at `at`, returning the new counters
    ///
    /// The count keeps growing even when a previous lockout has already
    /// expired; only [`record_success`](Self::record_success) clears it.
    /// Count and timestamp are written together or not at all.
    pub fn record_failure(&self, at: Timestamp) -> Result<LoginAttempts, StoreError> {
        let updated = self.load()?.after_failure(at);
        let count = updated.failed_attempts.to_string();
        let stamp = to_epoch_millis(at).to_string();
        self.store.apply(&[
            Write::Set(keys::FAILED_ATTEMPTS, &count),
            Write::Set(keys::LAST_FAILED_ATTEMPT, &stamp),
        ])?;
        Ok(updated)
    }

    /// Clear the counters after a successful login
    pub fn record_success(&self) -> Result<(), StoreError> {
        self.store.apply(&[
            Write::Set(keys::FAILED_ATTEMPTS, "0"),
            Write::Remove(keys::LAST_FAILED_ATTEMPT),
        ])
    }
}
