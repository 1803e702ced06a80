//! Admin credential storage
//!
//! There is exactly one credential. It is created with the configured
//! default the first time anything reads it, replaced wholesale on a
//! password change, and never deleted.

use std::fmt;

use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::clock::{from_epoch_millis, to_epoch_millis, Clock, Timestamp};
use crate::error::StoreError;
use crate::store::{get_parsed, keys, KeyValueStore, Write};

/// A password held in memory
///
/// The buffer is wiped on drop and never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the plaintext
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Reads and writes the admin credential and its change timestamp
#[derive(Clone)]
pub struct CredentialStore<S, C> {
    store: S,
    clock: C,
    default_password: Secret,
}

impl<S: KeyValueStore, C: Clock> CredentialStore<S, C> {
    pub fn new(store: S, clock: C, default_password: impl Into<Secret>) -> Self {
        Self {
            store,
            clock,
            default_password: default_password.into(),
        }
    }

    /// Current credential (read-or-initialize)
    ///
    /// When nothing is persisted yet, the default credential is written to
    /// the store and returned.
    pub fn get_credential(&self) -> Result<Secret, StoreError> {
        if let Some(stored) = self.store.get(keys::ADMIN_PASSWORD)? {
            return Ok(Secret::from(stored));
        }

        info!("No admin credential stored, installing default");
        self.store.set(keys::ADMIN_PASSWORD, self.default_password.expose())?;
        Ok(self.default_password.clone())
    }

    /// Replace the credential and stamp the change time
    ///
    /// Both keys are written in one batch; if the store fails neither changes.
    pub fn set_credential(&self, new_value: &Secret) -> Result<(), StoreError> {
        let now = self.clock.now();
        let changed_at = to_epoch_millis(now).to_string();
        self.store.apply(&[
            Write::Set(keys::ADMIN_PASSWORD, new_value.expose()),
            Write::Set(keys::PASSWORD_LAST_CHANGED, &changed_at),
        ])?;
        debug!(changed_at = %now, "Admin credential replaced");
        Ok(())
    }

    /// When the credential last changed (read-or-initialize)
    ///
    /// A missing timestamp is treated as "just changed": now is persisted
    /// and returned.
    pub fn last_changed(&self) -> Result<Timestamp, StoreError> {
        if let Some(millis) = get_parsed::<_, i64>(&self.store, keys::PASSWORD_LAST_CHANGED)? {
            return from_epoch_millis(millis).ok_or_else(|| StoreError::Corrupt {
                key: keys::PASSWORD_LAST_CHANGED.to_string(),
                value: millis.to_string(),
            });
        }

        let now = self.clock.now();
        let stamp = to_epoch_millis(now).to_string();
        self.store.set(keys::PASSWORD_LAST_CHANGED, &stamp)?;
        debug!(initialized_at = %now, "Password change timestamp initialized");
        Ok(now)
    }

    /// Compare a candidate with the current credential
    pub fn verify(&self, candidate: &str) -> Result<bool, StoreError> {
        let current = self.get_credential()?;
        Ok(current.expose() == candidate)
    }
}
