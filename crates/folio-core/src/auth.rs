//! Admin authentication state machine
//!
//! [`AuthService`] is the single owner of the admin session. It is built
//! once at startup with an injected store handle, clock and configuration,
//! and callers hold it directly; there is no ambient global.
//!
//! # States
//!
//! - `Unauthenticated --login ok-->  Authenticated` (failure counters cleared)
//! - `Unauthenticated --login bad--> Unauthenticated` (counter +1, failure time stamped)
//! - `Authenticated   --logout-->    Unauthenticated` (counters untouched)
//!
//! The lockout gate runs before any credential comparison. While it is
//! closed, `login` fails without reading the credential or touching the
//! counters. The session flag lives only as long as the service.

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::attempts::AttemptLedger;
use crate::clock::{Clock, Timestamp};
use crate::config::AuthConfig;
use crate::credential::{CredentialStore, Secret};
use crate::error::Result;
use crate::lockout::{LockoutPolicy, LockoutStatus};
use crate::notice::{Notice, Notifier};
use crate::policy::{self, PolicyReport};
use crate::store::KeyValueStore;

/// Session state of the admin area
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated,
}

/// Result of a login attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginOutcome {
    /// Credential accepted; the session is now authenticated
    Success {
        /// The advisory password age limit has been reached
        password_expired: bool,
    },
    /// Wrong password while the gate was open
    InvalidCredential {
        /// Failures recorded including this one
        failed_attempts: u32,
        /// Failures left before the gate closes
        attempts_remaining: u32,
        /// This failure closed the gate
        locked: bool,
    },
    /// Rejected by the lockout gate; nothing was compared or recorded
    LockedOut { remaining_secs: u64 },
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Result of a change-password request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PasswordChange {
    /// New credential stored and change time reset
    Changed,
    /// Current password did not match; the policy was not evaluated
    WrongCurrentPassword,
    /// New password broke one or more policy rules
    PolicyViolation(PolicyReport),
}

impl PasswordChange {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Login, logout, lockout and password changes for the single admin
pub struct AuthService<S, C> {
    credentials: CredentialStore<S, C>,
    attempts: AttemptLedger<S>,
    lockout: LockoutPolicy,
    password_max_age_days: i64,
    clock: C,
    state: AuthState,
    notifications: Vec<Arc<dyn Notifier>>,
}

impl<S, C> AuthService<S, C>
where
    S: KeyValueStore + Clone,
    C: Clock + Clone,
{
    /// Build the service over a store handle
    ///
    /// Fails only if `config` does not validate.
    pub fn new(store: S, clock: C, config: &AuthConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            credentials: CredentialStore::new(
                store.clone(),
                clock.clone(),
                config.default_password.as_str(),
            ),
            attempts: AttemptLedger::new(store),
            lockout: LockoutPolicy::from(config),
            password_max_age_days: config.password_max_age_days,
            clock,
            state: AuthState::Unauthenticated,
            notifications: Vec::new(),
        })
    }

    /// Register a notification handler
    ///
    /// Handlers receive every notice in registration order.
    pub fn with_notification(mut self, handler: Arc<dyn Notifier>) -> Self {
        self.notifications.push(handler);
        self
    }

    /// Attempt to authenticate with `password`
    ///
    /// Counter changes are persisted before the outcome is returned. A
    /// failure after an earlier lockout has expired keeps counting from the
    /// stale total rather than starting over at one.
    pub fn login(&mut self, password: &str) -> Result<LoginOutcome> {
        let now = self.clock.now();
        let current = self.attempts.load()?;

        let gate = self.lockout.evaluate(&current, now);
        if gate.locked {
            debug!(
                remaining_secs = gate.remaining_secs,
                failed_attempts = gate.failed_attempts,
                "Login rejected by lockout gate"
            );
            self.notify(Notice::locked_out(gate.remaining_minutes()));
            return Ok(LoginOutcome::LockedOut {
                remaining_secs: gate.remaining_secs,
            });
        }

        if self.credentials.verify(password)? {
            let password_expired = self.password_expired()?;
            self.attempts.record_success()?;
            self.state = AuthState::Authenticated;

            info!(password_expired, "Admin login succeeded");

            self.notify(Notice::login_succeeded());
            if password_expired {
                self.notify(Notice::password_expiry(self.password_max_age_days));
            }
            return Ok(LoginOutcome::Success { password_expired });
        }

        let updated = self.attempts.record_failure(now)?;
        let locked = self.lockout.is_threshold_reached(updated.failed_attempts);
        let attempts_remaining = self
            .lockout
            .max_attempts
            .saturating_sub(updated.failed_attempts);

        if locked {
            warn!(
                failed_attempts = updated.failed_attempts,
                window_secs = self.lockout.window.as_secs(),
                "Admin account locked after repeated failures"
            );
            self.notify(Notice::lock_engaged(&self.lockout.describe_window()));
        } else {
            debug!(
                failed_attempts = updated.failed_attempts,
                attempts_remaining, "Admin login failed"
            );
            self.notify(Notice::login_failed(attempts_remaining));
        }

        Ok(LoginOutcome::InvalidCredential {
            failed_attempts: updated.failed_attempts,
            attempts_remaining,
            locked,
        })
    }

    /// End the session; credential and counters are left alone
    pub fn logout(&mut self) {
        if self.state == AuthState::Authenticated {
            info!("Admin logged out");
            self.notify(Notice::logged_out());
        }
        self.state = AuthState::Unauthenticated;
    }

    /// Replace the credential after checking the current one and the policy
    ///
    /// The current-password check runs first; on mismatch the policy is not
    /// evaluated. Nothing is written unless both checks pass. Session and
    /// lockout state are unaffected either way.
    pub fn change_password(
        &mut self,
        current_password: &str,
        new_password: &str,
    ) -> Result<PasswordChange> {
        if !self.credentials.verify(current_password)? {
            debug!("Password change rejected: current password mismatch");
            self.notify(Notice::wrong_current_password());
            return Ok(PasswordChange::WrongCurrentPassword);
        }

        let report = policy::validate(new_password);
        if !report.is_valid() {
            debug!(
                violations = report.violations.len(),
                "Password change rejected by policy"
            );
            self.notify(Notice::policy_violation(report.summary()));
            return Ok(PasswordChange::PolicyViolation(report));
        }

        self.credentials.set_credential(&Secret::from(new_password))?;
        info!("Admin password changed");
        self.notify(Notice::password_changed());

        Ok(PasswordChange::Changed)
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    /// Persisted failure count
    pub fn failed_attempts(&self) -> Result<u32> {
        Ok(self.attempts.load()?.failed_attempts)
    }

    /// Persisted time of the most recent failure
    pub fn last_failed_attempt(&self) -> Result<Option<Timestamp>> {
        Ok(self.attempts.load()?.last_failed_attempt)
    }

    /// When the password last changed (read-or-initialize, see
    /// [`CredentialStore::last_changed`])
    pub fn password_last_changed(&self) -> Result<Timestamp> {
        Ok(self.credentials.last_changed()?)
    }

    /// Whole days since the last password change
    pub fn password_age_days(&self) -> Result<i64> {
        let changed = self.password_last_changed()?;
        Ok((self.clock.now() - changed).num_days().max(0))
    }

    /// Advisory only: the age limit never blocks anything
    pub fn password_expired(&self) -> Result<bool> {
        Ok(self.password_age_days()? >= self.password_max_age_days)
    }

    /// Days left before the advisory limit (negative once past it)
    pub fn days_until_password_expiry(&self) -> Result<i64> {
        Ok(self.password_max_age_days - self.password_age_days()?)
    }

    /// Evaluate the lockout gate now without attempting a login
    pub fn lockout_status(&self) -> Result<LockoutStatus> {
        let attempts = self.attempts.load()?;
        Ok(self.lockout.evaluate(&attempts, self.clock.now()))
    }

    /// Time at which the gate reopens, if it is closed
    pub fn locked_until(&self) -> Result<Option<Timestamp>> {
        let status = self.lockout_status()?;
        if !status.locked {
            return Ok(None);
        }
        let now = self.clock.now();
        let until = i64::try_from(status.remaining_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|remaining| now.checked_add_signed(remaining))
            .unwrap_or(Timestamp::MAX_UTC);
        Ok(Some(until))
    }

    pub fn lockout_policy(&self) -> &LockoutPolicy {
        &self.lockout
    }

    fn notify(&self, notice: Notice) {
        for handler in &self.notifications {
            handler.notify(&notice);
        }
    }
}
