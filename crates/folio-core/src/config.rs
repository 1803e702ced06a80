//! Authentication configuration
//!
//! Every field has a serde default so a partial `[auth]` table in the admin
//! config file is enough.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default admin password written on first run
pub const DEFAULT_ADMIN_PASSWORD: &str = "Jaykumar@01";

/// Failed attempts that trigger a lockout
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Lockout window in seconds (15 minutes)
pub const DEFAULT_LOCKOUT_WINDOW_SECS: u64 = 15 * 60;

/// Longest accepted lockout window (one year)
pub const MAX_LOCKOUT_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

/// Password age, in days, after which a change is recommended
pub const DEFAULT_PASSWORD_MAX_AGE_DAYS: i64 = 90;

/// Authentication settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Failed attempts before the account locks
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// How long a lockout lasts after the last failed attempt
    #[serde(default = "default_lockout_window_secs")]
    pub lockout_window_secs: u64,

    /// Advisory password age limit
    #[serde(default = "default_password_max_age_days")]
    pub password_max_age_days: i64,

    /// Credential installed when the store has none
    #[serde(default = "default_admin_password")]
    pub default_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            lockout_window_secs: default_lockout_window_secs(),
            password_max_age_days: default_password_max_age_days(),
            default_password: default_admin_password(),
        }
    }
}

impl AuthConfig {
    /// Lockout window as a `Duration`
    pub fn lockout_window(&self) -> Duration {
        Duration::from_secs(self.lockout_window_secs)
    }

    /// Reject settings that would disable or break the lockout gate
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::Config("max_attempts must be greater than 0".into()));
        }
        if self.lockout_window_secs == 0 {
            return Err(Error::Config(
                "lockout_window_secs must be greater than 0".into(),
            ));
        }
        if self.lockout_window_secs > MAX_LOCKOUT_WINDOW_SECS {
            return Err(Error::Config(format!(
                "lockout_window_secs must be at most {}",
                MAX_LOCKOUT_WINDOW_SECS
            )));
        }
        if self.password_max_age_days <= 0 {
            return Err(Error::Config(
                "password_max_age_days must be greater than 0".into(),
            ));
        }
        if self.default_password.is_empty() {
            return Err(Error::Config("default_password must not be empty".into()));
        }
        Ok(())
    }
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_lockout_window_secs() -> u64 {
    DEFAULT_LOCKOUT_WINDOW_SECS
}

fn default_password_max_age_days() -> i64 {
    DEFAULT_PASSWORD_MAX_AGE_DAYS
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}
