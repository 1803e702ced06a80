//! Outcome notices
//!
//! The core decides what to tell the admin (title, text, severity); how the
//! notice is shown is up to whoever implements [`Notifier`]. Handlers run
//! synchronously, in registration order, and must not panic.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::lockout::count_of;

/// How prominently a notice should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Destructive,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Destructive => write!(f, "destructive"),
        }
    }
}

/// A human-readable message about an authentication outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notice {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
        }
    }

    /// Login rejected because the account is locked
    pub fn locked_out(remaining_minutes: u64) -> Self {
        Self::new(
            "Account Locked",
            format!(
                "Too many failed attempts. Try again in {}.",
                count_of(remaining_minutes, "minute")
            ),
            Severity::Destructive,
        )
    }

    /// Wrong password, account still open
    pub fn login_failed(attempts_left: u32) -> Self {
        Self::new(
            "Login Failed",
            format!(
                "Invalid password. {} remaining before account is locked.",
                count_of(u64::from(attempts_left), "attempt")
            ),
            Severity::Destructive,
        )
    }

    /// Wrong password that closed the lockout gate
    pub fn lock_engaged(window: &str) -> Self {
        Self::new(
            "Account Locked",
            format!(
                "Your account has been locked for {} due to too many failed attempts.",
                window
            ),
            Severity::Destructive,
        )
    }

    pub fn login_succeeded() -> Self {
        Self::new(
            "Login Successful",
            "You are now logged in as admin.",
            Severity::Info,
        )
    }

    /// Advisory reminder that the password is old
    pub fn password_expiry(max_age_days: i64) -> Self {
        Self::new(
            "Password Expiry Notice",
            format!(
                "Your password is over {} days old. Please change it for security reasons.",
                max_age_days
            ),
            Severity::Warning,
        )
    }

    /// New password rejected by the policy
    pub fn policy_violation(summary: String) -> Self {
        Self::new(
            "Password Requirements Not Met",
            summary,
            Severity::Destructive,
        )
    }

    pub fn wrong_current_password() -> Self {
        Self::new(
            "Password Change Failed",
            "Current password is incorrect.",
            Severity::Destructive,
        )
    }

    pub fn password_changed() -> Self {
        Self::new(
            "Password Changed",
            "Your password has been updated successfully.",
            Severity::Info,
        )
    }

    pub fn logged_out() -> Self {
        Self::new("Logged Out", "You have been logged out.", Severity::Info)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Receiver of outcome notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Sends notices to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.severity {
            Severity::Info => info!(title = %notice.title, "{}", notice.description),
            Severity::Warning | Severity::Destructive => {
                warn!(title = %notice.title, severity = %notice.severity, "{}", notice.description)
            }
        }
    }
}

/// Keeps every notice it receives; handy for tests and batch reporting
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    /// The most recent notice
    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().ok().and_then(|n| n.last().cloned())
    }

    /// Drain the received notices
    pub fn take(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|mut n| std::mem::take(&mut *n))
            .unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: &Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice.clone());
        }
    }
}
