//! Password policy
//!
//! [`validate`] checks every rule and reports every violation, in rule
//! order. It never short-circuits, so a caller can show the complete list
//! at once.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum password length in characters
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Characters that satisfy the special-character rule
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

/// Substrings that make a password trivially guessable (matched case-insensitively)
pub const DENYLIST: &[&str] = &[
    "password",
    "123456",
    "qwerty",
    "admin",
    "welcome",
    "portfolio",
];

/// A single policy rule a password can break
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyViolation {
    TooShort,
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
    MissingSpecial,
    CommonPattern,
}

impl PolicyViolation {
    /// User-facing description
    pub fn message(&self) -> &'static str {
        match self {
            Self::TooShort => "Password must be at least 12 characters long",
            Self::MissingUppercase => "Password must contain at least one uppercase letter",
            Self::MissingLowercase => "Password must contain at least one lowercase letter",
            Self::MissingDigit => "Password must contain at least one number",
            Self::MissingSpecial => "Password must contain at least one special character",
            Self::CommonPattern => "Password contains common easily guessable patterns",
        }
    }
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of [`validate`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyReport {
    /// Broken rules, in the order the rules are checked
    pub violations: Vec<PolicyViolation>,
}

impl PolicyReport {
    /// True iff no rule was broken
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violation messages in rule order
    pub fn errors(&self) -> Vec<&'static str> {
        self.violations.iter().map(PolicyViolation::message).collect()
    }

    /// All messages joined into one sentence list
    pub fn summary(&self) -> String {
        self.errors().join(". ")
    }
}

/// Check a candidate password against every rule
pub fn validate(password: &str) -> PolicyReport {
    let mut violations = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        violations.push(PolicyViolation::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        violations.push(PolicyViolation::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        violations.push(PolicyViolation::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push(PolicyViolation::MissingDigit);
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        violations.push(PolicyViolation::MissingSpecial);
    }

    let lowered = password.to_lowercase();
    if DENYLIST.iter().any(|pattern| lowered.contains(pattern)) {
        violations.push(PolicyViolation::CommonPattern);
    }

    PolicyReport { violations }
}

/// Masked hint: first and last character with the middle starred out
///
/// Passwords of fewer than three characters are masked completely.
pub fn password_hint(password: &str) -> String {
    let chars: Vec<char> = password.chars().collect();
    let len = chars.len();

    let masked = match (chars.first(), chars.last()) {
        (Some(first), Some(last)) if len >= 3 => {
            format!("{}{}{}", first, "*".repeat(len - 2), last)
        }
        _ => "*".repeat(len),
    };

    format!("{} ({} characters)", masked, len)
}

/// Password management advice shown next to the change-password form
pub fn recommendations() -> &'static [&'static str] {
    &[
        "Use a different password for each of your accounts",
        "Consider using a password manager like 1Password, LastPass, or Bitwarden",
        "Enable two-factor authentication whenever possible",
        "Change your password every 90 days",
        "Never share your password with others",
        "Avoid using personal information in your password",
        "Don't write down your password or store it in an unsecured location",
    ]
}
