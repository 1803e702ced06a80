//! Error types for the Folio authentication core
//!
//! Failed logins, lockouts and rejected password changes are ordinary
//! outcomes and are reported through [`crate::auth::LoginOutcome`] and
//! [`crate::auth::PasswordChange`]. The types here cover infrastructure
//! faults only.

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the authentication core
#[derive(Debug, Error)]
pub enum Error {
    /// Persistence failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Errors raised by a [`crate::store::KeyValueStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Store file could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A persisted value did not have the expected shape
    #[error("Corrupt value for key '{key}': {value:?}")]
    Corrupt { key: String, value: String },

    /// The store lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
