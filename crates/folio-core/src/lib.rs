//! Folio Core - admin authentication for the Folio portfolio site
//!
//! This crate holds everything the admin area needs to decide who gets in:
//! - The single admin credential and its change timestamp
//! - Failed-attempt tracking and the time-window lockout gate
//! - Password policy validation and advisory password aging
//! - Pass/fail checks for admin uploads
//!
//! All state lives in a local key-value store ([`store::KeyValueStore`]);
//! there is no network I/O. Operations are synchronous and assume a single
//! writer.

pub mod attempts;
pub mod auth;
pub mod clock;
pub mod config;
pub mod credential;
pub mod error;
pub mod lockout;
pub mod notice;
pub mod policy;
pub mod store;
pub mod upload;

pub use attempts::{AttemptLedger, LoginAttempts};
pub use auth::{AuthService, AuthState, LoginOutcome, PasswordChange};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::AuthConfig;
pub use credential::{CredentialStore, Secret};
pub use error::{Error, Result, StoreError};
pub use lockout::{LockoutPolicy, LockoutStatus};
pub use notice::{MemoryNotifier, Notice, Notifier, Severity, TracingNotifier};
pub use policy::{validate, PolicyReport, PolicyViolation};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use upload::{check_upload, UploadKind, UploadRejection};
