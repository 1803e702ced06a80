//! Folio Admin - command-line console for the Folio admin account
//!
//! Wraps [`folio_core`] with a TOML configuration file, a status report and
//! an interactive shell that hosts one admin session.

pub mod config;
pub mod report;
pub mod shell;

pub use config::{AdminConfig, ConfigError};
pub use shell::{Shell, ShellCommand};
