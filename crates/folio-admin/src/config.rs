//! Admin console configuration
//!
//! Read from a TOML file. Every field is optional; missing values fall back
//! to the defaults below.
//!
//! ```toml
//! data_dir = "/home/me/.local/share/folio"
//! login_delay_ms = 1000
//!
//! [auth]
//! max_attempts = 5
//! lockout_window_secs = 900
//! password_max_age_days = 90
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use folio_core::AuthConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration directory under the platform config dir
const CONFIG_DIR_NAME: &str = "folio";

/// Configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Store file name inside `data_dir`
const STORE_FILE_NAME: &str = "store.json";

/// Errors loading or saving the admin configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error(transparent)]
    Invalid(#[from] folio_core::Error),
}

/// Admin console configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Directory holding the key-value store
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Artificial delay before a login result is reported
    #[serde(default = "default_login_delay_ms")]
    pub login_delay_ms: u64,

    /// Lockout and password settings
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            login_delay_ms: default_login_delay_ms(),
            auth: AuthConfig::default(),
        }
    }
}

impl AdminConfig {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.auth.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the default file if it exists, else defaults
    ///
    /// An explicitly named file must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Write the config as TOML
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Path of the key-value store file
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE_NAME)
    }

    pub fn login_delay(&self) -> Duration {
        Duration::from_millis(self.login_delay_ms)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

fn default_login_delay_ms() -> u64 {
    1000
}
