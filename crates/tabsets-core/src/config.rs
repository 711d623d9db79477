//! Tabsets configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tabsets_manager::ManagerOptions;

use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file holding the tabset slot
    pub database_path: PathBuf,
    /// Key of the slot inside the database
    pub store_key: String,
    /// How long to wait for each close to be confirmed
    pub close_timeout_ms: u64,
    /// Consecutive unconfirmed closes before giving up on a document
    pub close_stall_limit: u32,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        let defaults = ManagerOptions::default();

        Self {
            database_path: data_dir.join("tabsets.db"),
            store_key: defaults.store_key,
            close_timeout_ms: defaults.close_timeout.as_millis() as u64,
            close_stall_limit: defaults.close_stall_limit,
        }
    }

    /// Read a JSON config file; a missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file; using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.store_key.trim().is_empty() {
            return Err(crate::CoreError::Config(
                "store_key cannot be empty".to_string(),
            ));
        }
        if self.close_timeout_ms == 0 {
            return Err(crate::CoreError::Config(
                "close_timeout_ms must be positive".to_string(),
            ));
        }
        if self.close_stall_limit == 0 {
            return Err(crate::CoreError::Config(
                "close_stall_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn manager_options(&self) -> ManagerOptions {
        ManagerOptions {
            store_key: self.store_key.clone(),
            close_timeout: Duration::from_millis(self.close_timeout_ms),
            close_stall_limit: self.close_stall_limit,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("tabsets"))
            .unwrap_or_else(|| PathBuf::from(".tabsets"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
