//! Configuration file handling for ixc
//!
//! The stored config carries the registered charger's serial number and the
//! API key the setup (or last successful re-auth) flow validated.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ixc_core::{ApiKey, SerialNumber};

/// Persisted CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// The registered charger, if setup has run
    pub device: Option<DeviceConfig>,
    /// Vendor API base URL override (staging, local mock)
    pub base_url: Option<String>,
}

/// One registered charger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub serial_number: SerialNumber,
    pub api_key: ApiKey,
}

impl Config {
    /// Load configuration from the given path, or the default location.
    /// A missing file is an empty config, not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Store configuration, creating the parent directory if needed.
    pub fn store(&self, path: Option<&Path>) -> Result<()> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("failed to encode config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write config file: {}", path.display()))
    }

    /// Default config file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine config directory")?
            .join("ixc");
        Ok(config_dir.join("config.toml"))
    }

    /// The registered device, or a hint to run setup first.
    pub fn device(&self) -> Result<&DeviceConfig> {
        self.device
            .as_ref()
            .context("no charger registered; run `ixc setup <serial> --api-key <key>` first")
    }
}
