//! Viewer settings
//!
//! Persisted as TOML in the platform config directory. Capture state is
//! never saved; the registry lives and dies with the session.

use crate::core::source::SerialSourceConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The platform config directory could not be determined
    #[error("could not determine config directory")]
    NoConfigDir,

    /// Reading or writing the config file failed
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Serializing the config failed
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Viewer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnifferConfig {
    /// Serial source defaults used when the CLI gives no overrides
    pub serial: SerialSourceConfig,
    /// Display settings
    pub display: DisplayConfig,
    /// Recently used ports, most recent first
    pub recent_ports: Vec<String>,
}

impl Default for SnifferConfig {
    fn default() -> Self {
        Self {
            serial: SerialSourceConfig::default(),
            display: DisplayConfig::default(),
            recent_ports: Vec::new(),
        }
    }
}

/// Display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Show per-packet timestamps in the live feed
    pub show_timestamps: bool,
    /// Show RSSI/LQI in the live feed when the bridge reports them
    pub show_link_quality: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_timestamps: true,
            show_link_quality: false,
        }
    }
}

impl SnifferConfig {
    /// Load config from the platform config directory, or defaults when no
    /// file exists yet.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be determined or the file exists but
    /// cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the platform config directory.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be determined or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Record a port as recently used, keeping the list short.
    pub fn remember_port(&mut self, port: &str) {
        self.recent_ports.retain(|p| p != port);
        self.recent_ports.insert(0, port.to_string());
        self.recent_ports.truncate(5);
    }

    fn path() -> Result<PathBuf, ConfigError> {
        super::config_dir()
            .ok_or(ConfigError::NoConfigDir)
            .map(|dir| dir.join("config.toml"))
    }
}
