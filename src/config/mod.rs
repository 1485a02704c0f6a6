//! Configuration module
//!
//! Handles viewer settings persisted under the platform config directory.

mod settings;

pub use settings::{ConfigError, DisplayConfig, SnifferConfig};

use directories::ProjectDirs;
use std::path::PathBuf;

/// Get the application configuration directory.
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("org", "mountainsensing", "LowpanSniff")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the application data directory (recorded capture logs live here).
pub fn data_dir() -> Option<PathBuf> {
    ProjectDirs::from("org", "mountainsensing", "LowpanSniff")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Initialize application directories.
pub fn init_directories() -> std::io::Result<()> {
    if let Some(dir) = config_dir() {
        std::fs::create_dir_all(&dir)?;
    }
    if let Some(dir) = data_dir() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}
