//! Configuration file and data directory resolution.
//!
//! Service settings follow a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! This module supplies the platform default locations and the TOML loading
//! primitive; each service defines its own typed config on top.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Directory name under the platform config/data directories.
pub const APP_DIR: &str = "notegate";

/// Default configuration file name.
pub const CONFIG_FILE: &str = "notegate.toml";

/// Default database file name.
pub const DATABASE_FILE: &str = "notegate.db";

/// Default config file path: `<OS config dir>/notegate/notegate.toml`.
///
/// Falls back to the current directory when the platform reports no
/// config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Default database path: `<OS data dir>/notegate/notegate.db`.
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(DATABASE_FILE)
}

/// Read and deserialize a TOML configuration file.
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_end_with_app_files() {
        assert!(default_config_path().ends_with("notegate/notegate.toml"));
        assert!(default_database_path().ends_with("notegate/notegate.db"));
    }
}
