//! Configuration management for the Evitrack CLI
//!
//! Settings come from defaults, then `EVITRACK_*` environment variables, then
//! global command-line flags.

use crate::error::{Result, TrackerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Overrides the data directory
pub const DATA_DIR_ENV: &str = "EVITRACK_DATA_DIR";

/// Overrides where downloads are saved
pub const DOWNLOAD_DIR_ENV: &str = "EVITRACK_DOWNLOAD_DIR";

/// Path to a YAML catalog used instead of the built-in ones
pub const CATALOG_ENV: &str = "EVITRACK_CATALOG";

/// Database file inside the data directory
pub const DB_FILE_NAME: &str = "evitrack.db";

/// Keys accepted by `evitrack config get`
pub const CONFIG_KEYS: &[&str] = &["data_dir", "download_dir", "catalog", "db_path"];

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the key/value database lives
    pub data_dir: PathBuf,

    /// Where downloads are saved; `<data_dir>/downloads` when unset
    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    /// Custom catalog file
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

impl Config {
    /// Create a config with default values
    pub fn new() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| TrackerError::config("Could not determine data directory"))?
            .join("evitrack");

        Ok(Self {
            data_dir,
            download_dir: None,
            catalog_path: None,
        })
    }

    /// Load config from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::default().merge_env())
    }

    fn merge_env(mut self) -> Self {
        if let Some(dir) = non_empty_env(DATA_DIR_ENV) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = non_empty_env(DOWNLOAD_DIR_ENV) {
            self.download_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = non_empty_env(CATALOG_ENV) {
            self.catalog_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Apply a `--data-dir` flag
    pub fn with_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.data_dir = dir;
        }
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("downloads"))
    }

    pub fn catalog_path(&self) -> Option<&Path> {
        self.catalog_path.as_deref()
    }

    /// Look up one setting by name, as printed by `config get`
    pub fn value_of(&self, key: &str) -> Result<String> {
        match key {
            "data_dir" => Ok(self.data_dir.display().to_string()),
            "download_dir" => Ok(self.download_dir().display().to_string()),
            "catalog" => Ok(self
                .catalog_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(built-in)".to_string())),
            "db_path" => Ok(self.db_path().display().to_string()),
            _ => Err(TrackerError::config(format!(
                "Unknown config key: {} (expected one of: {})",
                key,
                CONFIG_KEYS.join(", ")
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        // Without a platform data directory, fall back to a local one
        Self::new().unwrap_or_else(|_| Self {
            data_dir: PathBuf::from(".evitrack"),
            download_dir: None,
            catalog_path: None,
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
