//! Configuration file support for watch-progress.
//!
//! This module provides functionality for loading and saving user preferences
//! from a TOML configuration file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::error::Result;
use crate::store::Library;

/// User configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Library file location (overrides the platform data directory)
    #[serde(default)]
    pub store_path: Option<String>,

    /// Directory holding `<show_id>.json` metadata files
    #[serde(default = "default_metadata_dir")]
    pub metadata_dir: String,

    /// Apply bulk plans without asking for `--yes`
    #[serde(default)]
    pub auto_confirm: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn default_metadata_dir() -> String {
    ".".to_string()
}

impl Config {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self {
            store_path: None,
            metadata_dir: default_metadata_dir(),
            auto_confirm: false,
        }
    }

    /// Get the path to the config file.
    ///
    /// Returns ~/.config/watch-progress/config.toml on Linux,
    /// or a platform-appropriate location on other systems.
    pub fn get_config_path() -> std::result::Result<PathBuf, io::Error> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Could not find config directory")
            })?
            .join("watch-progress");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::get_config_path()?;

        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = Self::get_config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Create a default config file if one doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn create_default_if_missing() -> Result<PathBuf> {
        let path = Self::get_config_path()?;

        if !path.exists() {
            let config = Self::new();
            config.save()?;
        }

        Ok(path)
    }

    /// Where the library file lives: the configured path, else the default.
    pub fn library_path(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(Library::default_path()?),
        }
    }

    /// Path of the metadata file for a show.
    pub fn metadata_path(&self, show_id: u64) -> PathBuf {
        PathBuf::from(&self.metadata_dir).join(format!("{}.json", show_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config_has_defaults() {
        let config = Config::new();
        assert!(config.store_path.is_none());
        assert_eq!(config.metadata_dir, ".");
        assert!(!config.auto_confirm);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config {
            store_path: Some("/tmp/library.json".to_string()),
            metadata_dir: "/srv/meta".to_string(),
            auto_confirm: true,
        };

        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("store_path = \"/tmp/library.json\""));
        assert!(toml_str.contains("metadata_dir = \"/srv/meta\""));
        assert!(toml_str.contains("auto_confirm = true"));
    }

    #[test]
    fn test_config_partial_deserialization() {
        let toml_str = r#"
            auto_confirm = true
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.auto_confirm);
        assert_eq!(config.metadata_dir, "."); // default
        assert!(config.store_path.is_none());
    }

    #[test]
    fn test_library_path_prefers_configured() {
        let mut config = Config::new();
        config.store_path = Some("/data/lib.json".to_string());
        assert_eq!(config.library_path().unwrap(), PathBuf::from("/data/lib.json"));
    }

    #[test]
    fn test_metadata_path() {
        let mut config = Config::new();
        config.metadata_dir = "meta".to_string();
        assert_eq!(config.metadata_path(1399), PathBuf::from("meta/1399.json"));
    }
}
