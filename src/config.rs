//! Settings module
//!
//! This module loads the pilot's settings from a JSON file in the system's
//! standard configuration directory. A missing file or missing fields fall
//! back to defaults.

use crate::api::SubtitleLanguage;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading or saving settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine configuration directory location
    #[error("Failed to determine configuration directory location")]
    ConfigDirectoryNotFound,

    /// Failed to create the configuration directory
    #[error("Failed to create configuration directory at {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read the settings file
    #[error("Failed to read settings file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write the settings file
    #[error("Failed to write settings file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The settings file is not valid JSON
    #[error("Failed to parse settings file {path}: {source}")]
    DeserializationFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to serialize settings
    #[error("Failed to serialize settings: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Runtime settings of the pilot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the mediamm server
    pub base_url: String,
    /// Library root scanned when none is given on the command line
    pub default_root: Option<String>,
    /// Language requested for subtitle downloads
    pub subtitle_language: SubtitleLanguage,
    /// Upper bound for a single HTTP request
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8003".to_string(),
            default_root: None,
            subtitle_language: SubtitleLanguage::default(),
            request_timeout_secs: 15,
        }
    }
}

impl Settings {
    /// Location of the settings file
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs = directories::ProjectDirs::from("org", "mediamm", "mediamm-pilot")
            .ok_or(ConfigError::ConfigDirectoryNotFound)?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Loads the settings file, or the defaults if there is none
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::DeserializationFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Writes the settings as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| ConfigError::DirectoryCreationFailed {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;

        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
