//! Configuration management for Faraday
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::error::{FaradayError, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Supplier API client configuration
    pub api: ApiConfig,

    /// Timeline storage configuration
    pub storage: StorageConfig,

    /// Economy 7 day/night window configuration
    pub economy7: Economy7Config,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Supplier rate-API client parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the supplier API
    pub base_url: String,

    /// API key; the public tariff endpoints work without one
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

/// Timeline storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the timeline JSON document
    pub file: String,
}

/// Economy 7 day/night window.
///
/// The night register applies inside `[night_start, night_end)` wall-clock
/// time; a window with `night_start > night_end` wraps midnight. This is
/// operator configuration, not an astronomical computation, because the
/// boundary varies by region and meter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Economy7Config {
    /// Start of the night register window (inclusive)
    pub night_start: NaiveTime,

    /// End of the night register window (exclusive)
    pub night_end: NaiveTime,
}

impl Economy7Config {
    /// Whether a wall-clock time falls in the night window
    pub fn is_night(&self, time: NaiveTime) -> bool {
        if self.night_start <= self.night_end {
            self.night_start <= time && time < self.night_end
        } else {
            // Window wraps midnight
            time >= self.night_start || time < self.night_end
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Directory (or file path whose parent is used) for rolling log files
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.octopus.energy/v1".to_string(),
            api_key: None,
            timeout_secs: 30,
            user_agent: "faraday/0.3".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file: "tariff_timelines.json".to_string(),
        }
    }
}

impl Default for Economy7Config {
    fn default() -> Self {
        // Typical UK Economy 7 night window
        Self {
            night_start: NaiveTime::from_hms_opt(0, 30, 0).unwrap_or_default(),
            night_end: NaiveTime::from_hms_opt(7, 30, 0).unwrap_or_default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/faraday.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default locations, falling back to defaults
    pub fn load() -> Result<Self> {
        let default_paths = [
            "faraday_config.yaml",
            "/data/faraday_config.yaml",
            "/etc/faraday/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(FaradayError::validation(
                "api.base_url",
                "Base URL cannot be empty",
            ));
        }

        if self.api.timeout_secs == 0 {
            return Err(FaradayError::validation(
                "api.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }

        if self.storage.file.is_empty() {
            return Err(FaradayError::validation(
                "storage.file",
                "Storage path cannot be empty",
            ));
        }

        if self.economy7.night_start == self.economy7.night_end {
            return Err(FaradayError::validation(
                "economy7",
                "Night window cannot be empty",
            ));
        }

        Ok(())
    }
}
