use super::types::*;
use crate::error_handling::types::ConfigError;
use crate::storage::types::is_valid_name_segment;
use log::{debug, error};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration structure that defines all runtime parameters.
///
/// It is read from a TOML file with [`Config::from_file`]; every key is
/// optional and falls back to the defaults below. Command-line flags are
/// applied on top with [`Config::apply_overrides`].
///
/// # Examples
///
/// ```
/// use recall::configuration::config::Config;
///
/// let config: Config = toml::from_str("[capture]\ninterval_secs = 5").unwrap();
/// assert_eq!(config.capture.interval_secs, 5);
/// assert_eq!(config.retention.default_capacity, 100);
/// ```
///
/// # Fields Overview
///
/// - `data_dir`: root of everything the application persists
/// - `snapshot_dir`: artifact directory, relative to `data_dir`
/// - `descriptions_file`: description store, inside `snapshot_dir`
/// - `settings_file`: persisted control state, inside `data_dir`
/// - `capture`, `ocr`, `retention`, `web`: see [`super::types`]
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data_dir: PathBuf,
    pub snapshot_dir: PathBuf,
    pub descriptions_file: String,
    pub settings_file: String,
    pub capture: CaptureConfig,
    pub ocr: OcrConfig,
    pub retention: RetentionConfig,
    pub web: WebConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            snapshot_dir: PathBuf::from("snapshots"),
            descriptions_file: String::from("ocr_descriptions.txt"),
            settings_file: String::from("settings.json"),
            capture: CaptureConfig::default(),
            ocr: OcrConfig::default(),
            retention: RetentionConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl Config {
    /// Reads and validates a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            error!("Unable to read configuration {}: {}", path.display(), e);
            ConfigError::IoError(e)
        })?;
        let config: Config = toml::from_str(&raw).map_err(|e| {
            error!("Unable to parse configuration {}: {}", path.display(), e);
            ConfigError::TomlError(e.to_string())
        })?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Applies command-line values over the file values.
    pub fn apply_overrides(&mut self, data_dir: Option<PathBuf>, port: Option<u16>) {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(port) = port {
            self.web.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.interval_secs == 0 {
            return Err(ConfigError::NotInRange(
                "capture.interval_secs must be at least 1".to_string(),
            ));
        }
        if self.retention.max_capacity == 0 {
            return Err(ConfigError::NotInRange(
                "retention.max_capacity must be at least 1".to_string(),
            ));
        }
        if self.retention.default_capacity == 0
            || self.retention.default_capacity > self.retention.max_capacity
        {
            return Err(ConfigError::NotInRange(format!(
                "retention.default_capacity must be within 1..={}",
                self.retention.max_capacity
            )));
        }
        if !is_valid_name_segment(&self.capture.prefix) {
            return Err(ConfigError::InvalidValue(format!(
                "capture.prefix {:?} must only contain letters, digits and '-'",
                self.capture.prefix
            )));
        }
        if !is_valid_name_segment(&self.capture.extension) {
            return Err(ConfigError::InvalidValue(format!(
                "capture.extension {:?} must only contain letters, digits and '-'",
                self.capture.extension
            )));
        }
        if self.capture.command.is_empty() {
            return Err(ConfigError::InvalidValue("capture.command is empty".to_string()));
        }
        if self.ocr.command.is_empty() {
            return Err(ConfigError::InvalidValue("ocr.command is empty".to_string()));
        }
        if self.descriptions_file.trim().is_empty() || self.settings_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "descriptions_file and settings_file must be named".to_string(),
            ));
        }
        Ok(())
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_dir)
    }

    pub fn descriptions_path(&self) -> PathBuf {
        self.snapshot_path().join(&self.descriptions_file)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(&self.settings_file)
    }

    pub fn capture_interval(&self) -> Duration {
        Duration::from_secs(self.capture.interval_secs)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture.timeout_secs)
    }

    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_secs(self.ocr.timeout_secs)
    }
}
