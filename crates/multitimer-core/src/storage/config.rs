//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Tick cadence of the scheduler
//! - Authoring rules for new timers (minimum duration, suggested categories)
//! - Which notification events reach front ends
//! - Location of the SQLite store
//!
//! Configuration is stored at `~/.config/multitimer/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_cadence_ms")]
    pub cadence_ms: u64,
}

/// Timer authoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimersConfig {
    /// New timers must last strictly longer than this many seconds.
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: u64,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_category")]
    pub default_category: String,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub halfway: bool,
    #[serde(default = "default_true")]
    pub completion: bool,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Overrides `~/.config/multitimer/multitimer.db`.
    #[serde(default)]
    pub database: Option<PathBuf>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/multitimer/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub timers: TimersConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

// Default functions
fn default_cadence_ms() -> u64 {
    1000
}
fn default_min_duration_secs() -> u64 {
    10
}
fn default_categories() -> Vec<String> {
    vec!["Workout".into(), "Study".into(), "Break".into()]
}
fn default_category() -> String {
    "Workout".into()
}
fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cadence_ms: default_cadence_ms(),
        }
    }
}

impl Default for TimersConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: default_min_duration_secs(),
            categories: default_categories(),
            default_category: default_category(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            halfway: true,
            completion: true,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Array(_) => {
                        if value.trim_start().starts_with('[') {
                            serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                        } else {
                            serde_json::Value::Array(
                                value
                                    .split(',')
                                    .map(str::trim)
                                    .filter(|s| !s.is_empty())
                                    .map(|s| serde_json::Value::String(s.to_string()))
                                    .collect(),
                            )
                        }
                    }
                    serde_json::Value::Object(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Default location of the config file.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("~/.config/multitimer"),
                message: e.to_string(),
            })
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    /// A file that exists but cannot be read is left untouched.
    ///
    /// # Errors
    /// Same as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    /// Same as [`Config::save`].
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if key is unknown
    /// or the result would be invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// or fails validation.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check the values an engine cannot run with.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.cadence_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "engine.cadence_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.timers.default_category.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "timers.default_category".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.engine.cadence_ms)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}
