//! TOML-based application configuration.
//!
//! Stores operator preferences that are not part of the shared entity
//! state:
//! - Default blocking start time and the disarm/arm settle delay
//! - Shield policy store name
//! - Optional secondary scope for diagnostic selection copies
//! - Logging preferences
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::data_dir;
use crate::error::ConfigError;

/// Upper bound on the disarm-to-arm settle wait.
pub const MAX_ARM_SETTLE_MS: u64 = 5_000;

/// Schedule-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_start_hour")]
    pub default_start_hour: u32,
    #[serde(default = "default_start_minute")]
    pub default_start_minute: u32,
    /// Bounded wait between disarming and re-arming, in milliseconds.
    #[serde(default = "default_arm_settle_ms")]
    pub arm_settle_ms: u64,
}

/// Blocking capability provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShieldConfig {
    /// Named policy store the shield is scoped to.
    #[serde(default = "default_policy_store")]
    pub policy_store: String,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory for the secondary selection copy. Disabled when unset.
    #[serde(default)]
    pub secondary_scope: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub file_logging: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub shield: ShieldConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_start_hour() -> u32 {
    14
}
fn default_start_minute() -> u32 {
    37
}
fn default_arm_settle_ms() -> u64 {
    250
}
fn default_policy_store() -> String {
    "versegate".into()
}
fn default_true() -> bool {
    true
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            default_start_hour: default_start_hour(),
            default_start_minute: default_start_minute(),
            arm_settle_ms: default_arm_settle_ms(),
        }
    }
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            policy_store: default_policy_store(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { file_logging: true }
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
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => serde_json::Value::Number(
                    value
                        .parse::<u64>()
                        .map_err(|e| invalid(e.to_string()))?
                        .into(),
                ),
                // Optional strings serialize as null when unset.
                serde_json::Value::Null | serde_json::Value::String(_) => {
                    if value.is_empty() {
                        serde_json::Value::Null
                    } else {
                        serde_json::Value::String(value.into())
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, returning defaults on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
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

    /// Set a config value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.schedule;
        if s.default_start_hour > 23
            || s.default_start_minute > 59
            || (s.default_start_hour, s.default_start_minute) >= (23, 59)
        {
            return Err(ConfigError::InvalidValue {
                key: "schedule".into(),
                message: format!(
                    "default start {:02}:{:02} must be before 23:59",
                    s.default_start_hour, s.default_start_minute
                ),
            });
        }
        if s.arm_settle_ms > MAX_ARM_SETTLE_MS {
            return Err(ConfigError::InvalidValue {
                key: "schedule.arm_settle_ms".into(),
                message: format!("must be at most {MAX_ARM_SETTLE_MS}"),
            });
        }
        if self.shield.policy_store.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "shield.policy_store".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Disarm-to-arm settle delay, capped even for a hand-edited file.
    pub fn arm_settle(&self) -> Duration {
        Duration::from_millis(self.schedule.arm_settle_ms.min(MAX_ARM_SETTLE_MS))
    }

    /// Secondary scope directory, if configured.
    pub fn secondary_scope(&self) -> Option<PathBuf> {
        self.storage.secondary_scope.as_ref().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.schedule.default_start_hour, 14);
        assert_eq!(parsed.schedule.default_start_minute, 37);
        assert_eq!(parsed.shield.policy_store, "versegate");
    }

    #[test]
    fn empty_file_uses_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.schedule.arm_settle_ms, 250);
        assert!(parsed.logging.file_logging);
        assert!(parsed.storage.secondary_scope.is_none());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("schedule.arm_settle_ms").as_deref(), Some("250"));
        assert_eq!(cfg.get("shield.policy_store").as_deref(), Some("versegate"));
        assert!(cfg.get("schedule.missing_key").is_none());
    }

    #[test]
    fn apply_updates_number_bool_and_string() {
        let mut cfg = Config::default();
        cfg.apply("schedule.arm_settle_ms", "500").unwrap();
        cfg.apply("logging.file_logging", "false").unwrap();
        cfg.apply("shield.policy_store", "devotional").unwrap();
        assert_eq!(cfg.arm_settle(), Duration::from_millis(500));
        assert!(!cfg.logging.file_logging);
        assert_eq!(cfg.shield.policy_store, "devotional");
    }

    #[test]
    fn apply_sets_and_clears_optional_scope() {
        let mut cfg = Config::default();
        cfg.apply("storage.secondary_scope", "/tmp/scope").unwrap();
        assert_eq!(cfg.secondary_scope(), Some(PathBuf::from("/tmp/scope")));
        cfg.apply("storage.secondary_scope", "").unwrap();
        assert!(cfg.secondary_scope().is_none());
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.apply("schedule.nonexistent", "1").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(_)));
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.apply("logging.file_logging", "not_a_bool").is_err());
        assert!(cfg.apply("schedule.arm_settle_ms", "soon").is_err());
    }

    #[test]
    fn apply_rejects_start_at_end_of_day() {
        let mut cfg = Config::default();
        cfg.apply("schedule.default_start_hour", "23").unwrap();
        assert!(cfg.apply("schedule.default_start_minute", "59").is_err());
        assert_eq!(cfg.schedule.default_start_minute, 37);
    }

    #[test]
    fn settle_delay_is_bounded() {
        let mut cfg = Config::default();
        let err = cfg
            .apply("schedule.arm_settle_ms", "18446744073709551615")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(cfg.schedule.arm_settle_ms, 250);

        cfg.apply("schedule.arm_settle_ms", "5000").unwrap();
        assert_eq!(cfg.arm_settle(), Duration::from_millis(5_000));

        let hand_edited: Config = toml::from_str("[schedule]\narm_settle_ms = 600000\n").unwrap();
        assert_eq!(hand_edited.arm_settle(), Duration::from_millis(MAX_ARM_SETTLE_MS));
    }
}
