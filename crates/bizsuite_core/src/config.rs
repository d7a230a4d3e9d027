//! Core runtime configuration.
//!
//! Loaded from an optional JSON file, then overridden by environment
//! variables:
//! - `BIZSUITE_LOG_LEVEL`
//! - `BIZSUITE_LOG_DIR`
//! - `BIZSUITE_DB_PATH`

use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_LOG_LEVEL: &str = "BIZSUITE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "BIZSUITE_LOG_DIR";
pub const ENV_DB_PATH: &str = "BIZSUITE_DB_PATH";

const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub log_level: String,
    /// Absolute directory for rolling log files. Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// SQLite file path. An in-memory database is used when unset.
    pub database_path: Option<PathBuf>,
    /// Bound of the queued-dispatch channel.
    pub queue_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            database_path: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl CoreConfig {
    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Reads a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_json(&raw)
    }

    /// Defaults, an optional file, then process environment, validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies `BIZSUITE_*` overrides resolved through `lookup`.
    ///
    /// Blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(level) = read(ENV_LOG_LEVEL) {
            self.log_level = level.trim().to_string();
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(dir.trim()));
        }
        if let Some(path) = read(ENV_DB_PATH) {
            self.database_path = Some(PathBuf::from(path.trim()));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level).map_err(ConfigError::InvalidLogLevel)?;
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.clone()));
            }
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Parse(String),
    InvalidLogLevel(String),
    RelativeLogDir(PathBuf),
    ZeroQueueCapacity,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "cannot read config `{}`: {message}", path.display())
            }
            Self::Parse(message) => write!(f, "invalid config json: {message}"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::RelativeLogDir(dir) => {
                write!(f, "log_dir must be absolute, got `{}`", dir.display())
            }
            Self::ZeroQueueCapacity => write!(f, "queue_capacity must be at least 1"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_DB_PATH, ENV_LOG_LEVEL};
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn missing_fields_keep_defaults() {
        let config = CoreConfig::from_json(r#"{"queue_capacity": 8}"#).unwrap();
        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.log_level, CoreConfig::default().log_level);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            CoreConfig::from_json("{not json").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = CoreConfig::from_json(r#"{"log_level": "warn"}"#).unwrap();
        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_LOG_LEVEL, "error"), (ENV_DB_PATH, " /tmp/biz.sqlite3 ")]);

        config.apply_overrides(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.log_level, "error");
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/biz.sqlite3")));
    }

    #[test]
    fn blank_override_is_ignored() {
        let mut config = CoreConfig::default();
        config.apply_overrides(|_| Some("  ".to_string()));
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = CoreConfig::default();
        config.log_level = "verbose".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidLogLevel(_)
        ));

        let mut config = CoreConfig::default();
        config.log_dir = Some(PathBuf::from("logs"));
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::RelativeLogDir(_)
        ));

        let mut config = CoreConfig::default();
        config.queue_capacity = 0;
        assert_eq!(config.validate().unwrap_err(), ConfigError::ZeroQueueCapacity);
    }
}
