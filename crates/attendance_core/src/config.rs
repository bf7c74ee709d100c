//! Runtime configuration resolved from environment variables.
//!
//! # Invariants
//! - Blank variables are treated as unset.
//! - Unset values fall back to documented defaults; malformed values are
//!   rejected rather than silently defaulted.

use crate::db::DbResult;
use crate::gateway::sqlite::{GatewayOptions, SqliteGateway};
use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "ATTENDANCE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "ATTENDANCE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ATTENDANCE_LOG_DIR";
pub const ENV_ADMIN: &str = "ATTENDANCE_ADMIN";

const DEFAULT_DB_FILE_NAME: &str = "attendance.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for {key}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings needed to compose the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite file backing the local gateway.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    /// Grants the gateway account-deletion rights (sign-up rollback).
    pub admin_privileges: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            admin_privileges: false,
        }
    }
}

impl AppConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&level)
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_LOG_LEVEL,
                    value: level.clone(),
                })?
                .to_string();
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(flag) = read(ENV_ADMIN) {
            config.admin_privileges = parse_flag(&flag).ok_or(ConfigError::InvalidValue {
                key: ENV_ADMIN,
                value: flag.clone(),
            })?;
        }

        Ok(config)
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            admin_privileges: self.admin_privileges,
        }
    }

    /// Opens the local gateway described by this configuration.
    pub fn open_gateway(&self) -> DbResult<SqliteGateway> {
        SqliteGateway::open(&self.db_path, self.gateway_options())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, ENV_ADMIN, ENV_DB_PATH, ENV_LOG_LEVEL};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(!config.admin_privileges);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn overrides_are_trimmed_and_normalized() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, " /data/attendance.db "),
            (ENV_LOG_LEVEL, "WARNING"),
            (ENV_ADMIN, "yes"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/attendance.db"));
        assert_eq!(config.log_level, "warn");
        assert!(config.admin_privileges);
        assert!(config.gateway_options().admin_privileges);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = AppConfig::from_lookup(lookup(&[(ENV_DB_PATH, "   ")])).unwrap();
        assert_eq!(config.db_path, AppConfig::default().db_path);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(ENV_ADMIN, "maybe")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: ENV_ADMIN,
                value: "maybe".to_string()
            }
        );
        assert!(AppConfig::from_lookup(lookup(&[(ENV_LOG_LEVEL, "verbose")])).is_err());
    }
}
