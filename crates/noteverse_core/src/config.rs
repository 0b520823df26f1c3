//! Environment-driven runtime configuration.
//!
//! # Responsibility
//! - Resolve database path and logging settings for process bootstrap.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - Resolution never fails; missing values fall back to defaults.

use crate::logging::default_log_level;
use std::path::PathBuf;

/// Env var holding the SQLite database file path.
pub const ENV_DB_PATH: &str = "NOTEVERSE_DB_PATH";
/// Env var holding the log level (`trace|debug|info|warn|error`).
pub const ENV_LOG_LEVEL: &str = "NOTEVERSE_LOG_LEVEL";
/// Env var holding the absolute log directory. Logging is off when unset.
pub const ENV_LOG_DIR: &str = "NOTEVERSE_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "noteverse.sqlite3";

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|trimmed| !trimmed.is_empty())
        };
        let defaults = Self::default();
        Self {
            db_path: value(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_level: value(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: value(ENV_LOG_DIR).map(PathBuf::from),
        }
    }
}
