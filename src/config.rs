//! Application configuration.
//!
//! Layering (later wins): built-in defaults, optional TOML file,
//! `FINANCE__*` environment variables.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "finance.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file holding users, transactions and budgets.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    /// Directory receiving timestamped snapshots.
    #[serde(default = "default_backup_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("finance.db")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: default_backup_dir(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path` (or `finance.toml` when `None`) and the environment.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("FINANCE").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Apply command-line overrides on top of the loaded values
    pub fn with_overrides(mut self, db: Option<PathBuf>, backup_dir: Option<PathBuf>) -> Self {
        if let Some(db) = db {
            self.database.path = db;
        }
        if let Some(dir) = backup_dir {
            self.backup.dir = dir;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.database.path, PathBuf::from("finance.db"));
        assert_eq!(cfg.backup.dir, PathBuf::from("backups"));
        assert_eq!(cfg.log.level, "warn");
    }

    #[test]
    fn test_load_from_file_with_partial_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finance.toml");
        fs::write(
            &path,
            "[database]\npath = \"/tmp/ledger.db\"\n\n[log]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(cfg.database.path, PathBuf::from("/tmp/ledger.db"));
        assert_eq!(cfg.log.level, "debug");
        // Unspecified section falls back to its default
        assert_eq!(cfg.backup.dir, PathBuf::from("backups"));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(AppConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_overrides() {
        let cfg = AppConfig::default()
            .with_overrides(Some(PathBuf::from("other.db")), None);
        assert_eq!(cfg.database.path, PathBuf::from("other.db"));
        assert_eq!(cfg.backup.dir, PathBuf::from("backups"));
    }
}
