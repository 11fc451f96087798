// 💾 Backup - timestamped copies of the database file
//
// Snapshots are plain file copies named
// `<db stem>_backup_<YYYY-MM-DD_HH-MM-SS>.db`, so they sort by time.

use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{FinanceError, Result};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Debug, Clone)]
pub struct BackupManager {
    db_path: PathBuf,
    backup_dir: PathBuf,
}

impl BackupManager {
    pub fn new(db_path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        BackupManager {
            db_path: db_path.into(),
            backup_dir: backup_dir.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    fn snapshot_name(&self, now: NaiveDateTime) -> String {
        let stem = self
            .db_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("finance");
        format!("{}_backup_{}.db", stem, now.format(TIMESTAMP_FORMAT))
    }

    /// Copy the database into the backup directory (created on demand).
    pub fn create_backup(&self, now: NaiveDateTime) -> Result<PathBuf> {
        if !self.db_path.exists() {
            return Err(FinanceError::not_found(format!(
                "Database file '{}' not found.",
                self.db_path.display()
            )));
        }

        fs::create_dir_all(&self.backup_dir)?;
        let target = self.backup_dir.join(self.snapshot_name(now));
        fs::copy(&self.db_path, &target)?;

        info!(path = %target.display(), "backup created");
        Ok(target)
    }

    /// `.db` files in the backup directory, oldest first.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>> {
        if !self.backup_dir.is_dir() {
            debug!(dir = %self.backup_dir.display(), "no backup directory");
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "db") {
                backups.push(path);
            }
        }
        backups.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(backups)
    }

    /// Overwrite the database with a snapshot.
    pub fn restore(&self, backup: &Path) -> Result<()> {
        if !backup.is_file() {
            return Err(FinanceError::not_found(format!(
                "Backup file '{}' not found.",
                backup.display()
            )));
        }

        fs::copy(backup, &self.db_path)?;
        info!(from = %backup.display(), to = %self.db_path.display(), "database restored");
        Ok(())
    }
}

/// File name of a backup path, for menus.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
