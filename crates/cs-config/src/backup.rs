//! Timestamped, version-tagged configuration backups.
//!
//! Backups are full verbatim copies of the original configuration text, not
//! the tolerant-parsed subset. Each upgrade writes one timestamped copy named
//! with the version being replaced, and overwrites a fixed "most recent"
//! pointer copy. Nothing here prunes old backups; retention is an
//! operational concern outside this tool.

use cs_common::{Error, Result, Version};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Fixed name of the "most recent" pointer copy.
pub const LATEST_BACKUP_NAME: &str = "config-latest.json";

/// Paths of one completed backup.
#[derive(Debug, Clone)]
pub struct BackupRecord {
    /// Timestamped, version-tagged copy.
    pub timestamped: PathBuf,
    /// The fixed "most recent" copy, overwritten on every backup.
    pub latest: PathBuf,
}

/// Store of configuration backups under one directory.
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Back up raw configuration text for the given installed version.
    ///
    /// Writes `config-<version>-<timestamp>.json` and overwrites
    /// `config-latest.json`; both byte-identical to `raw`.
    pub fn backup(&self, raw: &str, version: &Version) -> Result<BackupRecord> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| Error::BackupFailed(format!("{}: {e}", self.dir.display())))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
        let timestamped = self.dir.join(format!("config-{version}-{timestamp}.json"));
        let latest = self.dir.join(LATEST_BACKUP_NAME);

        fs::write(&timestamped, raw)
            .map_err(|e| Error::BackupFailed(format!("{}: {e}", timestamped.display())))?;
        fs::write(&latest, raw)
            .map_err(|e| Error::BackupFailed(format!("{}: {e}", latest.display())))?;

        info!(
            path = %timestamped.display(),
            version = %version,
            bytes = raw.len(),
            "configuration backed up"
        );

        Ok(BackupRecord { timestamped, latest })
    }

    /// Read the "most recent" backup, if any.
    pub fn read_latest(&self) -> Option<String> {
        fs::read_to_string(self.dir.join(LATEST_BACKUP_NAME)).ok()
    }

    /// List timestamped backup paths, newest first.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if name.starts_with("config-") && name != LATEST_BACKUP_NAME {
                backups.push(path);
            }
        }

        // The timestamp suffix sorts lexicographically.
        backups.sort();
        backups.reverse();
        Ok(backups)
    }
}
