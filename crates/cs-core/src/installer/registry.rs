//! Installation registry record.
//!
//! The registry is a small read-only JSON file the packaging toolchain
//! writes at install time. Its presence is the sole signal that a prior
//! installation exists; its contents locate the install directory and name
//! the installed version.

use cs_common::{Result, Version};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One installed instance as recorded by the packaging toolchain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallRecord {
    /// Root of the installed application tree.
    pub install_dir: PathBuf,
    /// Version that was placed there.
    pub version: Version,
    /// Command line to invoke the native uninstaller, if one is registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninstall_command: Option<String>,
}

/// Read the install record, if a usable one exists.
///
/// An absent file means no prior installation. An unreadable or malformed
/// file is logged and treated the same way; the installer then runs the
/// fresh-install path rather than guessing at a half-known prior state.
pub fn read_record(path: &Path) -> Option<InstallRecord> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %err, "registry unreadable, ignoring");
            }
            return None;
        }
    };

    match serde_json::from_str::<InstallRecord>(&raw) {
        Ok(record) => {
            debug!(
                install_dir = %record.install_dir.display(),
                version = %record.version,
                "prior installation found"
            );
            Some(record)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "registry malformed, ignoring");
            None
        }
    }
}

/// Write an install record, creating parent directories as needed.
///
/// The packaging toolchain owns the registry; the lifecycle flows here only
/// ever read it. This helper exists for that toolchain and for tests.
pub fn write_record(path: &Path, record: &InstallRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(record)?)?;
    Ok(())
}
