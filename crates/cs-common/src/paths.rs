//! Relative-path canonicalization and the protected-path policy.
//!
//! Paths inside a release tree are always handled as forward-slash relative
//! paths. Case is preserved in stored paths; comparison uses a case-folded
//! key so a tree built on a case-insensitive filesystem diffs correctly.
//!
//! Protected paths hold user-generated state (the local database and its
//! journal siblings, logs, updater state). They are never included in a
//! published package and never deleted by an upgrade.

use std::path::{Path, PathBuf};

/// Exact protected files, relative to the install root.
pub const PROTECTED_FILES: &[&str] = &[
    "sqlModels/app.sqlite3",
    "sqlModels/app.sqlite3-wal",
    "sqlModels/app.sqlite3-shm",
];

/// Protected directory prefixes, relative to the install root.
pub const PROTECTED_PREFIXES: &[&str] = &["logs/", "updater/"];

/// Convert a relative path to its canonical forward-slash form.
pub fn canonical_rel(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}

/// Case-folded comparison key for a canonical relative path.
pub fn fold_key(rel: &str) -> String {
    rel.to_lowercase()
}

/// Whether a canonical relative path is protected.
///
/// Matching is case-folded, like all tree comparisons.
pub fn is_protected(rel: &str) -> bool {
    let key = fold_key(rel);
    if PROTECTED_FILES.iter().any(|p| fold_key(p) == key) {
        return true;
    }
    PROTECTED_PREFIXES
        .iter()
        .any(|prefix| key.starts_with(&fold_key(prefix)))
}

/// Application data locations used by the installer and uninstaller.
///
/// The registry, configuration backups, and updater state live under the
/// platform data directory; user documents live under the documents
/// directory. Both roots can be overridden, which is how tests isolate
/// themselves from the host machine.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_root: PathBuf,
    pub documents_root: PathBuf,
}

impl AppPaths {
    /// Discover the standard per-user locations.
    pub fn discover() -> Self {
        let data_root = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Cotizador");
        let documents_root = dirs::document_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Cotizaciones");
        Self {
            data_root,
            documents_root,
        }
    }

    /// Place every location under a single root.
    pub fn under(root: &Path) -> Self {
        Self {
            data_root: root.join("data"),
            documents_root: root.join("documents"),
        }
    }

    /// Read-only install record written by the packaging toolchain.
    pub fn registry_file(&self) -> PathBuf {
        self.data_root.join("registry").join("install.json")
    }

    /// Timestamped configuration backups and the "latest" pointer copy.
    pub fn backups_dir(&self) -> PathBuf {
        self.data_root.join("config-backups")
    }

    /// Updater scratch state.
    pub fn updater_dir(&self) -> PathBuf {
        self.data_root.join("updater")
    }

    /// Application log output.
    pub fn logs_dir(&self) -> PathBuf {
        self.documents_root.join("logs")
    }
}

/// User-visible configuration directory inside an install root.
pub fn config_dir(install_dir: &Path) -> PathBuf {
    install_dir.join("config")
}

/// Path of the configuration snapshot inside an install root.
pub fn config_file(install_dir: &Path) -> PathBuf {
    config_dir(install_dir).join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_rel_uses_forward_slashes() {
        let p = Path::new("sqlModels").join("app.sqlite3");
        assert_eq!(canonical_rel(&p), "sqlModels/app.sqlite3");
    }

    #[test]
    fn test_is_protected_exact_files() {
        assert!(is_protected("sqlModels/app.sqlite3"));
        assert!(is_protected("sqlModels/app.sqlite3-wal"));
        assert!(is_protected("sqlModels/app.sqlite3-shm"));
        assert!(!is_protected("sqlModels/schema.sql"));
    }

    #[test]
    fn test_is_protected_is_case_folded() {
        assert!(is_protected("SQLMODELS/APP.SQLITE3"));
        assert!(is_protected("Logs/app.log"));
    }

    #[test]
    fn test_is_protected_prefixes() {
        assert!(is_protected("logs/2025-08-01.log"));
        assert!(is_protected("updater/pending.json"));
        assert!(!is_protected("templates/logo.png"));
    }

    #[test]
    fn test_app_paths_under_root() {
        let root = Path::new("/tmp/x");
        let paths = AppPaths::under(root);
        assert!(paths.registry_file().starts_with(root));
        assert!(paths.backups_dir().starts_with(root));
        assert!(paths.logs_dir().starts_with(root));
    }
}
