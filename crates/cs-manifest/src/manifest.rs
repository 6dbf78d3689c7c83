//! Update manifest types and serialization.
//!
//! The published manifest carries:
//! - The new version and distribution type (differential files or full installer)
//! - File listing with SHA-256 checksums, protected paths excluded
//! - Deletion list for files absent from the new tree
//! - Fallback full-installer location and hash, always present

use cs_common::paths::{fold_key, is_protected};
use cs_common::{Error, Result, Version};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Manifest file name at the publish location.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// How a client applies this release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
    /// Differential: fetch changed files from `base_url`, apply `delete`.
    Files,
    /// Full package only: download and run the installer at `url`.
    Installer,
}

/// File entry in the manifest with checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the install root, forward-slash separated.
    pub path: String,

    /// SHA-256 checksum (64 hex characters).
    pub sha256: String,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, sha256: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sha256: sha256.into(),
        }
    }

    /// Compute the SHA-256 checksum of in-memory data.
    pub fn compute_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }
}

/// The single published descriptor for the latest version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateManifest {
    /// Version this manifest describes.
    pub version: Version,

    /// Distribution type.
    #[serde(rename = "type")]
    pub kind: ManifestKind,

    /// Location files are fetched from when `type = files`.
    pub base_url: String,

    /// Every file in the new tree, protected paths excluded.
    pub files: Vec<FileEntry>,

    /// Relative paths present in the previous tree and absent from the new
    /// one, protected paths excluded.
    pub delete: Vec<String>,

    /// The client must not allow skipping this update.
    pub mandatory: bool,

    /// Release notes shown to the user.
    pub notes: String,

    /// Fallback full-installer location, always present.
    pub url: String,

    /// SHA-256 of the fallback installer artifact.
    pub sha256: String,
}

impl UpdateManifest {
    /// Sort file and delete entries for deterministic output.
    pub fn sort_entries(&mut self) {
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
        self.delete.sort();
    }

    /// Find a file entry by exact path.
    pub fn find_file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Validate structural invariants.
    ///
    /// `files` and `delete` must be disjoint under case folding, no
    /// protected path may appear in either, checksums must be 64 hex
    /// characters, and the fallback installer location and hash must be
    /// present and well-formed.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::InvalidManifest(
                "fallback installer url is empty".to_string(),
            ));
        }
        if !is_hex64(&self.sha256) {
            return Err(Error::InvalidManifest(format!(
                "fallback installer sha256 is not 64 hex characters: {:?}",
                self.sha256
            )));
        }
        if self.kind == ManifestKind::Files && self.base_url.trim().is_empty() {
            return Err(Error::InvalidManifest(
                "base_url is empty for a differential manifest".to_string(),
            ));
        }

        let mut file_keys = HashSet::new();
        for entry in &self.files {
            if entry.path.is_empty() {
                return Err(Error::InvalidManifest("file entry has empty path".into()));
            }
            if !is_hex64(&entry.sha256) {
                return Err(Error::InvalidManifest(format!(
                    "file '{}' has invalid checksum",
                    entry.path
                )));
            }
            if is_protected(&entry.path) {
                return Err(Error::InvalidManifest(format!(
                    "protected path '{}' in files",
                    entry.path
                )));
            }
            if !file_keys.insert(fold_key(&entry.path)) {
                return Err(Error::InvalidManifest(format!(
                    "duplicate file entry '{}'",
                    entry.path
                )));
            }
        }

        for path in &self.delete {
            if is_protected(path) {
                return Err(Error::InvalidManifest(format!(
                    "protected path '{path}' in delete"
                )));
            }
            if file_keys.contains(&fold_key(path)) {
                return Err(Error::InvalidManifest(format!(
                    "path '{path}' appears in both files and delete"
                )));
            }
        }

        Ok(())
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn is_hex64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}
