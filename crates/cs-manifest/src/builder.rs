//! Pure manifest assembly.
//!
//! Turning a diff into a publishable manifest performs no network or
//! filesystem access; it can only fail on structurally invalid input. The
//! caller serializes and writes the result as the very last pipeline step,
//! after every upstream step has succeeded.

use crate::diff::TreeDiff;
use crate::manifest::{ManifestKind, UpdateManifest};
use cs_common::{Result, Version};

/// Inputs to manifest assembly, gathered by the release pipeline.
#[derive(Debug, Clone)]
pub struct ManifestInputs<'a> {
    pub diff: &'a TreeDiff,
    pub version: Version,
    pub base_url: &'a str,
    pub installer_url: &'a str,
    pub installer_sha256: &'a str,
    pub mandatory: bool,
    pub notes: &'a str,
}

/// Assemble and validate an update manifest.
pub fn build_manifest(inputs: ManifestInputs<'_>) -> Result<UpdateManifest> {
    let mut manifest = UpdateManifest {
        version: inputs.version,
        kind: ManifestKind::Files,
        base_url: inputs.base_url.to_string(),
        files: inputs.diff.files.clone(),
        delete: inputs.diff.delete.clone(),
        mandatory: inputs.mandatory,
        notes: inputs.notes.to_string(),
        url: inputs.installer_url.to_string(),
        sha256: inputs.installer_sha256.to_string(),
    };

    manifest.sort_entries();
    manifest.validate()?;
    Ok(manifest)
}
