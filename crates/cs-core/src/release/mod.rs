//! Release pipeline: bump, build, diff, publish.
//!
//! One sequential pass per release. The previously published manifest in the
//! output directory is the source of the current version; the archived tree
//! beside it is the baseline for the differential. The new manifest is
//! written last, only after the tree has been published and archived, so a
//! failure anywhere earlier leaves the previous release fully intact.

use crate::fsops::force_remove;
use cs_common::{BumpKind, Error, Result, Version};
use cs_manifest::{
    build_manifest, diff_trees, hash_file, strip_protected, walk_relative, ManifestInputs,
    UpdateManifest, MANIFEST_FILE_NAME,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Produces the application tree for a given version.
///
/// The packaging toolchain is pluggable; the pipeline only cares that after
/// `build` returns, `dest` holds the complete tree to publish.
pub trait BuildStep {
    fn build(&self, version: Version, dest: &Path) -> Result<()>;
}

/// Pushes a finished tree and its manifest to the distribution location.
pub trait Publisher {
    fn publish_tree(&mut self, tree: &Path, version: Version) -> Result<()>;
    fn publish_manifest(&mut self, manifest: &UpdateManifest, json: &str) -> Result<()>;
}

/// Build step that copies an externally built tree as-is.
#[derive(Debug)]
pub struct PrebuiltTree {
    pub source: PathBuf,
}

impl BuildStep for PrebuiltTree {
    fn build(&self, version: Version, dest: &Path) -> Result<()> {
        if !self.source.is_dir() {
            return Err(Error::BuildFailed(format!(
                "prebuilt tree not found: {}",
                self.source.display()
            )));
        }
        debug!(source = %self.source.display(), %version, "copying prebuilt tree");
        for rel in walk_relative(&self.source)? {
            crate::fsops::atomic_replace_file(&self.source.join(&rel), &dest.join(&rel))?;
        }
        Ok(())
    }
}

/// Publisher that copies into a local directory, e.g. a synced share.
#[derive(Debug)]
pub struct DirPublisher {
    pub root: PathBuf,
}

impl Publisher for DirPublisher {
    fn publish_tree(&mut self, tree: &Path, version: Version) -> Result<()> {
        let dest = self.root.join(version.to_string());
        for rel in walk_relative(tree)? {
            crate::fsops::atomic_replace_file(&tree.join(&rel), &dest.join(&rel))
                .map_err(|e| Error::PublishFailed(format!("{rel}: {e}")))?;
        }
        info!(dest = %dest.display(), "tree published");
        Ok(())
    }

    fn publish_manifest(&mut self, _manifest: &UpdateManifest, json: &str) -> Result<()> {
        fs::create_dir_all(&self.root)
            .and_then(|_| fs::write(self.root.join(MANIFEST_FILE_NAME), json))
            .map_err(|e| Error::PublishFailed(format!("manifest: {e}")))?;
        info!(path = %self.root.join(MANIFEST_FILE_NAME).display(), "manifest published");
        Ok(())
    }
}

/// Publisher for runs without a distribution target.
#[derive(Debug, Default)]
pub struct NullPublisher;

impl Publisher for NullPublisher {
    fn publish_tree(&mut self, _tree: &Path, version: Version) -> Result<()> {
        debug!(%version, "no publish target, tree kept locally");
        Ok(())
    }

    fn publish_manifest(&mut self, _manifest: &UpdateManifest, _json: &str) -> Result<()> {
        Ok(())
    }
}

/// Settings for one release run.
#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    pub bump: BumpKind,
    pub base_url: String,
    pub installer: PathBuf,
    pub installer_url: String,
    pub mandatory: bool,
    pub notes: String,
    pub out_dir: PathBuf,
}

/// What a release run produced.
#[derive(Debug)]
pub struct ReleaseReport {
    pub version: Version,
    pub files: usize,
    pub delete: usize,
    pub manifest_path: PathBuf,
}

/// Path of the archived previous tree inside the output directory.
fn archive_dir(out_dir: &Path) -> PathBuf {
    out_dir.join("tree")
}

/// Read the version of the last published release, if any.
fn previous_version(out_dir: &Path) -> Result<Version> {
    let path = out_dir.join(MANIFEST_FILE_NAME);
    match fs::read_to_string(&path) {
        Ok(json) => Ok(UpdateManifest::from_json(&json)?.version),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!("no previous manifest, starting from 0.0.0");
            Ok(Version::ZERO)
        }
        Err(err) => Err(err.into()),
    }
}

/// Run the release pipeline once.
pub fn run_release(
    options: &ReleaseOptions,
    build: &dyn BuildStep,
    publisher: &mut dyn Publisher,
) -> Result<ReleaseReport> {
    let previous = previous_version(&options.out_dir)?;
    let next = previous.bump(options.bump)?;
    info!(from = %previous, to = %next, "releasing");

    // Build into a fresh staging directory named for the new version.
    let staging = options.out_dir.join(format!("staging-{next}"));
    force_remove(&staging)?;
    fs::create_dir_all(&staging)?;
    build.build(next, &staging)?;

    if walk_relative(&staging)?.is_empty() {
        return Err(Error::MissingBuildOutput(staging.display().to_string()));
    }

    let stripped = strip_protected(&staging)?;
    if !stripped.is_empty() {
        warn!(count = stripped.len(), "protected paths stripped from build output");
    }

    let archive = archive_dir(&options.out_dir);
    let baseline = archive.is_dir().then_some(archive.as_path());
    let diff = diff_trees(&staging, baseline)?;

    let installer_sha256 = hash_file(&options.installer).map_err(|e| {
        Error::BuildFailed(format!(
            "installer artifact {}: {e}",
            options.installer.display()
        ))
    })?;

    let manifest = build_manifest(ManifestInputs {
        diff: &diff,
        version: next,
        base_url: &options.base_url,
        installer_url: &options.installer_url,
        installer_sha256: &installer_sha256,
        mandatory: options.mandatory,
        notes: &options.notes,
    })?;
    let json = manifest.to_json()?;

    publisher.publish_tree(&staging, next)?;
    publisher.publish_manifest(&manifest, &json)?;

    // Local out-dir state advances only after both publishes succeed. If
    // either fails, the archived tree and manifest still describe the last
    // release that actually reached clients, so the next run diffs against
    // the published baseline and re-derives the lost deletions.
    force_remove(&archive)?;
    fs::rename(&staging, &archive)?;

    // Manifest last: its existence asserts everything before it is in place.
    let manifest_path = options.out_dir.join(MANIFEST_FILE_NAME);
    fs::write(&manifest_path, &json)?;

    info!(
        version = %next,
        files = manifest.files.len(),
        delete = manifest.delete.len(),
        "release complete"
    );

    Ok(ReleaseReport {
        version: next,
        files: manifest.files.len(),
        delete: manifest.delete.len(),
        manifest_path,
    })
}
