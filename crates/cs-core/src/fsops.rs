//! Robust, retrying filesystem primitives.
//!
//! Shared by the release pipeline and the installer wherever trees are
//! copied or removed. Deletion copes with transient external locks (sync
//! clients, antivirus scanners) by retrying a bounded number of times with
//! increasing delay, then falling back to renaming the target out of the way
//! and handing the caller a [`PendingCleanup`] token. The original location
//! is logically free the moment the rename succeeds.

use cs_common::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Maximum deletion attempts before the rename-and-defer fallback.
pub const MAX_REMOVE_ATTEMPTS: u32 = 5;

/// Base inter-attempt delay; attempt `n` waits `n` times this.
pub const BASE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// A directory renamed out of the way because deletion kept failing.
///
/// The caller may retry deletion at its leisure; leaving the renamed
/// directory behind costs disk space, not correctness.
#[derive(Debug)]
pub struct PendingCleanup {
    /// The path the caller asked to remove; free for reuse.
    pub original: PathBuf,
    /// Where the locked tree now lives.
    pub renamed: PathBuf,
}

impl PendingCleanup {
    /// Retry deletion of the renamed tree. Returns true once it is gone.
    pub fn retry(&self) -> bool {
        if !self.renamed.exists() {
            return true;
        }
        let _ = clear_attributes(&self.renamed);
        remove_any(&self.renamed).is_ok()
    }
}

/// Result of a forced removal.
#[derive(Debug)]
pub enum RemoveOutcome {
    /// The path is gone.
    Removed,
    /// The path is free, but its old contents await deferred deletion.
    Deferred(PendingCleanup),
}

impl RemoveOutcome {
    pub fn is_removed(&self) -> bool {
        matches!(self, RemoveOutcome::Removed)
    }
}

/// Forcibly remove a file or directory tree.
///
/// Clears read-only attributes recursively before each attempt. After
/// [`MAX_REMOVE_ATTEMPTS`] failures the target is renamed to a sibling
/// `.trash-*` name and returned as [`RemoveOutcome::Deferred`]; only when
/// even the rename fails does this return [`Error::RetriesExhausted`].
pub fn force_remove(path: &Path) -> Result<RemoveOutcome> {
    if !path.exists() {
        return Ok(RemoveOutcome::Removed);
    }

    let mut last_err: Option<io::Error> = None;
    for attempt in 1..=MAX_REMOVE_ATTEMPTS {
        let _ = clear_attributes(path);
        match remove_any(path) {
            Ok(()) => return Ok(RemoveOutcome::Removed),
            Err(err) => {
                debug!(
                    path = %path.display(),
                    attempt,
                    error = %err,
                    "removal attempt failed"
                );
                last_err = Some(err);
                if attempt < MAX_REMOVE_ATTEMPTS {
                    thread::sleep(BASE_RETRY_DELAY * attempt);
                }
            }
        }
    }

    // Rename-and-defer: the original location must become free even if an
    // external process still holds a handle somewhere inside the tree.
    let trash_name = format!(
        ".trash-{}-{}",
        path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
        &Uuid::new_v4().to_string()[..8]
    );
    let renamed = path.with_file_name(trash_name);

    match fs::rename(path, &renamed) {
        Ok(()) => {
            let pending = PendingCleanup {
                original: path.to_path_buf(),
                renamed,
            };
            // One immediate best-effort pass; locks often clear quickly.
            if pending.retry() {
                return Ok(RemoveOutcome::Removed);
            }
            warn!(
                original = %pending.original.display(),
                renamed = %pending.renamed.display(),
                "deletion deferred, renamed out of the way"
            );
            Ok(RemoveOutcome::Deferred(pending))
        }
        Err(rename_err) => {
            warn!(
                path = %path.display(),
                error = %rename_err,
                last_remove_error = ?last_err,
                "rename fallback failed"
            );
            Err(Error::RetriesExhausted {
                path: path.display().to_string(),
            })
        }
    }
}

/// Replace a file atomically: copy to a `.tmp` sibling, then rename over.
pub fn atomic_replace_file(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = dst.with_file_name(format!(
        "{}.tmp",
        dst.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    ));
    fs::copy(src, &tmp)?;
    fs::rename(&tmp, dst)?;
    Ok(())
}

/// Copy every file from `src` into `dest`, excluding matched paths.
///
/// Never deletes `dest` first: excluded (protected) files already present in
/// `dest` survive untouched because they are simply never overwritten.
/// Returns the number of files placed.
pub fn replace_tree(dest: &Path, src: &Path, exclude: &dyn Fn(&str) -> bool) -> Result<usize> {
    let mut copied = 0;
    for rel in cs_manifest::walk_relative(src)? {
        if exclude(&rel) {
            debug!(path = %rel, "excluded from placement");
            continue;
        }
        atomic_replace_file(&src.join(&rel), &dest.join(&rel))?;
        copied += 1;
    }
    Ok(copied)
}

/// Recursively clear read-only attributes so deletion cannot fail on them.
fn clear_attributes(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    let mut perms = metadata.permissions();
    if perms.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        let _ = fs::set_permissions(path, perms);
    }
    if metadata.is_dir() {
        for entry in fs::read_dir(path)? {
            clear_attributes(&entry?.path())?;
        }
    }
    Ok(())
}

fn remove_any(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_common::paths::is_protected;
    use cs_manifest::hash_file;
    use tempfile::TempDir;

    fn write_tree(root: &Path, entries: &[(&str, &str)]) {
        for (rel, content) in entries {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    #[test]
    fn test_force_remove_missing_path_is_removed() {
        let temp = TempDir::new().unwrap();
        let outcome = force_remove(&temp.path().join("nope")).unwrap();
        assert!(outcome.is_removed());
    }

    #[test]
    fn test_force_remove_readonly_tree() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("victim");
        write_tree(&dir, &[("a/ro.txt", "x")]);

        let file = dir.join("a/ro.txt");
        let mut perms = fs::metadata(&file).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&file, perms).unwrap();

        let outcome = force_remove(&dir).unwrap();
        assert!(outcome.is_removed());
        assert!(!dir.exists());
    }

    #[test]
    fn test_atomic_replace_creates_parents() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.txt");
        fs::write(&src, "payload").unwrap();

        let dst = temp.path().join("deep/nested/dst.txt");
        atomic_replace_file(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "payload");
    }

    #[test]
    fn test_replace_tree_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("dest");
        write_tree(&src, &[("a.txt", "alpha"), ("dir/b.txt", "beta")]);

        let first = replace_tree(&dest, &src, &|_| false).unwrap();
        let hash_a = hash_file(&dest.join("a.txt")).unwrap();
        let second = replace_tree(&dest, &src, &|_| false).unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 2);
        assert_eq!(hash_file(&dest.join("a.txt")).unwrap(), hash_a);
        assert_eq!(cs_manifest::walk_relative(&dest).unwrap().len(), 2);
    }

    #[test]
    fn test_replace_tree_never_touches_protected_dest() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("dest");
        write_tree(
            &src,
            &[("app.bin", "v2"), ("sqlModels/app.sqlite3", "build-junk")],
        );
        write_tree(&dest, &[("sqlModels/app.sqlite3", "user-data")]);

        replace_tree(&dest, &src, &is_protected).unwrap();

        assert_eq!(fs::read_to_string(dest.join("app.bin")).unwrap(), "v2");
        assert_eq!(
            fs::read_to_string(dest.join("sqlModels/app.sqlite3")).unwrap(),
            "user-data"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_force_remove_defers_locked_tree() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("victim");
        write_tree(&dir, &[("locked/held.txt", "x")]);

        // A mode-000 directory cannot be read or descended into, so both
        // attribute clearing and deletion fail underneath it.
        let locked = dir.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Running as a user the kernel exempts from permission checks;
            // the lock cannot be simulated here.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let outcome = force_remove(&dir).unwrap();
        let pending = match outcome {
            RemoveOutcome::Deferred(pending) => pending,
            RemoveOutcome::Removed => panic!("locked tree should defer"),
        };

        // The original location is free; the tree lives on under a trash name.
        assert!(!dir.exists());
        assert_eq!(pending.original, dir);
        let trash_name = pending.renamed.file_name().unwrap().to_string_lossy().into_owned();
        assert!(trash_name.starts_with(".trash-victim-"));
        assert!(pending.renamed.join("locked").exists());
        assert!(!pending.retry());

        fs::set_permissions(
            pending.renamed.join("locked"),
            fs::Permissions::from_mode(0o755),
        )
        .unwrap();
        assert!(pending.retry());
        assert!(!pending.renamed.exists());
    }

    #[test]
    fn test_pending_cleanup_retry_on_gone_path() {
        let pending = PendingCleanup {
            original: PathBuf::from("/tmp/x"),
            renamed: PathBuf::from("/tmp/definitely-not-here-cs"),
        };
        assert!(pending.retry());
    }
}
