//! Release tree walking, hashing, and differential comparison.
//!
//! The differ produces the published file list for the new tree and the
//! deletion list relative to the previous release's archived tree.
//! Protected paths are excluded from both sides; membership comparison is by
//! case-folded relative path.

use crate::manifest::FileEntry;
use cs_common::paths::{canonical_rel, fold_key, is_protected};
use cs_common::Result;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Output of diffing a new tree against the previous release.
#[derive(Debug, Clone, Default)]
pub struct TreeDiff {
    /// Every non-protected file in the new tree, sorted by path.
    pub files: Vec<FileEntry>,
    /// Non-protected paths present previously and absent now, sorted.
    pub delete: Vec<String>,
}

/// Compute the SHA-256 of a file, streamed.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Collect canonical relative paths of every file under `root`, sorted.
pub fn walk_relative(root: &Path) -> io::Result<Vec<String>> {
    fn visit(root: &Path, dir: &Path, out: &mut Vec<String>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                visit(root, &path, out)?;
            } else {
                let rel = path.strip_prefix(root).unwrap_or(&path);
                out.push(canonical_rel(rel));
            }
        }
        Ok(())
    }

    let mut out = Vec::new();
    visit(root, root, &mut out)?;
    out.sort();
    Ok(out)
}

/// Remove protected paths that leaked into a freshly built tree.
///
/// A database generated during a build run must never be published; it is
/// treated as if absent. Returns the removed paths.
pub fn strip_protected(tree: &Path) -> Result<Vec<String>> {
    let mut removed = Vec::new();
    for rel in walk_relative(tree)? {
        if is_protected(&rel) {
            let abs = tree.join(&rel);
            fs::remove_file(&abs)?;
            warn!(path = %rel, "protected path found in build output, stripped");
            removed.push(rel);
        }
    }
    Ok(removed)
}

/// Diff the freshly built tree against the previous release's tree.
///
/// `files` lists every file in the new tree with its content hash;
/// `delete` is the set difference previous − new. Protected paths appear in
/// neither. With no previous tree, `delete` is empty.
pub fn diff_trees(new_tree: &Path, previous: Option<&Path>) -> Result<TreeDiff> {
    let mut files = Vec::new();
    let mut new_keys = HashSet::new();

    for rel in walk_relative(new_tree)? {
        if is_protected(&rel) {
            continue;
        }
        let sha256 = hash_file(&new_tree.join(&rel))?;
        new_keys.insert(fold_key(&rel));
        files.push(FileEntry::new(rel, sha256));
    }

    let mut delete = Vec::new();
    if let Some(previous) = previous {
        for rel in walk_relative(previous)? {
            if is_protected(&rel) {
                continue;
            }
            if !new_keys.contains(&fold_key(&rel)) {
                delete.push(rel);
            }
        }
    }

    debug!(
        files = files.len(),
        delete = delete.len(),
        "release tree diff computed"
    );

    Ok(TreeDiff { files, delete })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_tree(root: &Path, entries: &[(&str, &str)]) {
        for (rel, content) in entries {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    #[test]
    fn test_diff_spec_scenario() {
        // previous {a.txt, b.txt, db}, new {a.txt, c.txt, db} -> files [a, c], delete [b].
        let temp = TempDir::new().unwrap();
        let prev = temp.path().join("prev");
        let new = temp.path().join("new");
        write_tree(
            &prev,
            &[
                ("a.txt", "alpha"),
                ("b.txt", "bravo"),
                ("sqlModels/app.sqlite3", "userdata"),
            ],
        );
        write_tree(
            &new,
            &[
                ("a.txt", "alpha"),
                ("c.txt", "charlie"),
                ("sqlModels/app.sqlite3", "stale-build-db"),
            ],
        );

        let diff = diff_trees(&new, Some(&prev)).unwrap();

        let paths: Vec<_> = diff.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "c.txt"]);
        assert_eq!(diff.delete, vec!["b.txt".to_string()]);
        assert!(diff.files.iter().all(|f| f.sha256.len() == 64));
    }

    #[test]
    fn test_diff_without_previous_tree() {
        let temp = TempDir::new().unwrap();
        let new = temp.path().join("new");
        write_tree(&new, &[("a.txt", "alpha"), ("dir/nested.txt", "deep")]);

        let diff = diff_trees(&new, None).unwrap();
        assert_eq!(diff.files.len(), 2);
        assert!(diff.delete.is_empty());
    }

    #[test]
    fn test_diff_deletion_is_case_folded() {
        let temp = TempDir::new().unwrap();
        let prev = temp.path().join("prev");
        let new = temp.path().join("new");
        write_tree(&prev, &[("Readme.TXT", "old")]);
        write_tree(&new, &[("readme.txt", "new")]);

        let diff = diff_trees(&new, Some(&prev)).unwrap();
        // Same file under case folding: replaced, not deleted.
        assert!(diff.delete.is_empty());
        assert_eq!(diff.files[0].path, "readme.txt");
    }

    #[test]
    fn test_diff_never_deletes_protected() {
        let temp = TempDir::new().unwrap();
        let prev = temp.path().join("prev");
        let new = temp.path().join("new");
        write_tree(
            &prev,
            &[
                ("sqlModels/app.sqlite3", "data"),
                ("logs/old.log", "log"),
                ("gone.txt", "x"),
            ],
        );
        write_tree(&new, &[("kept.txt", "y")]);

        let diff = diff_trees(&new, Some(&prev)).unwrap();
        assert_eq!(diff.delete, vec!["gone.txt".to_string()]);
    }

    #[test]
    fn test_strip_protected_removes_leaked_db() {
        let temp = TempDir::new().unwrap();
        let tree = temp.path().join("tree");
        write_tree(
            &tree,
            &[("app.exe", "bin"), ("sqlModels/app.sqlite3", "leak")],
        );

        let removed = strip_protected(&tree).unwrap();
        assert_eq!(removed, vec!["sqlModels/app.sqlite3".to_string()]);
        assert!(!tree.join("sqlModels/app.sqlite3").exists());
        assert!(tree.join("app.exe").exists());
    }

    #[test]
    fn test_hash_file_matches_in_memory_hash() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("f.bin");
        fs::write(&path, b"content").unwrap();

        assert_eq!(
            hash_file(&path).unwrap(),
            FileEntry::compute_checksum(b"content")
        );
    }
}
