//! Update manifest types, release tree diffing, and content hashing.
//!
//! The manifest is the single published descriptor a client consults to
//! learn whether and how to update. It is the sole source of truth: clients
//! never re-diff trees themselves.

pub mod builder;
pub mod diff;
pub mod manifest;

pub use builder::{build_manifest, ManifestInputs};
pub use diff::{diff_trees, hash_file, strip_protected, walk_relative, TreeDiff};
pub use manifest::{FileEntry, ManifestKind, UpdateManifest, MANIFEST_FILE_NAME};
