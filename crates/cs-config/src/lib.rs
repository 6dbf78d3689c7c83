//! User configuration handling across installs and upgrades.
//!
//! The installer never owns the application's configuration at runtime; it
//! only reads, migrates, backs up, and rewrites it during install, upgrade,
//! and uninstall. Reading is deliberately tolerant: fields are located by
//! case-insensitive key search in the raw text and default when missing or
//! malformed, so formatting drift between versions is never a fatal error.

pub mod backup;
pub mod snapshot;

pub use backup::{BackupRecord, BackupStore, LATEST_BACKUP_NAME};
pub use snapshot::{ConfigSnapshot, Country, ListingType, UpdateMode, WizardAnswers};
