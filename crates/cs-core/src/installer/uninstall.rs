//! Uninstall coordinator.
//!
//! Removes the installed application tree and the per-user state this tool
//! created: configuration, backups, updater scratch, and logs. The user's
//! quotation documents are different in kind; they are only removed after an
//! explicit interactive confirmation, and never in an unattended run.

use crate::fsops::{force_remove, RemoveOutcome};
use crate::installer::prompt::Prompter;
use crate::installer::registry::InstallRecord;
use cs_common::paths::{config_dir, AppPaths};
use cs_common::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What an uninstall run did.
#[derive(Debug, Default)]
pub struct UninstallReport {
    /// Paths fully removed.
    pub removed: Vec<PathBuf>,
    /// Paths renamed aside for deferred cleanup.
    pub deferred: Vec<PathBuf>,
    /// Whether the user's document directory was removed.
    pub documents_removed: bool,
}

/// Remove an installation and its per-user state.
pub fn run_uninstall(
    paths: &AppPaths,
    record: &InstallRecord,
    unattended: bool,
    prompter: &mut dyn Prompter,
) -> Result<UninstallReport> {
    info!(
        install_dir = %record.install_dir.display(),
        version = %record.version,
        unattended,
        "uninstalling"
    );

    if let Some(command) = &record.uninstall_command {
        // A native uninstaller owns the application files on this machine;
        // surface it rather than racing it on the same tree.
        warn!(command = %command, "native uninstaller registered, run it as well");
    }

    let mut report = UninstallReport::default();

    // The host registry entry itself belongs to the packaging toolchain and
    // is not touched here.
    let targets = [
        config_dir(&record.install_dir),
        record.install_dir.clone(),
        paths.backups_dir(),
        paths.updater_dir(),
        paths.logs_dir(),
    ];
    for target in targets {
        remove_into(&target, &mut report)?;
    }

    // Unattended runs must never decide about user documents; absence of a
    // person to ask means the documents stay.
    if !unattended && prompter.confirm_remove_documents() {
        remove_into(&paths.documents_root, &mut report)?;
        report.documents_removed = true;
    }

    info!(
        removed = report.removed.len(),
        deferred = report.deferred.len(),
        documents_removed = report.documents_removed,
        "uninstall complete"
    );
    Ok(report)
}

fn remove_into(target: &Path, report: &mut UninstallReport) -> Result<()> {
    if !target.exists() {
        return Ok(());
    }
    match force_remove(target)? {
        RemoveOutcome::Removed => report.removed.push(target.to_path_buf()),
        RemoveOutcome::Deferred(pending) => report.deferred.push(pending.original),
    }
    Ok(())
}
