//! Installation lifecycle state machine.
//!
//! One sequential pass per run: detect a prior installation through the
//! registry, fork on the maintenance decision, then move through config
//! backup, old-config removal, file placement, and config rewrite. Each
//! transition is logged; there is no parallelism and no partial resume.

pub mod prompt;
pub mod registry;
pub mod uninstall;

pub use prompt::{ConsolePrompter, MaintenanceChoice, Prompter, UnattendedPrompter};
pub use registry::{read_record, write_record, InstallRecord};
pub use uninstall::{run_uninstall, UninstallReport};

use crate::fsops::{force_remove, replace_tree};
use cs_common::paths::{config_dir, config_file, is_protected, AppPaths};
use cs_common::{Error, Result, Version};
use cs_config::{BackupStore, ConfigSnapshot};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Phases of one installer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Start,
    MaintenancePrompt,
    Wizard,
    BackingUpConfig,
    RemovingOldConfig,
    PlacingFiles,
    WritingConfig,
    Done,
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallState::Start => "start",
            InstallState::MaintenancePrompt => "maintenance-prompt",
            InstallState::Wizard => "wizard",
            InstallState::BackingUpConfig => "backing-up-config",
            InstallState::RemovingOldConfig => "removing-old-config",
            InstallState::PlacingFiles => "placing-files",
            InstallState::WritingConfig => "writing-config",
            InstallState::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// How an installer run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Fresh installation completed.
    Installed { version: Version },
    /// Existing installation upgraded (or repaired) in place.
    Upgraded { from: Version, to: Version },
    /// The user chose uninstall at the maintenance fork.
    UninstallDelegated,
    /// The user declined to proceed.
    Cancelled,
}

/// One installer run over a source tree of new application files.
pub struct Installer<'a> {
    paths: AppPaths,
    source: PathBuf,
    dest: PathBuf,
    version: Version,
    unattended: bool,
    prompter: &'a mut dyn Prompter,
    state: InstallState,
}

impl<'a> Installer<'a> {
    pub fn new(
        paths: AppPaths,
        source: PathBuf,
        dest: PathBuf,
        version: Version,
        unattended: bool,
        prompter: &'a mut dyn Prompter,
    ) -> Self {
        Self {
            paths,
            source,
            dest,
            version,
            unattended,
            prompter,
            state: InstallState::Start,
        }
    }

    fn advance(&mut self, next: InstallState) {
        debug!(from = %self.state, to = %next, "installer transition");
        self.state = next;
    }

    /// Run the full lifecycle once.
    pub fn run(&mut self) -> Result<InstallOutcome> {
        if !self.source.is_dir() {
            return Err(Error::InstallFailed(format!(
                "source tree not found: {}",
                self.source.display()
            )));
        }

        match read_record(&self.paths.registry_file()) {
            None => self.fresh_install(),
            Some(record) => {
                if self.unattended {
                    // Unattended runs over a prior install always mean upgrade.
                    return self.upgrade(record);
                }
                self.advance(InstallState::MaintenancePrompt);
                match self.prompter.maintenance_choice() {
                    MaintenanceChoice::Repair => self.upgrade(record),
                    MaintenanceChoice::Uninstall => {
                        info!("maintenance choice: uninstall");
                        Ok(InstallOutcome::UninstallDelegated)
                    }
                    MaintenanceChoice::Cancel => {
                        info!("maintenance choice: cancel");
                        Ok(InstallOutcome::Cancelled)
                    }
                }
            }
        }
    }

    fn fresh_install(&mut self) -> Result<InstallOutcome> {
        info!(dest = %self.dest.display(), version = %self.version, "fresh install");

        let snapshot = if self.unattended {
            ConfigSnapshot::default()
        } else {
            self.advance(InstallState::Wizard);
            ConfigSnapshot::from_wizard(&self.prompter.wizard_answers())
        };

        self.advance(InstallState::PlacingFiles);
        let placed = replace_tree(&self.dest, &self.source, &is_protected)?;
        info!(files = placed, "application files placed");

        self.advance(InstallState::WritingConfig);
        self.write_config(&snapshot);

        self.advance(InstallState::Done);
        Ok(InstallOutcome::Installed {
            version: self.version,
        })
    }

    fn upgrade(&mut self, record: InstallRecord) -> Result<InstallOutcome> {
        info!(
            install_dir = %record.install_dir.display(),
            from = %record.version,
            to = %self.version,
            "upgrading existing installation"
        );

        // The prior config is captured before anything on disk changes.
        let prior = ConfigSnapshot::read(&config_file(&record.install_dir));

        self.advance(InstallState::BackingUpConfig);
        if let Some(prior) = &prior {
            // Backup failure aborts the upgrade; nothing was modified yet.
            let store = BackupStore::new(self.paths.backups_dir());
            store.backup(&prior.raw, &record.version)?;
        } else {
            debug!("no prior config to back up");
        }

        self.advance(InstallState::RemovingOldConfig);
        let outcome = force_remove(&config_dir(&record.install_dir))?;
        if !outcome.is_removed() {
            warn!("old config directory deferred for cleanup");
        }

        self.advance(InstallState::PlacingFiles);
        let placed = replace_tree(&record.install_dir, &self.source, &is_protected)?;
        info!(files = placed, "application files placed");

        // Migrated prior settings win; the wizard is only consulted when no
        // prior snapshot was recoverable, and never in an unattended run.
        let snapshot = match prior {
            Some(prior) => prior,
            None if !self.unattended => {
                self.advance(InstallState::Wizard);
                ConfigSnapshot::from_wizard(&self.prompter.wizard_answers())
            }
            None => ConfigSnapshot::default(),
        };
        self.advance(InstallState::WritingConfig);
        self.write_config_at(&record.install_dir, &snapshot);

        self.advance(InstallState::Done);
        Ok(InstallOutcome::Upgraded {
            from: record.version,
            to: self.version,
        })
    }

    fn write_config(&self, snapshot: &ConfigSnapshot) {
        self.write_config_at(&self.dest, snapshot);
    }

    /// Write the configuration file for the application to read at startup.
    ///
    /// A failure here is logged and swallowed: the application falls back to
    /// built-in defaults when its config is missing, so an unwritable config
    /// must not fail an otherwise complete installation.
    fn write_config_at(&self, install_dir: &Path, snapshot: &ConfigSnapshot) {
        let result: Result<()> = (|| {
            fs::create_dir_all(config_dir(install_dir))?;
            fs::write(config_file(install_dir), snapshot.to_json())?;
            Ok(())
        })();

        match result {
            Ok(()) => info!(config = %snapshot, "configuration written"),
            Err(err) => {
                let err = Error::ConfigWrite(err.to_string());
                warn!(error = %err, "configuration not written, application will use defaults");
            }
        }
    }

}
