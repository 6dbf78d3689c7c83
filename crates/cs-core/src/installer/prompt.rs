//! User interaction seam for the installer.
//!
//! Every question the installer can ask goes through [`Prompter`], so the
//! lifecycle logic stays testable and the unattended mode is just a prompter
//! that always answers with the safe default.

use cs_config::WizardAnswers;
use cs_config::{Country, ListingType};
use std::io::{self, BufRead, Write};

/// What to do when a prior installation is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceChoice {
    /// Reinstall the current files over the existing installation.
    Repair,
    /// Hand off to the uninstall flow.
    Uninstall,
    /// Leave everything as it is.
    Cancel,
}

/// Answers the installer's questions.
pub trait Prompter {
    /// Prior installation found: repair, uninstall, or cancel.
    fn maintenance_choice(&mut self) -> MaintenanceChoice;

    /// First-run wizard for a fresh install.
    fn wizard_answers(&mut self) -> WizardAnswers;

    /// During uninstall: also remove the user's document directory?
    fn confirm_remove_documents(&mut self) -> bool;
}

/// Prompter that never asks: safe defaults everywhere.
///
/// Cancel at the maintenance fork would make unattended upgrades a no-op,
/// so unattended runs skip that prompt entirely; this answer only matters
/// if a caller wires it in anyway.
#[derive(Debug, Default)]
pub struct UnattendedPrompter;

impl Prompter for UnattendedPrompter {
    fn maintenance_choice(&mut self) -> MaintenanceChoice {
        MaintenanceChoice::Cancel
    }

    fn wizard_answers(&mut self) -> WizardAnswers {
        WizardAnswers::default()
    }

    fn confirm_remove_documents(&mut self) -> bool {
        false
    }
}

/// Interactive prompter over stdin/stderr.
///
/// Questions go to stderr like all other non-payload output. Unrecognized
/// input falls back to the safe default for each question.
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl ConsolePrompter {
    fn ask(&self, question: &str) -> String {
        eprint!("{question} ");
        let _ = io::stderr().flush();
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
        line.trim().to_string()
    }
}

impl Prompter for ConsolePrompter {
    fn maintenance_choice(&mut self) -> MaintenanceChoice {
        let answer = self.ask(
            "An existing installation was found. [r]epair, [u]ninstall, or [c]ancel?",
        );
        match answer.to_ascii_lowercase().as_str() {
            "r" | "repair" => MaintenanceChoice::Repair,
            "u" | "uninstall" => MaintenanceChoice::Uninstall,
            _ => MaintenanceChoice::Cancel,
        }
    }

    fn wizard_answers(&mut self) -> WizardAnswers {
        let country = match self
            .ask("Country? [1] Paraguay [2] Peru [3] Venezuela")
            .as_str()
        {
            "2" => Country::Peru,
            "3" => Country::Venezuela,
            _ => Country::Paraguay,
        };
        let listing_type = match self
            .ask("Catalog listings? [1] Products [2] Presentations [3] Both")
            .as_str()
        {
            "1" => ListingType::Products,
            "2" => ListingType::Presentations,
            _ => ListingType::Both,
        };
        let allow_no_stock = matches!(
            self.ask("Allow quoting items with no stock? [y/N]")
                .to_ascii_lowercase()
                .as_str(),
            "y" | "yes"
        );

        WizardAnswers {
            country,
            listing_type,
            allow_no_stock,
        }
    }

    fn confirm_remove_documents(&mut self) -> bool {
        matches!(
            self.ask("Also remove saved quotation documents? [y/N]")
                .to_ascii_lowercase()
                .as_str(),
            "y" | "yes"
        )
    }
}
