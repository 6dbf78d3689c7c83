//! cs-core command-line interface.
//!
//! `release` runs the packaging pipeline, `install`/`uninstall` run the
//! lifecycle flows on an end-user machine. Human-readable payloads go to
//! stdout; logs and prompts go to stderr.

use clap::{Args, Parser, Subcommand};
use cs_common::paths::AppPaths;
use cs_common::{format_error_human, BumpKind, Error, Version};
use cs_core::installer::{
    read_record, run_uninstall, ConsolePrompter, InstallOutcome, Installer, Prompter,
    UnattendedPrompter,
};
use cs_core::release::{
    run_release, DirPublisher, NullPublisher, PrebuiltTree, Publisher, ReleaseOptions,
};
use cs_core::{exit_codes, logging};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

#[derive(Debug, Parser)]
#[command(
    name = "cs-core",
    version,
    about = "Cotizador release builder and installer"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the per-user data and documents roots (mainly for testing)
    #[arg(long, global = true, env = "CS_DATA_ROOT")]
    data_root: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build and publish a release from a prebuilt application tree
    Release {
        /// Which version component to bump
        #[arg(long, value_enum)]
        bump: BumpKind,

        /// Directory holding the freshly built application tree
        #[arg(long)]
        source: PathBuf,

        /// Output directory holding the manifest and archived tree
        #[arg(long)]
        out: PathBuf,

        /// URL clients fetch changed files from
        #[arg(long)]
        base_url: String,

        /// Path of the full installer artifact to hash
        #[arg(long)]
        installer: PathBuf,

        /// URL of the full installer fallback
        #[arg(long)]
        installer_url: String,

        /// Mark the release as non-skippable
        #[arg(long)]
        mandatory: bool,

        /// Release notes shown to the user
        #[arg(long, default_value = "")]
        notes: String,

        /// Also copy the tree and manifest into this directory
        #[arg(long)]
        publish_dir: Option<PathBuf>,
    },

    /// Install or upgrade the application on this machine
    Install {
        /// Directory holding the application files to place
        #[arg(long)]
        source: PathBuf,

        /// Install directory for a fresh installation
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Version of the files being installed
        #[arg(long)]
        version: Version,

        /// Never prompt; use safe defaults everywhere
        #[arg(long)]
        unattended: bool,
    },

    /// Remove the application and its per-user state
    Uninstall {
        /// Never prompt; user documents are always kept
        #[arg(long)]
        unattended: bool,
    },

    /// Print the tool version
    Version,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap renders --help/--version through the same error path;
            // only genuine argument errors exit non-zero.
            let code = if err.use_stderr() {
                exit_codes::ARGS_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            process::exit(code);
        }
    };
    logging::init_logging(cli.global.verbose, cli.global.quiet);

    let paths = match &cli.global.data_root {
        Some(root) => AppPaths::under(root),
        None => AppPaths::discover(),
    };

    let code = match run(cli.command, paths) {
        Ok(code) => code,
        Err(err) => {
            let use_color = std::io::stderr().is_terminal();
            eprintln!("{}", format_error_human(&err, use_color));
            exit_codes::from_error(&err)
        }
    };
    process::exit(code);
}

fn run(command: Commands, paths: AppPaths) -> cs_common::Result<i32> {
    match command {
        Commands::Release {
            bump,
            source,
            out,
            base_url,
            installer,
            installer_url,
            mandatory,
            notes,
            publish_dir,
        } => {
            let options = ReleaseOptions {
                bump,
                base_url,
                installer,
                installer_url,
                mandatory,
                notes,
                out_dir: out,
            };
            let build = PrebuiltTree { source };
            let mut publisher: Box<dyn Publisher> = match publish_dir {
                Some(root) => Box::new(DirPublisher { root }),
                None => Box::new(NullPublisher),
            };

            let report = run_release(&options, &build, publisher.as_mut())?;
            println!(
                "released {} ({} files, {} deletions)\nmanifest: {}",
                report.version,
                report.files,
                report.delete,
                report.manifest_path.display()
            );
            Ok(exit_codes::SUCCESS)
        }

        Commands::Install {
            source,
            dest,
            version,
            unattended,
        } => {
            let record = read_record(&paths.registry_file());
            let dest = match (dest, &record) {
                (Some(dest), _) => dest,
                (None, Some(record)) => record.install_dir.clone(),
                (None, None) => {
                    return Err(Error::InstallFailed(
                        "--dest is required for a fresh installation".to_string(),
                    ))
                }
            };

            let mut console = ConsolePrompter;
            let mut silent = UnattendedPrompter;
            let prompter: &mut dyn Prompter = if unattended { &mut silent } else { &mut console };

            let outcome =
                Installer::new(paths.clone(), source, dest, version, unattended, prompter).run()?;
            match outcome {
                InstallOutcome::Installed { version } => {
                    println!("installed {version}");
                    Ok(exit_codes::SUCCESS)
                }
                InstallOutcome::Upgraded { from, to } => {
                    println!("upgraded {from} -> {to}");
                    Ok(exit_codes::SUCCESS)
                }
                InstallOutcome::UninstallDelegated => {
                    let record = record.ok_or_else(|| {
                        Error::InstallFailed("no installation record to uninstall".to_string())
                    })?;
                    let report = run_uninstall(&paths, &record, false, &mut ConsolePrompter)?;
                    println!("uninstalled ({} paths removed)", report.removed.len());
                    Ok(exit_codes::UNINSTALL_DELEGATED)
                }
                InstallOutcome::Cancelled => {
                    println!("cancelled, nothing changed");
                    Ok(exit_codes::CANCELLED)
                }
            }
        }

        Commands::Uninstall { unattended } => {
            let Some(record) = read_record(&paths.registry_file()) else {
                println!("nothing installed");
                return Ok(exit_codes::SUCCESS);
            };

            let mut console = ConsolePrompter;
            let mut silent = UnattendedPrompter;
            let prompter: &mut dyn Prompter = if unattended { &mut silent } else { &mut console };

            let report = run_uninstall(&paths, &record, unattended, prompter)?;
            println!(
                "uninstalled {} ({} paths removed, {} deferred)",
                record.version,
                report.removed.len(),
                report.deferred.len()
            );
            Ok(exit_codes::SUCCESS)
        }

        Commands::Version => {
            println!("cs-core {}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_subcommand_is_an_argument_error() {
        let err = Cli::try_parse_from(["cs-core", "frobnicate"]).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn test_help_is_not_an_argument_error() {
        let err = Cli::try_parse_from(["cs-core", "--help"]).unwrap_err();
        assert!(!err.use_stderr());
    }

    #[test]
    fn test_release_requires_bump() {
        let err = Cli::try_parse_from(["cs-core", "release", "--source", "dist"]).unwrap_err();
        assert!(err.use_stderr());
    }
}
