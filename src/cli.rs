//! Command-line interface module for filesort.
//!
//! The CLI is a thin shell over [`FileOrganizer`]: it picks the folder and
//! method from the arguments, draws progress, and turns outcomes and errors
//! into messages. It never inspects the filesystem itself.

use crate::classifier::OrganizeMethod;
use crate::config::Config;
use crate::file_organizer::{FileOrganizer, OrganizeOutcome};
use crate::output::{OutputFormatter, ProgressBarSink};
use crate::progress::CancelFlag;
use crate::undo::UndoError;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// filesort - sort a folder's files into subfolders, and undo it
#[derive(Parser, Debug)]
#[command(name = "filesort")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to .filesortrc.toml, then ~/.config/filesort/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Represents a CLI command to execute.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Move the files of a folder into subfolders
    Organize {
        /// Folder whose files are organized
        folder: PathBuf,

        /// How to pick each file's subfolder
        #[arg(short, long, value_enum)]
        by: MethodArg,

        /// Show what would happen without moving anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Move the files of the last run back where they were
    Undo,
    /// Show whether an undo is available
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// Year and month of the last modification
    Date,
    /// File extension
    Extension,
    /// Small (< 1 KiB), medium (< 1 MiB) or large
    Size,
}

impl From<MethodArg> for OrganizeMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Date => OrganizeMethod::ByDate,
            MethodArg::Extension => OrganizeMethod::ByExtension,
            MethodArg::Size => OrganizeMethod::BySize,
        }
    }
}

/// Parses the process arguments and runs the command.
///
/// Ctrl-C sets a [`CancelFlag`]: a running organize stops before its next
/// file and saves the undo record of the files it already moved.
pub fn run() -> Result<(), String> {
    let cli = Cli::parse();

    let cancel = CancelFlag::new();
    let handle = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handle.cancel()) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    run_cli_with_cancel(cli.command, cli.config.as_deref(), &cancel)
}

/// Runs a command, loading settings from `config_path` or the default locations.
///
/// # Examples
///
/// ```no_run
/// use filesort::cli::{run_cli, Command, MethodArg};
/// use std::path::PathBuf;
///
/// let command = Command::Organize {
///     folder: PathBuf::from("/home/me/Downloads"),
///     by: MethodArg::Extension,
///     dry_run: false,
/// };
/// if let Err(e) = run_cli(command, None) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(command: Command, config_path: Option<&Path>) -> Result<(), String> {
    run_cli_with_cancel(command, config_path, &CancelFlag::new())
}

/// Like [`run_cli`], but an organize run stops once `cancel` is set.
pub fn run_cli_with_cancel(
    command: Command,
    config_path: Option<&Path>,
    cancel: &CancelFlag,
) -> Result<(), String> {
    let config =
        Config::load(config_path).map_err(|e| format!("Error loading configuration: {}", e))?;
    let mut organizer =
        FileOrganizer::new(&config).map_err(|e| format!("Error in configuration: {}", e))?;

    match command {
        Command::Organize {
            folder,
            by,
            dry_run,
        } => {
            if dry_run {
                organize_dry_run(&organizer, &folder, by.into())
            } else {
                organize_folder(&mut organizer, &folder, by.into(), cancel)
            }
        }
        Command::Undo => undo_organization(&mut organizer),
        Command::Status => {
            show_status(&organizer);
            Ok(())
        }
    }
}

fn organize_folder(
    organizer: &mut FileOrganizer,
    folder: &Path,
    method: OrganizeMethod,
    cancel: &CancelFlag,
) -> Result<(), String> {
    OutputFormatter::info(&format!(
        "Organizing {} by {}",
        folder.display(),
        method.label()
    ));

    let mut progress = ProgressBarSink::new(cancel.clone());
    match organizer.organize(folder, method, &mut progress) {
        Ok(OrganizeOutcome::NothingToOrganize) => {
            progress.clear();
            OutputFormatter::warning("No files were found to organize in the selected folder.");
            Ok(())
        }
        Ok(OrganizeOutcome::Completed { moved }) => {
            progress.finish("done");
            OutputFormatter::success(&format!(
                "Organized {} {}.",
                moved,
                if moved == 1 { "file" } else { "files" }
            ));
            OutputFormatter::plain("Run 'filesort undo' to revert.");
            Ok(())
        }
        Ok(OrganizeOutcome::Cancelled { moved, remaining }) => {
            progress.abandon();
            OutputFormatter::warning(&format!(
                "Organization was cancelled: {} moved, {} left in place.",
                moved, remaining
            ));
            Ok(())
        }
        Err(e) => {
            progress.abandon();
            if e.moved_count() > 0 {
                OutputFormatter::warning(&format!(
                    "{} files were moved before the error. Run 'filesort undo' to revert them.",
                    e.moved_count()
                ));
            }
            Err(e.to_string())
        }
    }
}

fn organize_dry_run(
    organizer: &FileOrganizer,
    folder: &Path,
    method: OrganizeMethod,
) -> Result<(), String> {
    OutputFormatter::dry_run_notice(&format!(
        "Analyzing {} by {}",
        folder.display(),
        method.label()
    ));

    let plan = organizer.plan(folder, method).map_err(|e| e.to_string())?;
    if plan.is_empty() {
        OutputFormatter::warning("No files were found to organize in the selected folder.");
        return Ok(());
    }

    let mut folder_counts: BTreeMap<String, usize> = BTreeMap::new();
    for planned in &plan {
        let name = planned
            .source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let target = planned.folder.display().to_string();
        if planned.destination_exists {
            OutputFormatter::warning(&format!(
                "{} → {}/ (already exists there, would stop the run)",
                name, target
            ));
        } else {
            OutputFormatter::plain(&format!(" - {} → {}/", name, target));
        }
        *folder_counts.entry(target).or_insert(0) += 1;
    }

    OutputFormatter::summary_table(&folder_counts, plan.len());
    OutputFormatter::success("Dry run complete. No files were modified.");
    Ok(())
}

fn undo_organization(organizer: &mut FileOrganizer) -> Result<(), String> {
    OutputFormatter::info("Undoing previous organization...");

    match organizer.undo() {
        Ok(report) => {
            OutputFormatter::success(&format!(
                "Undo completed: {} restored.",
                report.restored
            ));
            Ok(())
        }
        Err(UndoError::NothingToUndo) => {
            OutputFormatter::warning("No organization actions to undo.");
            Ok(())
        }
        Err(e) => {
            if e.remaining() > 0 {
                OutputFormatter::warning(&format!(
                    "{} moves are still recorded. Fix the problem and run 'filesort undo' again.",
                    e.remaining()
                ));
            }
            Err(e.to_string())
        }
    }
}

fn show_status(organizer: &FileOrganizer) {
    if !organizer.has_pending_undo() {
        OutputFormatter::plain("Nothing to undo.");
        return;
    }

    let record = organizer.pending_undo();
    OutputFormatter::info(&format!(
        "Undo available for {} moved {} (log: {}):",
        record.len(),
        if record.len() == 1 { "file" } else { "files" },
        organizer.undo_log().path().display()
    ));
    for moved in record {
        OutputFormatter::plain(&format!(
            " - {} ← {}",
            moved.original_path.display(),
            moved.current_path.display()
        ));
    }
}
