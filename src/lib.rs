//! filesort - sort the files of a folder into subfolders
//!
//! This library moves the top-level files of a folder into subfolders chosen
//! by modification month, extension or size, records every move, and can
//! undo the most recent run, including after a restart.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod file_organizer;
pub mod output;
pub mod progress;
pub mod undo;
pub mod undo_log;

pub use classifier::{DateFolder, OrganizeMethod, SizeCategory};
pub use config::{CompiledFilters, Config, ConfigError};
pub use file_organizer::{FileOrganizer, OrganizeError, OrganizeOutcome, PlannedMove};
pub use progress::{CancelFlag, NoProgress, ProgressSink};
pub use undo::{UndoError, UndoManager, UndoReport};
pub use undo_log::{MovedFile, UndoLogError, UndoLogStore, UndoRecord};

pub use cli::{Command, run_cli, run_cli_with_cancel};

/// Initialize tracing for the binary.
///
/// Filters come from `RUST_LOG`; output goes to stderr so it never mixes
/// with the progress bar and messages on stdout.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
