/// Undo functionality for reverting the last organize run.
///
/// Files are moved back from their recorded location to where they were
/// before organizing, most recently moved first. The record shrinks as files
/// are restored, so a failed undo can simply be retried.
use crate::undo_log::{MovedFile, UndoLogError, UndoLogStore, UndoRecord};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result of a successful undo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UndoReport {
    /// Number of files moved back to their original location.
    pub restored: usize,
}

/// Errors that stop an undo.
#[derive(Error, Debug)]
pub enum UndoError {
    #[error("No organization to undo")]
    NothingToUndo,

    #[error("Failed to move {from} back to {to}: {source} ({remaining} moves left to undo)")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
        /// Moves still in the undo record, the failed one included.
        remaining: usize,
        restored: usize,
    },

    #[error("Restored {restored} files but could not save the undo log: {source}")]
    UndoLogSave {
        #[source]
        source: UndoLogError,
        restored: usize,
    },
}

impl UndoError {
    /// Number of recorded moves that are still to be undone.
    pub fn remaining(&self) -> usize {
        match self {
            UndoError::MoveFailed { remaining, .. } => *remaining,
            UndoError::NothingToUndo | UndoError::UndoLogSave { .. } => 0,
        }
    }
}

/// Replays undo records.
pub struct UndoManager;

impl UndoManager {
    /// Undoes every move in `record`, persisting what is left through `store`.
    ///
    /// Each restored move is removed from `record`. When a move fails the
    /// undo stops there, `record` keeps the moves that were not undone and is
    /// saved, so calling `undo` again resumes at the failed file. On success
    /// `record` is empty and the empty state is saved.
    ///
    /// # Errors
    ///
    /// * `NothingToUndo` when `record` is empty; nothing is touched.
    /// * `MoveFailed` when a file is missing, its original location is taken,
    ///   or the move itself fails.
    /// * `UndoLogSave` when every file was restored but the empty record could
    ///   not be written.
    pub fn undo(record: &mut UndoRecord, store: &UndoLogStore) -> Result<UndoReport, UndoError> {
        if record.is_empty() {
            return Err(UndoError::NothingToUndo);
        }

        let mut report = UndoReport::default();
        while let Some(moved) = record.last() {
            match Self::restore_file(moved) {
                Ok(()) => {
                    tracing::debug!(
                        from = %moved.current_path.display(),
                        to = %moved.original_path.display(),
                        "restored"
                    );
                    record.pop();
                    report.restored += 1;
                }
                Err(source) => {
                    let from = moved.current_path.clone();
                    let to = moved.original_path.clone();
                    if let Err(e) = store.save(record) {
                        tracing::warn!(error = %e, "could not save remaining undo record");
                    }
                    return Err(UndoError::MoveFailed {
                        from,
                        to,
                        source,
                        remaining: record.len(),
                        restored: report.restored,
                    });
                }
            }
        }

        store.save(record).map_err(|e| UndoError::UndoLogSave {
            source: e,
            restored: report.restored,
        })?;

        tracing::info!(restored = report.restored, "undo complete");
        Ok(report)
    }

    /// Moves a single file back to its original location.
    ///
    /// Never overwrites a file that now sits at the original location.
    fn restore_file(moved: &MovedFile) -> io::Result<()> {
        if moved.original_path.symlink_metadata().is_ok() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "original location is occupied",
            ));
        }
        fs::rename(&moved.current_path, &moved.original_path)
    }
}
