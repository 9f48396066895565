/// Durable storage for the undo record of the last organize run.
///
/// The record is kept in a single JSON file as an array of
/// `[current_path, original_path]` pairs, in the order the files were moved:
///
/// ```json
/// [
///   ["/home/me/Downloads/pdf/report.pdf", "/home/me/Downloads/report.pdf"],
///   ["/home/me/Downloads/jpg/cat.jpg", "/home/me/Downloads/cat.jpg"]
/// ]
/// ```
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the undo log, relative to the working directory.
pub const DEFAULT_UNDO_LOG: &str = "undo_log.json";

/// One file move that can be reversed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(PathBuf, PathBuf)", into = "(PathBuf, PathBuf)")]
pub struct MovedFile {
    /// Where the file is now.
    pub current_path: PathBuf,
    /// Where the file was before it was organized.
    pub original_path: PathBuf,
}

impl MovedFile {
    pub fn new(current_path: PathBuf, original_path: PathBuf) -> Self {
        Self {
            current_path,
            original_path,
        }
    }
}

impl From<(PathBuf, PathBuf)> for MovedFile {
    fn from((current_path, original_path): (PathBuf, PathBuf)) -> Self {
        Self::new(current_path, original_path)
    }
}

impl From<MovedFile> for (PathBuf, PathBuf) {
    fn from(moved: MovedFile) -> Self {
        (moved.current_path, moved.original_path)
    }
}

/// The reversible description of the most recent organize run.
///
/// Only one record is ever live. A new run replaces it wholesale instead of
/// appending to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UndoRecord {
    moves: Vec<MovedFile>,
}

impl UndoRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a move, keeping insertion order.
    pub fn push(&mut self, moved: MovedFile) {
        self.moves.push(moved);
    }

    /// Removes and returns the most recently recorded move.
    pub fn pop(&mut self) -> Option<MovedFile> {
        self.moves.pop()
    }

    pub fn last(&self) -> Option<&MovedFile> {
        self.moves.last()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MovedFile> {
        self.moves.iter()
    }
}

impl FromIterator<MovedFile> for UndoRecord {
    fn from_iter<I: IntoIterator<Item = MovedFile>>(iter: I) -> Self {
        Self {
            moves: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a UndoRecord {
    type Item = &'a MovedFile;
    type IntoIter = std::slice::Iter<'a, MovedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}

/// Errors raised while reading or writing the undo log.
#[derive(Error, Debug)]
pub enum UndoLogError {
    #[error("Failed to read undo log {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Undo log {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write undo log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize undo log: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reads and writes the undo record at a fixed path.
#[derive(Debug, Clone)]
pub struct UndoLogStore {
    path: PathBuf,
}

impl UndoLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the undo log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted record, degrading to an empty one.
    ///
    /// A missing file means nothing to undo. An unreadable or corrupt file is
    /// logged and also treated as nothing to undo, so a damaged log never
    /// prevents the application from starting.
    pub fn load(&self) -> UndoRecord {
        match self.try_load() {
            Ok(Some(record)) => record,
            Ok(None) => UndoRecord::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unusable undo log");
                UndoRecord::new()
            }
        }
    }

    /// Loads the persisted record, reporting why it could not be read.
    ///
    /// Returns `Ok(None)` when no undo log exists yet.
    pub fn try_load(&self) -> Result<Option<UndoRecord>, UndoLogError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json_string = fs::read_to_string(&self.path).map_err(|e| UndoLogError::Read {
            path: self.path.clone(),
            source: e,
        })?;

        let record = serde_json::from_str(&json_string).map_err(|e| UndoLogError::Corrupt {
            path: self.path.clone(),
            source: e,
        })?;

        Ok(Some(record))
    }

    /// Writes the full record, replacing whatever was stored before.
    pub fn save(&self, record: &UndoRecord) -> Result<(), UndoLogError> {
        let json_string = serde_json::to_string_pretty(record)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| UndoLogError::Write {
                path: self.path.clone(),
                source: e,
            })?;
        }

        fs::write(&self.path, json_string).map_err(|e| UndoLogError::Write {
            path: self.path.clone(),
            source: e,
        })?;

        tracing::debug!(path = %self.path.display(), moves = record.len(), "undo log saved");
        Ok(())
    }
}

impl Default for UndoLogStore {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LOG)
    }
}
