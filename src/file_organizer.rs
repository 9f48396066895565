/// The organize transaction: classify every file of a folder, move it into
/// its destination subfolder and record the move so it can be undone.
///
/// [`FileOrganizer`] owns the single live [`UndoRecord`]. A run that moves at
/// least one file replaces that record and persists it through the
/// [`UndoLogStore`], whether the run completes, is cancelled or fails partway.
use crate::classifier::{OrganizeMethod, destination_folder};
use crate::config::{CompiledFilters, Config, ConfigError};
use crate::progress::ProgressSink;
use crate::undo::{UndoError, UndoManager, UndoReport};
use crate::undo_log::{MovedFile, UndoLogError, UndoLogStore, UndoRecord};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How an organize run ended when nothing went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeOutcome {
    /// The folder had no eligible files. The previous undo record is kept.
    NothingToOrganize,
    /// Every eligible file was moved.
    Completed { moved: usize },
    /// The progress sink asked to stop. Files already moved stay moved.
    Cancelled { moved: usize, remaining: usize },
}

impl OrganizeOutcome {
    /// Number of files moved by the run.
    pub fn moved(&self) -> usize {
        match self {
            OrganizeOutcome::NothingToOrganize => 0,
            OrganizeOutcome::Completed { moved } | OrganizeOutcome::Cancelled { moved, .. } => {
                *moved
            }
        }
    }
}

/// Errors that stop an organize run.
///
/// Every variant raised after enumeration carries `moved_count`, the number of
/// files moved before the failure. Those moves are not rolled back; they are
/// in the persisted undo record.
#[derive(Error, Debug)]
pub enum OrganizeError {
    #[error("Cannot read folder {path}: {source}")]
    FolderUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read metadata of {path}: {source}")]
    FileMetadata {
        path: PathBuf,
        #[source]
        source: io::Error,
        moved_count: usize,
    },

    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
        moved_count: usize,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
        moved_count: usize,
    },

    #[error("Moved {moved_count} files but could not save the undo log: {source}")]
    UndoLogSave {
        #[source]
        source: UndoLogError,
        moved_count: usize,
    },
}

impl OrganizeError {
    /// Number of files moved before the run stopped.
    pub fn moved_count(&self) -> usize {
        match self {
            OrganizeError::FolderUnreadable { .. } => 0,
            OrganizeError::FileMetadata { moved_count, .. }
            | OrganizeError::DirectoryCreationFailed { moved_count, .. }
            | OrganizeError::FileMoveFailure { moved_count, .. }
            | OrganizeError::UndoLogSave { moved_count, .. } => *moved_count,
        }
    }
}

/// Where one file would go, as computed by [`FileOrganizer::plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Destination folder relative to the organized folder, e.g. `2023/December`.
    pub folder: PathBuf,
    /// A file already sits at `destination`; organizing would fail on it.
    pub destination_exists: bool,
}

/// Moves files into subfolders and keeps the undo record of the last run.
pub struct FileOrganizer {
    store: UndoLogStore,
    pending: UndoRecord,
    filters: CompiledFilters,
    no_extension_folder: String,
    backup_enabled: bool,
}

impl FileOrganizer {
    /// Creates an organizer from settings and loads the persisted undo record.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let filters = config.compile_filters()?;
        let store = UndoLogStore::new(&config.undo_log);
        let pending = store.load();

        Ok(Self {
            store,
            pending,
            filters,
            no_extension_folder: config.no_extension_folder.clone(),
            backup_enabled: config.backup_enabled,
        })
    }

    /// Creates an organizer with default settings around an existing store.
    pub fn with_store(store: UndoLogStore) -> Self {
        let pending = store.load();
        let defaults = Config::default();
        Self {
            store,
            pending,
            filters: CompiledFilters::default(),
            no_extension_folder: defaults.no_extension_folder,
            backup_enabled: defaults.backup_enabled,
        }
    }

    /// Whether [`FileOrganizer::undo`] has anything to reverse.
    pub fn has_pending_undo(&self) -> bool {
        !self.pending.is_empty()
    }

    /// The live undo record.
    pub fn pending_undo(&self) -> &UndoRecord {
        &self.pending
    }

    pub fn undo_log(&self) -> &UndoLogStore {
        &self.store
    }

    /// Lists the files of `folder` that an organize run would move.
    ///
    /// Only direct children that are regular files count; directories and
    /// symlinks are skipped, the undo log itself and filtered names too.
    /// The result is sorted by file name.
    pub fn eligible_files(&self, folder: &Path) -> Result<Vec<PathBuf>, OrganizeError> {
        let unreadable = |e| OrganizeError::FolderUnreadable {
            path: folder.to_path_buf(),
            source: e,
        };
        let entries = fs::read_dir(folder).map_err(unreadable)?;
        let undo_log = fs::canonicalize(self.store.path()).ok();

        let mut files = Vec::new();
        for entry in entries.flatten() {
            if let Ok(file_type) = entry.file_type()
                && file_type.is_file()
            {
                let path = entry.path();
                let name = entry.file_name();
                if !self.filters.should_include(&name.to_string_lossy()) {
                    tracing::debug!(path = %path.display(), "excluded by filters");
                    continue;
                }
                if let Some(log_path) = &undo_log
                    && fs::canonicalize(&path).ok().as_ref() == Some(log_path)
                {
                    continue;
                }
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Computes where every eligible file would go, without moving anything.
    pub fn plan(
        &self,
        folder: &Path,
        method: OrganizeMethod,
    ) -> Result<Vec<PlannedMove>, OrganizeError> {
        let folder = resolve_folder(folder)?;
        self.eligible_files(&folder)?
            .into_iter()
            .map(|source| -> Result<PlannedMove, OrganizeError> {
                let (name, metadata) = inspect(&source, 0)?;
                let relative = destination_folder(
                    method,
                    &name.to_string_lossy(),
                    &metadata,
                    &self.no_extension_folder,
                )
                .map_err(|e| OrganizeError::FileMetadata {
                    path: source.clone(),
                    source: e,
                    moved_count: 0,
                })?;
                let destination = folder.join(&relative).join(&name);
                Ok(PlannedMove {
                    destination_exists: destination.symlink_metadata().is_ok(),
                    source,
                    destination,
                    folder: relative,
                })
            })
            .collect()
    }

    /// Organizes the files of `folder` into subfolders chosen by `method`.
    ///
    /// Files are enumerated once, then processed one at a time: classify,
    /// create the destination folder if needed, move, record. Progress is
    /// reported after each file and cancellation is checked before each one.
    ///
    /// # Errors
    ///
    /// The first failing file stops the run. Files moved before it stay
    /// moved and are saved as the new undo record.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use filesort::{Config, FileOrganizer, OrganizeMethod, NoProgress};
    /// use std::path::Path;
    ///
    /// let mut organizer = FileOrganizer::new(&Config::default()).unwrap();
    /// match organizer.organize(Path::new("/home/me/Downloads"), OrganizeMethod::ByExtension, &mut NoProgress) {
    ///     Ok(outcome) => println!("Moved {} files", outcome.moved()),
    ///     Err(e) => eprintln!("Organization failed: {}", e),
    /// }
    /// ```
    pub fn organize(
        &mut self,
        folder: &Path,
        method: OrganizeMethod,
        progress: &mut dyn ProgressSink,
    ) -> Result<OrganizeOutcome, OrganizeError> {
        let folder = resolve_folder(folder)?;
        let files = self.eligible_files(&folder)?;
        if files.is_empty() {
            tracing::info!(folder = %folder.display(), "no files to organize");
            return Ok(OrganizeOutcome::NothingToOrganize);
        }

        if self.backup_enabled {
            tracing::warn!("backups are not implemented; organizing without a backup copy");
        }

        // an unwritable undo log must stop the run before the first move
        self.store
            .save(&self.pending)
            .map_err(|e| OrganizeError::UndoLogSave {
                source: e,
                moved_count: 0,
            })?;

        let total = files.len();
        let mut record = UndoRecord::new();
        tracing::info!(folder = %folder.display(), method = method.label(), total, "organizing");

        for (index, file_path) in files.iter().enumerate() {
            if progress.is_cancelled() {
                let moved = record.len();
                self.commit(record)?;
                tracing::info!(moved, remaining = total - index, "organize cancelled");
                return Ok(OrganizeOutcome::Cancelled {
                    moved,
                    remaining: total - index,
                });
            }

            match self.move_one(&folder, file_path, method, record.len()) {
                Ok(moved) => record.push(moved),
                Err(e) => {
                    if let Err(save_error) = self.commit(record) {
                        tracing::warn!(error = %save_error, "could not save partial undo record");
                    }
                    return Err(e);
                }
            }

            progress.report((index + 1) as f64 / total as f64);
        }

        let moved = record.len();
        self.commit(record)?;
        tracing::info!(moved, "organize complete");
        Ok(OrganizeOutcome::Completed { moved })
    }

    /// Reverses the last organize run. See [`UndoManager::undo`].
    pub fn undo(&mut self) -> Result<UndoReport, UndoError> {
        UndoManager::undo(&mut self.pending, &self.store)
    }

    /// Moves one file into its destination folder and returns the record of it.
    fn move_one(
        &self,
        folder: &Path,
        file_path: &Path,
        method: OrganizeMethod,
        moved_count: usize,
    ) -> Result<MovedFile, OrganizeError> {
        let (name, metadata) = inspect(file_path, moved_count)?;
        let relative = destination_folder(
            method,
            &name.to_string_lossy(),
            &metadata,
            &self.no_extension_folder,
        )
        .map_err(|e| OrganizeError::FileMetadata {
            path: file_path.to_path_buf(),
            source: e,
            moved_count,
        })?;

        let destination_dir = folder.join(&relative);
        let destination = destination_dir.join(&name);
        let move_failure = |e| OrganizeError::FileMoveFailure {
            from: file_path.to_path_buf(),
            to: destination.clone(),
            source: e,
            moved_count,
        };

        // the undo log stores paths as JSON strings
        if file_path.to_str().is_none() || destination.to_str().is_none() {
            return Err(move_failure(io::Error::new(
                io::ErrorKind::InvalidData,
                "path is not valid UTF-8 and cannot be recorded for undo",
            )));
        }

        fs::create_dir_all(&destination_dir).map_err(|e| {
            OrganizeError::DirectoryCreationFailed {
                path: destination_dir.clone(),
                source: e,
                moved_count,
            }
        })?;

        // rename() silently replaces an existing file on Unix
        if destination.symlink_metadata().is_ok() {
            return Err(move_failure(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "destination already exists",
            )));
        }
        fs::rename(file_path, &destination).map_err(move_failure)?;

        tracing::debug!(from = %file_path.display(), to = %destination.display(), "moved");
        Ok(MovedFile::new(destination, file_path.to_path_buf()))
    }

    /// Makes `record` the live undo record and persists it.
    ///
    /// An empty record leaves the previous one in place.
    fn commit(&mut self, record: UndoRecord) -> Result<(), OrganizeError> {
        if record.is_empty() {
            return Ok(());
        }
        let moved_count = record.len();
        self.pending = record;
        self.store
            .save(&self.pending)
            .map_err(|e| OrganizeError::UndoLogSave {
                source: e,
                moved_count,
            })
    }
}

/// Turns `folder` into an absolute path so recorded moves survive a change of
/// working directory.
fn resolve_folder(folder: &Path) -> Result<PathBuf, OrganizeError> {
    fs::canonicalize(folder).map_err(|e| OrganizeError::FolderUnreadable {
        path: folder.to_path_buf(),
        source: e,
    })
}

fn inspect(
    file_path: &Path,
    moved_count: usize,
) -> Result<(std::ffi::OsString, fs::Metadata), OrganizeError> {
    let metadata_error = |e| OrganizeError::FileMetadata {
        path: file_path.to_path_buf(),
        source: e,
        moved_count,
    };
    let name = file_path
        .file_name()
        .ok_or_else(|| {
            metadata_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "file has no name component",
            ))
        })?
        .to_os_string();
    let metadata = fs::metadata(file_path).map_err(metadata_error)?;
    Ok((name, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use tempfile::TempDir;

    struct Workspace {
        _temp_dir: TempDir,
        folder: PathBuf,
        log: PathBuf,
    }

    fn workspace() -> Workspace {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = fs::canonicalize(temp_dir.path()).expect("Failed to resolve temp directory");
        let folder = root.join("inbox");
        fs::create_dir(&folder).expect("Failed to create folder");
        Workspace {
            _temp_dir: temp_dir,
            log: root.join("undo_log.json"),
            folder,
        }
    }

    #[test]
    fn test_eligible_files_skips_directories() {
        let ws = workspace();
        fs::write(ws.folder.join("b.txt"), "b").expect("Failed to write file");
        fs::write(ws.folder.join("a.txt"), "a").expect("Failed to write file");
        fs::create_dir(ws.folder.join("sub")).expect("Failed to create subdir");
        fs::write(ws.folder.join("sub").join("nested.txt"), "n").expect("Failed to write file");

        let organizer = FileOrganizer::with_store(UndoLogStore::new(&ws.log));
        let files = organizer.eligible_files(&ws.folder).expect("enumerate");

        assert_eq!(files, vec![ws.folder.join("a.txt"), ws.folder.join("b.txt")]);
    }

    #[test]
    fn test_eligible_files_skips_undo_log() {
        let ws = workspace();
        let log = ws.folder.join("undo_log.json");
        fs::write(&log, "[]").expect("Failed to write log");
        fs::write(ws.folder.join("a.txt"), "a").expect("Failed to write file");

        let organizer = FileOrganizer::with_store(UndoLogStore::new(&log));
        let files = organizer.eligible_files(&ws.folder).expect("enumerate");

        assert_eq!(files, vec![ws.folder.join("a.txt")]);
    }

    #[test]
    fn test_organize_moves_and_records() {
        let ws = workspace();
        fs::write(ws.folder.join("a.txt"), "a").expect("Failed to write file");

        let mut organizer = FileOrganizer::with_store(UndoLogStore::new(&ws.log));
        let outcome = organizer
            .organize(&ws.folder, OrganizeMethod::ByExtension, &mut NoProgress)
            .expect("organize");

        assert_eq!(outcome, OrganizeOutcome::Completed { moved: 1 });
        assert!(ws.folder.join("txt").join("a.txt").exists());
        assert!(!ws.folder.join("a.txt").exists());

        let expected: UndoRecord = [MovedFile::new(
            ws.folder.join("txt").join("a.txt"),
            ws.folder.join("a.txt"),
        )]
        .into_iter()
        .collect();
        assert_eq!(organizer.pending_undo(), &expected);
        assert_eq!(UndoLogStore::new(&ws.log).load(), expected);
    }

    #[test]
    fn test_organize_refuses_to_overwrite() {
        let ws = workspace();
        fs::create_dir(ws.folder.join("txt")).expect("Failed to create dir");
        fs::write(ws.folder.join("txt").join("a.txt"), "old").expect("Failed to write file");
        fs::write(ws.folder.join("a.txt"), "new").expect("Failed to write file");

        let mut organizer = FileOrganizer::with_store(UndoLogStore::new(&ws.log));
        let result = organizer.organize(&ws.folder, OrganizeMethod::ByExtension, &mut NoProgress);

        match result {
            Err(OrganizeError::FileMoveFailure {
                source,
                moved_count,
                ..
            }) => {
                assert_eq!(source.kind(), io::ErrorKind::AlreadyExists);
                assert_eq!(moved_count, 0);
            }
            other => panic!("expected move failure, got {:?}", other),
        }
        let kept = fs::read_to_string(ws.folder.join("txt").join("a.txt")).expect("read");
        assert_eq!(kept, "old");
        assert!(ws.folder.join("a.txt").exists());
        assert!(!organizer.has_pending_undo());
    }

    #[test]
    fn test_organize_missing_folder() {
        let ws = workspace();
        let mut organizer = FileOrganizer::with_store(UndoLogStore::new(&ws.log));

        let result = organizer.organize(
            &ws.folder.join("missing"),
            OrganizeMethod::BySize,
            &mut NoProgress,
        );
        assert!(matches!(
            result,
            Err(OrganizeError::FolderUnreadable { .. })
        ));
    }

    #[test]
    fn test_directory_creation_failure_reports_moved_count() {
        let ws = workspace();
        fs::write(ws.folder.join("a.md"), "a").expect("Failed to write file");
        // a regular file named like the destination folder of b.txt
        fs::write(ws.folder.join("txt"), "blocker").expect("Failed to write file");
        fs::write(ws.folder.join("b.txt"), "b").expect("Failed to write file");

        let mut organizer = FileOrganizer::with_store(UndoLogStore::new(&ws.log));
        let error = organizer
            .organize(&ws.folder, OrganizeMethod::ByExtension, &mut NoProgress)
            .expect_err("organize should fail");

        assert!(matches!(error, OrganizeError::DirectoryCreationFailed { .. }));
        assert_eq!(error.moved_count(), 1);
        assert_eq!(organizer.pending_undo().len(), 1);
        assert!(ws.folder.join("md").join("a.md").exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_name_stops_before_moving() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let ws = workspace();
        let odd = ws.folder.join(OsStr::from_bytes(b"b\xff.txt"));
        fs::write(ws.folder.join("a.txt"), "a").expect("Failed to write file");
        fs::write(&odd, "b").expect("Failed to write file");

        let mut organizer = FileOrganizer::with_store(UndoLogStore::new(&ws.log));
        let error = organizer
            .organize(&ws.folder, OrganizeMethod::ByExtension, &mut NoProgress)
            .expect_err("organize should fail");

        match &error {
            OrganizeError::FileMoveFailure { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::InvalidData);
            }
            other => panic!("expected move failure, got {:?}", other),
        }
        assert_eq!(error.moved_count(), 1);
        assert!(odd.exists());
        assert_eq!(UndoLogStore::new(&ws.log).load().len(), 1);
    }

    #[test]
    fn test_unwritable_undo_log_moves_nothing() {
        let ws = workspace();
        fs::write(ws.folder.join("a.txt"), "a").expect("Failed to write file");
        // a directory where the log file should be
        fs::create_dir(&ws.log).expect("Failed to create dir");

        let mut organizer = FileOrganizer::with_store(UndoLogStore::new(&ws.log));
        let error = organizer
            .organize(&ws.folder, OrganizeMethod::ByExtension, &mut NoProgress)
            .expect_err("organize should fail");

        assert!(matches!(error, OrganizeError::UndoLogSave { moved_count: 0, .. }));
        assert!(ws.folder.join("a.txt").exists());
        assert!(!ws.folder.join("txt").exists());
    }

    #[test]
    fn test_plan_moves_nothing() {
        let ws = workspace();
        fs::write(ws.folder.join("a.txt"), "a").expect("Failed to write file");
        fs::write(ws.folder.join("big.bin"), vec![0u8; 2 * 1024 * 1024])
            .expect("Failed to write file");

        let organizer = FileOrganizer::with_store(UndoLogStore::new(&ws.log));
        let plan = organizer
            .plan(&ws.folder, OrganizeMethod::BySize)
            .expect("plan");

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].source, ws.folder.join("a.txt"));
        assert_eq!(plan[0].folder, PathBuf::from("Small Files"));
        assert_eq!(plan[1].destination, ws.folder.join("Large Files").join("big.bin"));
        assert!(!plan[1].destination_exists);
        assert!(ws.folder.join("a.txt").exists());
        assert!(!ws.folder.join("Small Files").exists());
    }
}
