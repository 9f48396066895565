/// Classification of files into destination folders.
///
/// Every function here is pure: it maps a piece of file metadata
/// (modification time, file name, byte size) to the name of the subfolder
/// the file belongs in. Nothing in this module touches the filesystem.
///
/// # Examples
///
/// ```
/// use filesort::classifier::{SizeCategory, classify_by_extension, classify_by_size};
///
/// assert_eq!(classify_by_size(512), SizeCategory::Small);
/// assert_eq!(classify_by_size(4096), SizeCategory::Medium);
/// assert_eq!(classify_by_extension("report.pdf"), Some("pdf"));
/// assert_eq!(classify_by_extension("README"), None);
/// ```
use chrono::{DateTime, Datelike, Local, Month};
use std::fs::Metadata;
use std::io;
use std::path::PathBuf;
use std::time::SystemTime;

/// Upper bound (exclusive) of the small size class: 1 KiB.
pub const SMALL_LIMIT: u64 = 1024;
/// Upper bound (exclusive) of the medium size class: 1 MiB.
pub const MEDIUM_LIMIT: u64 = 1024 * 1024;

/// The rule used to pick a destination folder for each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrganizeMethod {
    /// `{year}/{month}` of the last modification, in local time.
    ByDate,
    /// The file extension, e.g. `pdf`.
    ByExtension,
    /// One of the three size classes.
    BySize,
}

impl OrganizeMethod {
    /// Returns a short lowercase label for this method.
    pub fn label(&self) -> &'static str {
        match self {
            OrganizeMethod::ByDate => "date",
            OrganizeMethod::ByExtension => "extension",
            OrganizeMethod::BySize => "size",
        }
    }
}

/// Size class of a file.
///
/// Boundaries are half-open: `[0, 1024)`, `[1024, 1048576)`, `[1048576, ∞)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeCategory {
    /// Less than 1 KiB.
    Small,
    /// At least 1 KiB and less than 1 MiB.
    Medium,
    /// 1 MiB or more.
    Large,
}

impl SizeCategory {
    /// Returns the directory name for this size class.
    ///
    /// # Examples
    ///
    /// ```
    /// use filesort::classifier::SizeCategory;
    ///
    /// assert_eq!(SizeCategory::Small.dir_name(), "Small Files");
    /// assert_eq!(SizeCategory::Large.dir_name(), "Large Files");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            SizeCategory::Small => "Small Files",
            SizeCategory::Medium => "Medium Files",
            SizeCategory::Large => "Large Files",
        }
    }
}

/// A `{year}/{month-name}` folder derived from a modification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateFolder {
    pub year: i32,
    pub month: Month,
}

impl DateFolder {
    /// Returns the two-level relative path, e.g. `2023/December`.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.year.to_string()).join(self.month.name())
    }
}

/// Maps a modification time to its local calendar year and month.
pub fn classify_by_date(modified: SystemTime) -> DateFolder {
    let local: DateTime<Local> = modified.into();
    // month() is always within 1..=12
    let month = Month::try_from(local.month() as u8).unwrap_or(Month::January);
    DateFolder {
        year: local.year(),
        month,
    }
}

/// Returns the extension of a file name, or `None` when it has none.
///
/// The extension is the text after the last `.`. Names without a dot,
/// names whose only dot is the leading one (`.bashrc`) and names ending
/// in a dot (`notes.`) have no extension. Case is preserved.
pub fn classify_by_extension(file_name: &str) -> Option<&str> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension)
}

/// Maps a byte size to its size class.
pub fn classify_by_size(bytes: u64) -> SizeCategory {
    if bytes < SMALL_LIMIT {
        SizeCategory::Small
    } else if bytes < MEDIUM_LIMIT {
        SizeCategory::Medium
    } else {
        SizeCategory::Large
    }
}

/// Computes the destination folder of a file, relative to the organized folder.
///
/// `no_extension_folder` is used by [`OrganizeMethod::ByExtension`] for names
/// without an extension. Fails only when the platform cannot report the
/// modification time.
pub fn destination_folder(
    method: OrganizeMethod,
    file_name: &str,
    metadata: &Metadata,
    no_extension_folder: &str,
) -> io::Result<PathBuf> {
    let folder = match method {
        OrganizeMethod::ByDate => classify_by_date(metadata.modified()?).relative_path(),
        OrganizeMethod::ByExtension => {
            PathBuf::from(classify_by_extension(file_name).unwrap_or(no_extension_folder))
        }
        OrganizeMethod::BySize => PathBuf::from(classify_by_size(metadata.len()).dir_name()),
    };
    Ok(folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn local_time(year: i32, month: u32, day: u32) -> SystemTime {
        Local
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .expect("unambiguous local time")
            .into()
    }

    #[test]
    fn test_size_boundaries_are_exact() {
        assert_eq!(classify_by_size(0), SizeCategory::Small);
        assert_eq!(classify_by_size(1023), SizeCategory::Small);
        assert_eq!(classify_by_size(1024), SizeCategory::Medium);
        assert_eq!(classify_by_size(1_048_575), SizeCategory::Medium);
        assert_eq!(classify_by_size(1_048_576), SizeCategory::Large);
        assert_eq!(classify_by_size(u64::MAX), SizeCategory::Large);
    }

    #[test]
    fn test_date_folder_uses_year_and_full_month_name() {
        let folder = classify_by_date(local_time(2023, 12, 15));
        assert_eq!(folder.year, 2023);
        assert_eq!(folder.month, Month::December);
        assert_eq!(folder.relative_path(), PathBuf::from("2023").join("December"));
    }

    #[test]
    fn test_same_month_gives_same_folder() {
        let early = classify_by_date(local_time(2021, 3, 2));
        let late = classify_by_date(local_time(2021, 3, 28));
        assert_eq!(early, late);

        let next = classify_by_date(local_time(2021, 4, 2));
        assert_ne!(early, next);
    }

    #[test]
    fn test_year_segment_has_four_digits() {
        let folder = classify_by_date(local_time(1999, 1, 10));
        let first = folder.relative_path();
        let year = first.iter().next().expect("year segment");
        assert_eq!(year.to_string_lossy(), "1999");
    }

    #[test]
    fn test_extension_after_last_dot() {
        assert_eq!(classify_by_extension("a.txt"), Some("txt"));
        assert_eq!(classify_by_extension("archive.tar.gz"), Some("gz"));
        assert_eq!(classify_by_extension("photo.JPG"), Some("JPG"));
        assert_eq!(classify_by_extension(".config.json"), Some("json"));
    }

    #[test]
    fn test_names_without_extension() {
        assert_eq!(classify_by_extension("README"), None);
        assert_eq!(classify_by_extension(".bashrc"), None);
        assert_eq!(classify_by_extension("notes."), None);
        assert_eq!(classify_by_extension(""), None);
    }

    #[test]
    fn test_destination_folder_per_method() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("data.csv");
        fs::write(&file_path, vec![0u8; 2048]).expect("Failed to write test file");
        let metadata = fs::metadata(&file_path).expect("Failed to read metadata");

        let by_ext =
            destination_folder(OrganizeMethod::ByExtension, "data.csv", &metadata, "No Extension")
                .expect("classify");
        assert_eq!(by_ext, PathBuf::from("csv"));

        let by_size =
            destination_folder(OrganizeMethod::BySize, "data.csv", &metadata, "No Extension")
                .expect("classify");
        assert_eq!(by_size, PathBuf::from("Medium Files"));

        let by_date =
            destination_folder(OrganizeMethod::ByDate, "data.csv", &metadata, "No Extension")
                .expect("classify");
        assert_eq!(by_date.components().count(), 2);
    }

    #[test]
    fn test_destination_folder_without_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("Makefile");
        fs::write(&file_path, "all:").expect("Failed to write test file");
        let metadata = fs::metadata(&file_path).expect("Failed to read metadata");

        let folder =
            destination_folder(OrganizeMethod::ByExtension, "Makefile", &metadata, "misc")
                .expect("classify");
        assert_eq!(folder, PathBuf::from("misc"));
    }
}
