/// Directory listing for the renaming engine.
///
/// Scanning is non-recursive and only reports regular files. The result is a
/// snapshot: every rescan replaces the previous listing wholesale.
use crate::error::{RenamerError, RenamerResult};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A regular file found by [`scan_directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// The file name, without any directory component.
    pub name: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified_at: DateTime<Local>,
}

impl FileEntry {
    /// Returns true for dot-files.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// Lists the regular files in `directory`, sorted by case-insensitive name.
///
/// Subdirectories and special files are skipped, and so is any entry whose
/// metadata cannot be read or whose name is not valid UTF-8.
///
/// # Errors
///
/// Returns [`RenamerError::NotFound`] if `directory` does not exist or is not
/// a directory.
///
/// # Examples
///
/// ```no_run
/// use bulk_renamer::scanner::scan_directory;
/// use std::path::Path;
///
/// for entry in scan_directory(Path::new("/path/to/photos")).unwrap() {
///     println!("{} ({} bytes)", entry.name, entry.size);
/// }
/// ```
pub fn scan_directory(directory: &Path) -> RenamerResult<Vec<FileEntry>> {
    if !directory.is_dir() {
        return Err(RenamerError::NotFound {
            path: directory.to_path_buf(),
        });
    }

    let entries = fs::read_dir(directory).map_err(|_| RenamerError::NotFound {
        path: directory.to_path_buf(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", directory.display(), e);
                continue;
            }
        };

        let path = entry.path();
        // Follows symlinks, so a link to a regular file counts as one
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!("Skipping file with non UTF-8 name: {:?}", raw);
                continue;
            }
        };

        let modified_at = match metadata.modified() {
            Ok(time) => DateTime::<Local>::from(time),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        files.push(FileEntry {
            name,
            path,
            size: metadata.len(),
            modified_at,
        });
    }

    files.sort_by_cached_key(|file| file.name.to_lowercase());
    debug!("Scanned {} files in {}", files.len(), directory.display());

    Ok(files)
}
