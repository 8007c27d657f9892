/// Rename preview with conflict detection.
///
/// Previewing applies the rule chain to every filtered file and annotates the
/// rows that cannot be executed. It only reads the filesystem, so it can be
/// run any number of times.
use crate::name_rule::{RuleChain, split_name};
use crate::scanner::FileEntry;
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Characters that may not appear in a new name.
///
/// Path separators are included so that a rename never leaves the directory.
pub const RESERVED_CHARS: [char; 9] = ['<', '>', ':', '"', '|', '?', '*', '/', '\\'];

/// Device names that are reserved regardless of extension or case.
pub const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Longest accepted file name, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Why a preview row cannot be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// The new name fails [`validate_filename`].
    InvalidName,
    /// Another file already has the new name.
    AlreadyExists,
    /// An earlier row of the same preview maps to the same new name.
    DuplicateInBatch,
}

impl ConflictReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictReason::InvalidName => "invalid filename",
            ConflictReason::AlreadyExists => "name already exists",
            ConflictReason::DuplicateInBatch => "duplicate name in batch",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file of a preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRow {
    pub original_name: String,
    pub new_name: String,
    /// Current path of the file.
    pub source_path: PathBuf,
    /// `None` when the row can be executed.
    pub conflict: Option<ConflictReason>,
    pub size: u64,
    pub modified_at: DateTime<Local>,
}

impl PreviewRow {
    pub fn is_conflict(&self) -> bool {
        self.conflict.is_some()
    }

    /// True when the rule chain left the name as it was.
    pub fn is_unchanged(&self) -> bool {
        self.new_name == self.original_name
    }

    /// Where the file ends up: next to the source, under the new name.
    pub fn target_path(&self) -> PathBuf {
        match self.source_path.parent() {
            Some(parent) => parent.join(&self.new_name),
            None => PathBuf::from(&self.new_name),
        }
    }
}

/// Checks whether `name` is acceptable as a file name.
///
/// ```
/// use bulk_renamer::preview::validate_filename;
///
/// assert!(validate_filename("report.txt"));
/// assert!(!validate_filename("what?.txt"));
/// assert!(!validate_filename("con.log"));
/// assert!(!validate_filename(".."));
/// ```
pub fn validate_filename(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    if name.len() > MAX_NAME_LEN {
        return false;
    }
    if name.contains(RESERVED_CHARS) {
        return false;
    }
    let stem = split_name(name).0.to_uppercase();
    !RESERVED_NAMES.contains(&stem.as_str())
}

/// Returns true if anything occupies `path`, including a symlink whose
/// target is missing.
pub fn is_name_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Counts over a set of preview rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewSummary {
    pub total: usize,
    /// Rows that will be renamed.
    pub changed: usize,
    pub unchanged: usize,
    pub conflicts: usize,
}

impl PreviewSummary {
    pub fn from_rows(rows: &[PreviewRow]) -> Self {
        let mut summary = Self {
            total: rows.len(),
            ..Self::default()
        };
        for row in rows {
            if row.is_conflict() {
                summary.conflicts += 1;
            } else if row.is_unchanged() {
                summary.unchanged += 1;
            } else {
                summary.changed += 1;
            }
        }
        summary
    }
}

/// Builds preview rows.
pub struct PreviewEngine;

impl PreviewEngine {
    /// Applies `rules` to every file of the filtered set.
    ///
    /// Rows come back in the order of `files`; the index handed to the rule
    /// chain is the 0-based position within `files`. Existence checks are
    /// made against `directory`.
    pub fn preview(directory: &Path, files: &[FileEntry], rules: &RuleChain) -> Vec<PreviewRow> {
        let mut claimed: HashSet<String> = HashSet::new();

        files
            .iter()
            .enumerate()
            .map(|(index, file)| {
                let new_name = rules.apply(&file.name, index);
                let conflict = Self::check(directory, &file.name, &new_name, &claimed);
                if conflict.is_none() {
                    claimed.insert(new_name.clone());
                }

                PreviewRow {
                    original_name: file.name.clone(),
                    new_name,
                    source_path: file.path.clone(),
                    conflict,
                    size: file.size,
                    modified_at: file.modified_at,
                }
            })
            .collect()
    }

    fn check(
        directory: &Path,
        original_name: &str,
        new_name: &str,
        claimed: &HashSet<String>,
    ) -> Option<ConflictReason> {
        // A file that keeps its name is never touched, valid or not
        if new_name == original_name {
            return None;
        }
        // An invalid name must not be joined onto the directory: "" and "."
        // would resolve to the directory itself
        if !validate_filename(new_name) {
            return Some(ConflictReason::InvalidName);
        }
        if is_name_taken(&directory.join(new_name)) {
            return Some(ConflictReason::AlreadyExists);
        }
        if claimed.contains(new_name) {
            return Some(ConflictReason::DuplicateInBatch);
        }
        None
    }
}
