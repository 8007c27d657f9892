/// Reversal of executed rename batches.
///
/// This module renames files back to their original names based on a
/// recorded [`HistoryBatch`]. Bookkeeping of the log itself lives in
/// [`HistoryStore`](crate::history::HistoryStore).
use crate::error::{RenamerError, RenamerResult};
use crate::history::{HistoryBatch, Operation};
use crate::preview::is_name_taken;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Represents the result of an undo operation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UndoReport {
    /// Number of files successfully restored.
    pub restored: usize,
    /// Files that were no longer at their new path.
    pub skipped: Vec<PathBuf>,
    /// Files that could not be restored, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl UndoReport {
    /// Returns the total number of operations processed.
    pub fn total_processed(&self) -> usize {
        self.restored + self.failed.len() + self.skipped.len()
    }

    /// Returns true if every operation was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Outcome of restoring one operation.
enum Restore {
    Done,
    Skipped,
}

/// Reverts rename batches.
///
/// `UndoManager` only touches files. Removing the batch from the log is
/// left to [`HistoryStore`](crate::history::HistoryStore), which decides
/// whether the batch may go based on the returned [`UndoReport`].
pub struct UndoManager;

impl UndoManager {
    /// Checks that every operation of `batch` can be reverted right now:
    /// the file must still be at its new path and its old name must be free.
    /// A symlink counts as occupying its name even when its target is gone.
    ///
    /// # Arguments
    ///
    /// * `batch` - The recorded batch to check
    ///
    /// # Errors
    ///
    /// Returns [`RenamerError::UndoConflict`] listing every failing file.
    pub fn check(batch: &HistoryBatch) -> RenamerResult<()> {
        let failures: Vec<String> = batch
            .operations
            .iter()
            .filter_map(|op| {
                if !is_name_taken(&op.new_path) {
                    Some(format!("file not found: {}", op.new_name))
                } else if is_name_taken(&op.old_path) {
                    Some(format!("target already exists: {}", op.old_name))
                } else {
                    None
                }
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(RenamerError::UndoConflict { failures })
        }
    }

    /// Renames every file of `batch` back, most recent operation first.
    ///
    /// Operations whose new path no longer exists are skipped. An original
    /// name that has been taken in the meantime is never overwritten; that
    /// operation is reported as failed.
    ///
    /// # Arguments
    ///
    /// * `batch` - The recorded batch to revert
    ///
    /// # Returns
    ///
    /// An `UndoReport` with restored, skipped and failed operations.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bulk_renamer::history::HistoryStore;
    /// use bulk_renamer::undo::UndoManager;
    /// use std::path::PathBuf;
    ///
    /// let history = HistoryStore::open(PathBuf::from("history.json"));
    /// if let Some(batch) = history.iter().last() {
    ///     let report = UndoManager::revert(batch);
    ///     println!("Restored {} files", report.restored);
    /// }
    /// ```
    pub fn revert(batch: &HistoryBatch) -> UndoReport {
        let mut report = UndoReport::default();

        for operation in batch.operations.iter().rev() {
            match Self::restore(operation) {
                Ok(Restore::Done) => report.restored += 1,
                Ok(Restore::Skipped) => {
                    debug!("Skipping {}: no longer there", operation.new_path.display());
                    report.skipped.push(operation.new_path.clone());
                }
                Err(reason) => {
                    warn!("Could not restore {}: {}", operation.new_path.display(), reason);
                    report.failed.push((operation.new_path.clone(), reason));
                }
            }
        }

        report
    }

    /// Renames one file back to its old name.
    fn restore(operation: &Operation) -> Result<Restore, String> {
        if !is_name_taken(&operation.new_path) {
            return Ok(Restore::Skipped);
        }

        if is_name_taken(&operation.old_path) {
            return Err(format!(
                "original name {} is taken by another file",
                operation.old_name
            ));
        }

        fs::rename(&operation.new_path, &operation.old_path).map_err(|e| {
            RenamerError::RenameIo {
                from: operation.new_path.clone(),
                to: operation.old_path.clone(),
                source: e,
            }
            .to_string()
        })?;

        Ok(Restore::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::path::Path;
    use tempfile::TempDir;

    fn batch(dir: &Path, pairs: &[(&str, &str)]) -> HistoryBatch {
        HistoryBatch::new(
            dir.to_path_buf(),
            pairs
                .iter()
                .map(|(old, new)| Operation {
                    old_name: old.to_string(),
                    new_name: new.to_string(),
                    old_path: dir.join(old),
                    new_path: dir.join(new),
                    executed_at: Local::now(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_revert_single_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("renamed.txt"), "content").expect("Failed to write file");

        let report = UndoManager::revert(&batch(dir, &[("original.txt", "renamed.txt")]));

        assert_eq!(report.restored, 1);
        assert!(report.is_complete_success());
        assert_eq!(report.total_processed(), 1);
        assert_eq!(
            fs::read_to_string(dir.join("original.txt")).expect("Failed to read file"),
            "content"
        );
    }

    #[test]
    fn test_revert_missing_file_is_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let report = UndoManager::revert(&batch(temp_dir.path(), &[("a.txt", "gone.txt")]));

        assert_eq!(report.restored, 0);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.failed.is_empty());
        assert!(!report.is_complete_success());
    }

    #[test]
    fn test_check_reports_every_problem() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("new2.txt"), "2").expect("Failed to write file");
        fs::write(dir.join("old2.txt"), "other").expect("Failed to write file");
        fs::write(dir.join("new3.txt"), "3").expect("Failed to write file");

        let batch = batch(
            dir,
            &[
                ("old1.txt", "new1.txt"),
                ("old2.txt", "new2.txt"),
                ("old3.txt", "new3.txt"),
            ],
        );

        match UndoManager::check(&batch) {
            Err(RenamerError::UndoConflict { failures }) => {
                assert_eq!(
                    failures,
                    vec![
                        "file not found: new1.txt".to_string(),
                        "target already exists: old2.txt".to_string(),
                    ]
                );
            }
            other => panic!("Expected UndoConflict, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_blocks_restore() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("new.txt"), "content").expect("Failed to write file");
        std::os::unix::fs::symlink("/non/existent/target", dir.join("old.txt"))
            .expect("Failed to create symlink");

        let batch = batch(dir, &[("old.txt", "new.txt")]);
        match UndoManager::check(&batch) {
            Err(RenamerError::UndoConflict { failures }) => {
                assert_eq!(failures, vec!["target already exists: old.txt".to_string()]);
            }
            other => panic!("Expected UndoConflict, got {:?}", other),
        }

        let report = UndoManager::revert(&batch);
        assert_eq!(report.restored, 0);
        assert_eq!(report.failed.len(), 1);
        assert!(dir.join("new.txt").is_file());
        assert!(
            fs::symlink_metadata(dir.join("old.txt"))
                .expect("Symlink should still exist")
                .file_type()
                .is_symlink()
        );
    }

    #[test]
    fn test_check_passes_for_clean_batch() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("new.txt"), "x").expect("Failed to write file");

        assert!(UndoManager::check(&batch(dir, &[("old.txt", "new.txt")])).is_ok());
    }
}
