/// Execution of previewed renames.
///
/// Each row is an independent filesystem rename. A failing row is reported
/// and the batch carries on; renames that already happened are kept.
use crate::error::RenamerError;
use crate::history::{HistoryBatch, Operation};
use crate::preview::{ConflictReason, PreviewRow, is_name_taken};
use chrono::Local;
use std::fmt;
use std::fs;
use std::ops::ControlFlow;
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of executing a preview.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub success_count: usize,
    pub error_count: usize,
    /// One `"{original}: {reason}"` line per conflicting or failed row.
    pub errors: Vec<String>,
    /// The successful renames in execution order, if there were any.
    pub batch: Option<HistoryBatch>,
    /// True when the progress callback stopped the batch early.
    pub cancelled: bool,
}

impl ExecutionReport {
    fn record_error(&mut self, row: &PreviewRow, reason: impl fmt::Display) {
        self.error_count += 1;
        self.errors.push(format!("{}: {}", row.original_name, reason));
    }
}

/// Performs the renames of a preview.
pub struct RenameExecutor;

impl RenameExecutor {
    /// Executes `rows` in order. See [`RenameExecutor::execute_with_progress`].
    pub fn execute(directory: &Path, rows: &[PreviewRow]) -> ExecutionReport {
        Self::execute_with_progress(directory, rows, |_| ControlFlow::Continue(()))
    }

    /// Executes `rows` in order, calling `on_row` after each one.
    ///
    /// - Conflicting rows are not renamed and are counted as errors
    /// - Rows whose name does not change are skipped silently
    /// - Everything else is renamed to `directory/new_name`, unless something
    ///   already occupies that name; existing files are never overwritten
    ///
    /// Returning [`ControlFlow::Break`] from `on_row` stops before the next
    /// row; renames done so far still end up in the returned batch.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use bulk_renamer::executor::RenameExecutor;
    /// use bulk_renamer::preview::PreviewEngine;
    /// use bulk_renamer::name_rule::RuleChain;
    /// use bulk_renamer::scanner::scan_directory;
    /// use std::path::Path;
    ///
    /// let dir = Path::new("/path/to/photos");
    /// let files = scan_directory(dir).unwrap();
    /// let rows = PreviewEngine::preview(dir, &files, &RuleChain::new());
    /// let report = RenameExecutor::execute(dir, &rows);
    /// println!("{} renamed, {} failed", report.success_count, report.error_count);
    /// ```
    pub fn execute_with_progress<F>(
        directory: &Path,
        rows: &[PreviewRow],
        mut on_row: F,
    ) -> ExecutionReport
    where
        F: FnMut(&PreviewRow) -> ControlFlow<()>,
    {
        let mut report = ExecutionReport::default();
        let mut operations = Vec::new();

        for row in rows {
            if let Some(reason) = row.conflict {
                report.record_error(row, reason);
            } else if !row.is_unchanged() {
                let new_path = directory.join(&row.new_name);
                // The target may have appeared since the preview was made
                if is_name_taken(&new_path) {
                    warn!(
                        "Not renaming {}: {} appeared after the preview",
                        row.original_name, row.new_name
                    );
                    report.record_error(row, ConflictReason::AlreadyExists);
                } else {
                    match fs::rename(&row.source_path, &new_path) {
                        Ok(()) => {
                            debug!("Renamed {} -> {}", row.original_name, row.new_name);
                            report.success_count += 1;
                            operations.push(Operation {
                                old_name: row.original_name.clone(),
                                new_name: row.new_name.clone(),
                                old_path: row.source_path.clone(),
                                new_path,
                                executed_at: Local::now(),
                            });
                        }
                        Err(e) => {
                            let reason = e.to_string();
                            warn!(
                                "{}",
                                RenamerError::RenameIo {
                                    from: row.source_path.clone(),
                                    to: new_path,
                                    source: e,
                                }
                            );
                            report.record_error(row, reason);
                        }
                    }
                }
            }

            if on_row(row).is_break() {
                report.cancelled = true;
                break;
            }
        }

        if !operations.is_empty() {
            report.batch = Some(HistoryBatch::new(directory.to_path_buf(), operations));
        }

        report
    }
}
