/// A renaming session: one source directory, its filters, a rule chain and
/// the history log.
///
/// Every engine operation goes through a session value, so independent
/// sessions can coexist and tests can build one per case. A session assumes
/// it is the only writer of its directory.
use crate::error::{RenamerError, RenamerResult};
use crate::executor::{ExecutionReport, RenameExecutor};
use crate::filter::FilterSet;
use crate::history::{HistoryBatch, HistoryStore};
use crate::name_rule::{NameRule, RuleChain};
use crate::preview::{PreviewEngine, PreviewRow};
use crate::scanner::{FileEntry, scan_directory};
use crate::undo::UndoReport;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug)]
pub struct RenameSession {
    directory: Option<PathBuf>,
    files: Vec<FileEntry>,
    filters: FilterSet,
    rules: RuleChain,
    history: HistoryStore,
}

impl RenameSession {
    /// Creates a session without a directory, around an existing history.
    pub fn new(history: HistoryStore) -> Self {
        Self {
            directory: None,
            files: Vec::new(),
            filters: FilterSet::match_all(),
            rules: RuleChain::new(),
            history,
        }
    }

    /// Creates a session on `directory` and scans it.
    ///
    /// # Errors
    ///
    /// Returns [`RenamerError::NotFound`] if `directory` is not a directory.
    pub fn open(directory: &Path, history: HistoryStore) -> RenamerResult<Self> {
        let mut session = Self::new(history);
        session.set_directory(directory)?;
        Ok(session)
    }

    /// Switches to `directory` and scans it. On failure the session keeps
    /// its previous directory.
    pub fn set_directory(&mut self, directory: &Path) -> RenamerResult<()> {
        let files = scan_directory(directory)?;
        self.directory = Some(directory.to_path_buf());
        self.files = files;
        Ok(())
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Rescans the current directory, replacing the file list.
    pub fn refresh(&mut self) -> RenamerResult<()> {
        if let Some(directory) = &self.directory {
            self.files = scan_directory(directory)?;
        }
        Ok(())
    }

    /// Rescans after a mutation. A failing rescan leaves the stale listing
    /// in place; the mutation itself already happened.
    fn refresh_after_change(&mut self) {
        if let Err(e) = self.refresh() {
            warn!("Could not rescan directory: {}", e);
        }
    }

    /// Every regular file of the directory, as of the last scan.
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn set_filters(&mut self, filters: FilterSet) {
        self.filters = filters;
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// The files the filters select, in scan order.
    pub fn filtered_files(&self) -> Vec<FileEntry> {
        self.filters.apply(&self.files)
    }

    pub fn rules(&self) -> &RuleChain {
        &self.rules
    }

    /// Mutable access for adding, removing and reordering rules.
    pub fn rules_mut(&mut self) -> &mut RuleChain {
        &mut self.rules
    }

    pub fn add_rule(&mut self, rule: NameRule) {
        self.rules.push(rule);
    }

    pub fn set_rules(&mut self, rules: RuleChain) {
        self.rules = rules;
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    fn require_directory(&self) -> RenamerResult<&Path> {
        self.directory.as_deref().ok_or(RenamerError::NoDirectory)
    }

    /// Previews the rule chain over the filtered files. Touches nothing.
    pub fn preview(&self) -> RenamerResult<Vec<PreviewRow>> {
        let directory = self.require_directory()?;
        Ok(PreviewEngine::preview(
            directory,
            &self.filtered_files(),
            &self.rules,
        ))
    }

    /// Executes previewed rows, records the batch and rescans.
    pub fn execute(&mut self, rows: &[PreviewRow]) -> RenamerResult<ExecutionReport> {
        self.execute_with_progress(rows, |_| ControlFlow::Continue(()))
    }

    /// Like [`RenameSession::execute`], reporting each processed row.
    pub fn execute_with_progress<F>(
        &mut self,
        rows: &[PreviewRow],
        on_row: F,
    ) -> RenamerResult<ExecutionReport>
    where
        F: FnMut(&PreviewRow) -> ControlFlow<()>,
    {
        let directory = self.require_directory()?.to_path_buf();
        let report = RenameExecutor::execute_with_progress(&directory, rows, on_row);
        info!(
            "Renamed {} files in {} ({} errors)",
            report.success_count,
            directory.display(),
            report.error_count
        );

        if let Some(batch) = &report.batch {
            self.history.push(batch.clone());
        }
        self.refresh_after_change();

        Ok(report)
    }

    /// Reverts the most recent batch and rescans.
    pub fn undo_last(&mut self) -> RenamerResult<UndoReport> {
        let report = self.history.undo_last()?;
        self.refresh_after_change();
        Ok(report)
    }

    /// Reverts the batch at `index`; see [`HistoryStore::undo_at`].
    pub fn undo_at(
        &mut self,
        index: usize,
        allow_out_of_order: bool,
    ) -> RenamerResult<UndoReport> {
        let report = self.history.undo_at(index, allow_out_of_order)?;
        self.refresh_after_change();
        Ok(report)
    }

    /// Forgets a batch without touching files.
    pub fn delete_history_at(&mut self, index: usize) -> RenamerResult<HistoryBatch> {
        self.history.delete_at(index)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Writes the full in-memory history to `path`.
    pub fn export_history(&self, path: &Path) -> RenamerResult<()> {
        self.history.export(path)
    }
}
