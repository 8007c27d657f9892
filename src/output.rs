//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status
//! messages, the preview table, progress tracking and history listings.

use crate::executor::ExecutionReport;
use crate::history::{HistoryBatch, HistoryStore};
use crate::preview::{PreviewRow, PreviewSummary};
use crate::undo::UndoReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for rename batches
/// - Preview and history tables
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bulk_renamer::output::OutputFormatter;
    /// OutputFormatter::success("Renamed 12 files");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark, to stderr.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bulk_renamer::output::OutputFormatter;
    /// OutputFormatter::error("Directory not found: /photos");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bulk_renamer::output::OutputFormatter;
    /// OutputFormatter::warning("Renamed 10 files, 2 failed");
    /// ```
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bulk_renamer::output::OutputFormatter;
    /// OutputFormatter::info("Renaming files in: /home/user/photos");
    /// ```
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a bold section header preceded by a blank line.
    ///
    /// # Arguments
    ///
    /// * `header` - The header text
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for a rename batch of `total` rows.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of preview rows to process
    ///
    /// # Returns
    ///
    /// A configured `ProgressBar` ready for use.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bulk_renamer::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the preview as a two-column table followed by its counts.
    ///
    /// Conflicting rows are red with their reason, unchanged rows are dimmed.
    ///
    /// # Arguments
    ///
    /// * `rows` - The rows returned by a preview
    pub fn preview_table(rows: &[PreviewRow]) {
        Self::header("PREVIEW");

        if rows.is_empty() {
            Self::plain("No files match the current filters.");
            return;
        }

        let width = rows
            .iter()
            .map(|row| row.original_name.chars().count())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Original" width

        println!(
            "{}   {}",
            format!("{:<width$}", "Original", width = width).bold(),
            "New name".bold()
        );
        println!("{}", "-".repeat(width + 12));

        for row in rows {
            let new_name = match row.conflict {
                Some(reason) => format!("{} ({})", row.new_name, reason).red(),
                None if row.is_unchanged() => row.new_name.dimmed(),
                None => row.new_name.green(),
            };
            println!(
                "{:<width$} → {}",
                row.original_name,
                new_name,
                width = width
            );
        }

        let summary = PreviewSummary::from_rows(rows);
        println!("{}", "-".repeat(width + 12));
        println!(
            "{} files: {} to rename, {} unchanged, {} conflicts",
            summary.total,
            summary.changed.to_string().green(),
            summary.unchanged,
            if summary.conflicts > 0 {
                summary.conflicts.to_string().red()
            } else {
                summary.conflicts.to_string().normal()
            }
        );
    }

    /// Prints the outcome of an executed batch: the counts, then every
    /// failure line.
    ///
    /// # Arguments
    ///
    /// * `report` - The report returned by the executor
    pub fn execution_summary(report: &ExecutionReport) {
        Self::header("SUMMARY");
        if report.error_count == 0 {
            Self::success(&format!("Renamed {} files", report.success_count));
        } else {
            Self::warning(&format!(
                "Renamed {} files, {} failed",
                report.success_count, report.error_count
            ));
            for error in &report.errors {
                println!("   {} {}", "✗".red(), error);
            }
        }
        if report.cancelled {
            Self::warning("Batch was stopped before every file was processed");
        }
    }

    /// Prints the outcome of an undo: a success line when every file was
    /// restored, otherwise the counts followed by each skipped or failed file.
    ///
    /// # Arguments
    ///
    /// * `report` - The report returned by an undo
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bulk_renamer::output::OutputFormatter;
    /// use bulk_renamer::undo::UndoReport;
    ///
    /// let report = UndoReport {
    ///     restored: 3,
    ///     ..UndoReport::default()
    /// };
    /// OutputFormatter::undo_summary(&report);
    /// ```
    pub fn undo_summary(report: &UndoReport) {
        if report.is_complete_success() {
            Self::success(&format!("Restored {} files", report.restored));
            return;
        }

        Self::warning(&format!(
            "Restored {} of {} files",
            report.restored,
            report.total_processed()
        ));
        for path in &report.skipped {
            println!("   {} {} (no longer there)", "-".yellow(), path.display());
        }
        for (path, reason) in &report.failed {
            println!("   {} {}: {}", "✗".red(), path.display(), reason);
        }
    }

    /// Prints history entries newest first, numbered by their 1-based
    /// position in the log, followed by the totals.
    ///
    /// # Arguments
    ///
    /// * `history` - The history to list
    pub fn history_list(history: &HistoryStore) {
        Self::header("HISTORY");

        if history.is_empty() {
            Self::plain("No rename history.");
            return;
        }

        let batches: Vec<&HistoryBatch> = history.iter().collect();
        for (index, batch) in batches.iter().enumerate().rev() {
            println!(
                "{} {}  {}  {} files",
                format!("#{}", index + 1).cyan().bold(),
                batch.executed_at.format("%Y-%m-%d %H:%M:%S"),
                batch.directory.display(),
                batch.len()
            );
            for operation in &batch.operations {
                println!("     {} → {}", operation.old_name, operation.new_name);
            }
        }

        println!(
            "\n{} batches, {} files renamed",
            history.len(),
            history.total_files()
        );
    }

    /// Prints a dry-run notice message.
    ///
    /// # Arguments
    ///
    /// * `message` - The dry-run message
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
