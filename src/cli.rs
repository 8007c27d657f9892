//! Command-line interface module for bulk-renamer.
//!
//! This module handles all CLI-related functionality including:
//! - Command parsing
//! - Loading settings, presets and history from the state directory
//! - Preview, confirmation and execution of rename batches
//! - History listing, undo, deletion and export

use crate::config::{RenamerConfig, app_config_dir};
use crate::error::RenamerError;
use crate::history::{HISTORY_FILE_NAME, HistoryStore};
use crate::name_rule::parse_rules;
use crate::output::OutputFormatter;
use crate::session::RenameSession;
use crate::settings::{SETTINGS_FILE_NAME, Settings};
use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Rename many files at once with an ordered chain of rules.
#[derive(Debug, Parser)]
#[command(name = "bulk-renamer", version, about)]
pub struct Cli {
    /// Directory holding settings.json and history.json
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Rule preset (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Preview and rename the files of a directory
    Rename {
        /// Directory whose files are renamed
        dir: PathBuf,

        /// Extension (".jpg") or name pattern; repeat to combine with OR
        #[arg(short, long, value_name = "PATTERN")]
        filter: Vec<String>,

        /// Rule such as "prefix:new_", "replace:IMG=>photo", "sequence:1,3"
        /// or "case:lower"; applied in the order given
        #[arg(short, long, value_name = "RULE")]
        rule: Vec<String>,

        /// Only show the preview
        #[arg(long)]
        dry_run: bool,

        /// Execute without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Undo the latest batch, or the batch with the given history ID
    Undo {
        /// History ID as shown by `history`
        id: Option<usize>,

        /// Allow undoing a batch that is not the most recent one
        #[arg(long)]
        force: bool,
    },

    /// List recorded batches, newest first
    History,

    /// Forget a history entry without touching any file
    Delete {
        /// History ID as shown by `history`
        id: usize,
    },

    /// Forget the whole history without touching any file
    Clear,

    /// Write the full history to a JSON file
    Export {
        /// Destination file
        output: PathBuf,
    },
}

/// Runs the CLI application with parsed arguments.
///
/// # Examples
///
/// ```no_run
/// use bulk_renamer::cli::{Cli, run_cli};
/// use clap::Parser;
///
/// let cli = Cli::parse_from([
///     "bulk-renamer",
///     "rename",
///     "/photos",
///     "--rule",
///     "prefix:trip_",
///     "--dry-run",
/// ]);
/// if let Err(e) = run_cli(cli) {
///     eprintln!("Error: {:#}", e);
/// }
/// ```
pub fn run_cli(cli: Cli) -> Result<()> {
    let state_dir = resolve_state_dir(cli.state_dir.as_deref())?;
    let settings_path = state_dir.join(SETTINGS_FILE_NAME);
    let history = HistoryStore::open(state_dir.join(HISTORY_FILE_NAME));

    match cli.command {
        Command::Rename {
            dir,
            filter,
            rule,
            dry_run,
            yes,
        } => {
            let options = RenameOptions {
                filters: filter,
                rules: rule,
                dry_run,
                yes,
            };
            rename_directory(&dir, cli.config.as_deref(), &settings_path, history, options)
        }
        Command::Undo { id, force } => undo_batch(history, id, force),
        Command::History => {
            OutputFormatter::history_list(&history);
            Ok(())
        }
        Command::Delete { id } => delete_entry(history, id),
        Command::Clear => {
            let mut history = history;
            let count = history.len();
            history.clear();
            OutputFormatter::success(&format!("Cleared {} history entries", count));
            Ok(())
        }
        Command::Export { output } => {
            history
                .export(&output)
                .with_context(|| format!("Error exporting history to {}", output.display()))?;
            OutputFormatter::success(&format!(
                "Exported {} history entries to {}",
                history.len(),
                output.display()
            ));
            Ok(())
        }
    }
}

/// Options of the `rename` command given on the command line.
#[derive(Debug, Default)]
struct RenameOptions {
    filters: Vec<String>,
    rules: Vec<String>,
    dry_run: bool,
    yes: bool,
}

fn resolve_state_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir.to_path_buf()),
        None => app_config_dir()
            .ok_or_else(|| anyhow!("Could not determine a config directory; pass --state-dir")),
    }
}

/// Previews the rename of `dir` and executes it when allowed.
///
/// Filters and rules from the preset come first, those from the command
/// line are appended after them.
fn rename_directory(
    dir: &Path,
    config_path: Option<&Path>,
    settings_path: &Path,
    history: HistoryStore,
    options: RenameOptions,
) -> Result<()> {
    let mut settings = Settings::load(settings_path);

    let mut config = RenamerConfig::load(config_path).context("Error loading configuration")?;
    config.filters.patterns.extend(options.filters);
    config
        .rules
        .extend(parse_rules(&options.rules)?.iter().cloned());

    let filters = config
        .filter_set(settings.show_hidden_files)
        .context("Error compiling filters")?;

    let mut session = RenameSession::open(dir, history)?;
    session.set_filters(filters);
    session.set_rules(config.rule_chain());

    OutputFormatter::info(&format!("Renaming files in: {}", dir.display()));
    for (position, rule) in session.rules().iter().enumerate() {
        OutputFormatter::plain(&format!(
            "  {}. [{}] {}",
            position + 1,
            rule.kind(),
            rule.description()
        ));
    }
    if !session.filters().is_empty() {
        OutputFormatter::plain(&format!(
            "  Filters: {}",
            session.filters().patterns().join(", ")
        ));
    }

    let rows = session.preview()?;
    OutputFormatter::preview_table(&rows);

    if rows.iter().all(|row| row.is_unchanged()) {
        OutputFormatter::info("Nothing to rename.");
        return Ok(());
    }

    if options.dry_run {
        OutputFormatter::dry_run_notice("No files were renamed.");
        return Ok(());
    }

    if settings.confirm_operations && !options.yes {
        OutputFormatter::warning(
            "Confirmation required: re-run with --yes to apply these renames.",
        );
        return Ok(());
    }

    let pb = OutputFormatter::create_progress_bar(rows.len() as u64);
    let report = session.execute_with_progress(&rows, |row| {
        pb.set_message(row.original_name.clone());
        pb.inc(1);
        ControlFlow::Continue(())
    })?;
    pb.finish_and_clear();

    OutputFormatter::execution_summary(&report);
    if report.batch.is_some() {
        if let Some(file) = session.history().file() {
            OutputFormatter::plain(&format!("History saved to {}", file.display()));
        }
        OutputFormatter::plain("Use 'bulk-renamer undo' to revert changes.");
    }

    if settings.auto_save {
        settings.last_directory = dir.display().to_string();
        if let Err(e) = settings.save(settings_path) {
            warn!("Could not save settings: {}", e);
        }
    }

    Ok(())
}

/// Converts a 1-based history ID into an index into the log.
fn history_index(id: usize) -> Result<usize> {
    id.checked_sub(1)
        .ok_or_else(|| anyhow!("History IDs start at 1"))
}

fn undo_batch(mut history: HistoryStore, id: Option<usize>, force: bool) -> Result<()> {
    let result = match id {
        None => history.undo_last(),
        Some(id) => history.undo_at(history_index(id)?, force),
    };

    let report = match result {
        Ok(report) => report,
        Err(e @ RenamerError::OutOfOrderUndo { .. }) => {
            return Err(anyhow!(e).context("Use --force to undo an older batch"));
        }
        Err(e) => return Err(e).context("Undo failed"),
    };

    OutputFormatter::undo_summary(&report);
    if !report.failed.is_empty() {
        bail!("{} files could not be restored", report.failed.len());
    }
    Ok(())
}

fn delete_entry(mut history: HistoryStore, id: usize) -> Result<()> {
    let batch = history.delete_at(history_index(id)?)?;
    OutputFormatter::success(&format!(
        "Deleted history entry #{} ({} files); no files were touched",
        id,
        batch.len()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rename_command() {
        let cli = Cli::parse_from([
            "bulk-renamer",
            "--state-dir",
            "/tmp/state",
            "rename",
            "/photos",
            "--filter",
            ".jpg",
            "-r",
            "prefix:trip_",
            "-r",
            "sequence:1,3",
            "--yes",
        ]);

        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/state")));
        match cli.command {
            Command::Rename {
                dir,
                filter,
                rule,
                dry_run,
                yes,
            } => {
                assert_eq!(dir, PathBuf::from("/photos"));
                assert_eq!(filter, vec![".jpg"]);
                assert_eq!(rule, vec!["prefix:trip_", "sequence:1,3"]);
                assert!(!dry_run);
                assert!(yes);
            }
            other => panic!("Expected Rename, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_undo_with_id() {
        let cli = Cli::parse_from(["bulk-renamer", "undo", "3", "--force", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Undo {
                id: Some(3),
                force: true
            }
        ));
    }

    #[test]
    fn test_history_ids_are_one_based() {
        assert_eq!(history_index(1).unwrap(), 0);
        assert!(history_index(0).is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
