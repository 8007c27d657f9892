//! bulk-renamer - batch file renaming with preview and undo
//!
//! This library scans a directory, selects files with extension or name
//! filters, computes new names from an ordered chain of rules, previews the
//! result with conflict detection, executes the renames and records each
//! batch in a persistent history that can be undone.

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod filter;
pub mod history;
pub mod name_rule;
pub mod output;
pub mod preview;
pub mod scanner;
pub mod session;
pub mod settings;
pub mod undo;

pub use config::RenamerConfig;
pub use error::{RenamerError, RenamerResult};
pub use executor::{ExecutionReport, RenameExecutor};
pub use filter::FilterSet;
pub use history::{HistoryBatch, HistoryStore, MAX_HISTORY_ENTRIES, Operation};
pub use name_rule::{CaseMode, NameRule, RuleChain};
pub use preview::{ConflictReason, PreviewEngine, PreviewRow};
pub use scanner::{FileEntry, scan_directory};
pub use session::RenameSession;
pub use settings::Settings;
pub use undo::{UndoManager, UndoReport};

pub use cli::{Cli, Command, run_cli};
