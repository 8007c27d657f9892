/// Error types shared by the renaming engine.
///
/// Preview-level problems (invalid names, collisions) are never errors: they
/// are recorded as a [`ConflictReason`](crate::preview::ConflictReason) on the
/// affected row. Everything that can abort an operation lives here.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenamerError {
    /// The source directory is missing or is not a directory.
    #[error("Directory not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("No source directory selected")]
    NoDirectory,

    /// A single filesystem rename failed.
    #[error("Failed to rename {} to {}: {source}", from.display(), to.display())]
    RenameIo {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The precondition check of an indexed undo failed. Nothing was touched.
    #[error("Cannot undo batch:\n{}", failures.join("\n"))]
    UndoConflict { failures: Vec<String> },

    #[error("No previous rename batch to undo")]
    NothingToUndo,

    #[error("History index {index} is out of range (history has {len} entries)")]
    HistoryIndexOutOfRange { index: usize, len: usize },

    /// Undoing a batch other than the latest must be explicitly allowed.
    #[error(
        "Batch {index} is not the most recent one (latest is {latest}); undoing it out of order must be confirmed"
    )]
    OutOfOrderUndo { index: usize, latest: usize },

    #[error("Failed to access {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid data in {}: {reason}", path.display())]
    PersistenceFormat { path: PathBuf, reason: String },

    #[error("Invalid filter pattern '{pattern}': {reason}")]
    InvalidFilterPattern { pattern: String, reason: String },

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for renaming operations.
pub type RenamerResult<T> = Result<T, RenamerError>;
