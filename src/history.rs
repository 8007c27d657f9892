/// Rename history: executed batches, undo and persistence.
///
/// The in-memory log is unbounded for the lifetime of a store. Only the most
/// recent [`MAX_HISTORY_ENTRIES`] batches are written to disk.
///
/// # History file format
///
/// ```json
/// [
///   {
///     "timestamp": "2025-11-09T14:30:52.118+01:00",
///     "directory": "/home/user/photos",
///     "operations": [
///       {
///         "old_name": "IMG_0001.jpg",
///         "new_name": "001.jpg",
///         "old_path": "/home/user/photos/IMG_0001.jpg",
///         "new_path": "/home/user/photos/001.jpg",
///         "timestamp": "2025-11-09T14:30:52.117+01:00"
///       }
///     ]
///   }
/// ]
/// ```
use crate::error::{RenamerError, RenamerResult};
use crate::undo::{UndoManager, UndoReport};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Number of batches kept in the history file.
pub const MAX_HISTORY_ENTRIES: usize = 50;

/// Default file name of the history document.
pub const HISTORY_FILE_NAME: &str = "history.json";

/// One rename that actually happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub old_name: String,
    pub new_name: String,
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    #[serde(rename = "timestamp", with = "iso_timestamp")]
    pub executed_at: DateTime<Local>,
}

/// All renames performed by one execution, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryBatch {
    #[serde(rename = "timestamp", with = "iso_timestamp")]
    pub executed_at: DateTime<Local>,
    pub directory: PathBuf,
    pub operations: Vec<Operation>,
}

impl HistoryBatch {
    pub fn new(directory: PathBuf, operations: Vec<Operation>) -> Self {
        Self {
            executed_at: Local::now(),
            directory,
            operations,
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// ISO-8601 timestamps.
///
/// Written as RFC 3339 with offset. Offset-less timestamps are accepted on
/// read and taken as local time.
mod iso_timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Local>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Local>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Local>> {
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
            return Some(with_offset.with_timezone(&Local));
        }
        let naive = raw.parse::<NaiveDateTime>().ok()?;
        Local.from_local_datetime(&naive).earliest()
    }
}

/// Serializes batches into the history document.
pub fn encode_history(batches: &[HistoryBatch]) -> RenamerResult<String> {
    serde_json::to_string_pretty(batches).map_err(|e| RenamerError::PersistenceFormat {
        path: PathBuf::from(HISTORY_FILE_NAME),
        reason: e.to_string(),
    })
}

/// Parses a history document.
pub fn decode_history(text: &str) -> RenamerResult<Vec<HistoryBatch>> {
    serde_json::from_str(text).map_err(|e| RenamerError::PersistenceFormat {
        path: PathBuf::from(HISTORY_FILE_NAME),
        reason: e.to_string(),
    })
}

/// Standalone snapshot of the whole in-memory history.
#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    #[serde(with = "iso_timestamp")]
    export_time: DateTime<Local>,
    /// Number of batches in the export.
    total_operations: usize,
    history: &'a [HistoryBatch],
}

/// Ordered log of executed batches. The last batch is the most recent.
#[derive(Debug, Default)]
pub struct HistoryStore {
    batches: Vec<HistoryBatch>,
    file: Option<PathBuf>,
}

impl HistoryStore {
    /// A store that never touches the disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the history file at `file`.
    ///
    /// A missing file gives an empty history. An unreadable or corrupt file
    /// is logged and also gives an empty history: losing history never
    /// blocks renaming.
    pub fn open(file: PathBuf) -> Self {
        let batches = match Self::load(&file) {
            Ok(batches) => batches,
            Err(e) => {
                warn!("Starting with empty history: {}", e);
                Vec::new()
            }
        };
        debug!("Loaded {} history entries from {}", batches.len(), file.display());
        Self {
            batches,
            file: Some(file),
        }
    }

    /// Reads a history file. A missing file is an empty history.
    pub fn load(file: &Path) -> RenamerResult<Vec<HistoryBatch>> {
        if !file.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(file).map_err(|e| RenamerError::Persistence {
            path: file.to_path_buf(),
            source: e,
        })?;
        decode_history(&text).map_err(|e| match e {
            RenamerError::PersistenceFormat { reason, .. } => RenamerError::PersistenceFormat {
                path: file.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Writes the most recent [`MAX_HISTORY_ENTRIES`] batches to the history
    /// file, overwriting it. Does nothing for an in-memory store.
    pub fn save(&self) -> RenamerResult<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };

        let tail_start = self.batches.len().saturating_sub(MAX_HISTORY_ENTRIES);
        let json = encode_history(&self.batches[tail_start..])?;

        if let Some(parent) = file.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| RenamerError::Persistence {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(file, json).map_err(|e| RenamerError::Persistence {
            path: file.clone(),
            source: e,
        })
    }

    /// Saves, downgrading failure to a warning.
    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!("Could not save history: {}", e);
        }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Appends a batch and persists the log.
    pub fn push(&mut self, batch: HistoryBatch) {
        info!(
            "Recorded batch of {} renames in {}",
            batch.len(),
            batch.directory.display()
        );
        self.batches.push(batch);
        self.persist();
    }

    pub fn get(&self, index: usize) -> Option<&HistoryBatch> {
        self.batches.get(index)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryBatch> {
        self.batches.iter()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Index of the most recent batch.
    pub fn latest_index(&self) -> Option<usize> {
        self.batches.len().checked_sub(1)
    }

    /// Number of file renames across all batches.
    pub fn total_files(&self) -> usize {
        self.batches.iter().map(HistoryBatch::len).sum()
    }

    /// Reverts the most recent batch.
    ///
    /// Operations are reversed in reverse execution order. Files that are no
    /// longer at their new path are skipped. The batch leaves the log unless
    /// a rename failed, in which case it stays so the undo can be retried.
    ///
    /// # Errors
    ///
    /// Returns [`RenamerError::NothingToUndo`] when the log is empty.
    pub fn undo_last(&mut self) -> RenamerResult<UndoReport> {
        let Some(batch) = self.batches.last() else {
            return Err(RenamerError::NothingToUndo);
        };

        let report = UndoManager::revert(batch);
        if report.failed.is_empty() {
            self.batches.pop();
            self.persist();
        } else {
            warn!(
                "Undo left {} files unrestored; keeping the batch in history",
                report.failed.len()
            );
        }
        Ok(report)
    }

    /// Reverts the batch at `index` (0-based, oldest first).
    ///
    /// Before anything is renamed, every operation is checked: its new path
    /// must exist and its old path must be free. Reverting a batch other
    /// than the latest can leave later batches pointing at files that moved;
    /// callers opt in with `allow_out_of_order` and own the consequences.
    ///
    /// # Errors
    ///
    /// - [`RenamerError::HistoryIndexOutOfRange`] for a bad index
    /// - [`RenamerError::OutOfOrderUndo`] for an older batch without opt-in
    /// - [`RenamerError::UndoConflict`] when the check fails; nothing is renamed
    pub fn undo_at(
        &mut self,
        index: usize,
        allow_out_of_order: bool,
    ) -> RenamerResult<UndoReport> {
        let len = self.batches.len();
        let batch = self
            .batches
            .get(index)
            .ok_or(RenamerError::HistoryIndexOutOfRange { index, len })?;

        let latest = len - 1;
        if index != latest && !allow_out_of_order {
            return Err(RenamerError::OutOfOrderUndo { index, latest });
        }

        UndoManager::check(batch)?;

        let report = UndoManager::revert(batch);
        if report.failed.is_empty() {
            self.batches.remove(index);
            self.persist();
        } else {
            warn!(
                "Undo left {} files unrestored; keeping the batch in history",
                report.failed.len()
            );
        }
        Ok(report)
    }

    /// Removes a batch from the log without touching any file.
    pub fn delete_at(&mut self, index: usize) -> RenamerResult<HistoryBatch> {
        if index >= self.batches.len() {
            return Err(RenamerError::HistoryIndexOutOfRange {
                index,
                len: self.batches.len(),
            });
        }
        let batch = self.batches.remove(index);
        self.persist();
        Ok(batch)
    }

    /// Removes every batch from the log without touching any file.
    pub fn clear(&mut self) {
        self.batches.clear();
        self.persist();
    }

    /// Writes the full in-memory history, uncapped, as a standalone export
    /// document.
    pub fn export(&self, path: &Path) -> RenamerResult<()> {
        let document = ExportDocument {
            export_time: Local::now(),
            total_operations: self.batches.len(),
            history: &self.batches,
        };
        let json = serde_json::to_string_pretty(&document).map_err(|e| {
            RenamerError::PersistenceFormat {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        fs::write(path, json).map_err(|e| RenamerError::Persistence {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    fn operation(dir: &Path, old: &str, new: &str) -> Operation {
        Operation {
            old_name: old.to_string(),
            new_name: new.to_string(),
            old_path: dir.join(old),
            new_path: dir.join(new),
            executed_at: Local::now(),
        }
    }

    fn batch(dir: &Path, pairs: &[(&str, &str)]) -> HistoryBatch {
        HistoryBatch::new(
            dir.to_path_buf(),
            pairs
                .iter()
                .map(|(old, new)| operation(dir, old, new))
                .collect(),
        )
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let dir = Path::new("/data/photos");
        let batches = vec![
            batch(dir, &[("a.jpg", "001.jpg"), ("b.jpg", "002.jpg")]),
            batch(dir, &[("001.jpg", "x_001.jpg")]),
        ];

        let text = encode_history(&batches).expect("Encoding failed");
        let decoded = decode_history(&text).expect("Decoding failed");
        assert_eq!(decoded, batches);
    }

    #[test]
    fn test_document_field_names() {
        let dir = Path::new("/data");
        let text = encode_history(&[batch(dir, &[("a", "b")])]).expect("Encoding failed");
        let json: Value = serde_json::from_str(&text).expect("Invalid JSON");

        let entry = &json[0];
        assert!(entry["timestamp"].is_string());
        assert_eq!(entry["directory"], "/data");
        let op = &entry["operations"][0];
        assert_eq!(op["old_name"], "a");
        assert_eq!(op["new_name"], "b");
        assert_eq!(op["old_path"], "/data/a");
        assert_eq!(op["new_path"], "/data/b");
        assert!(op["timestamp"].is_string());
    }

    #[test]
    fn test_decode_accepts_offsetless_timestamps() {
        let text = r#"[{
            "timestamp": "2024-03-01T10:15:30.123456",
            "directory": "/data",
            "operations": [{
                "old_name": "a.txt",
                "new_name": "b.txt",
                "old_path": "/data/a.txt",
                "new_path": "/data/b.txt",
                "timestamp": "2024-03-01T10:15:30"
            }]
        }]"#;

        let batches = decode_history(text).expect("Decoding failed");
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].executed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2024-03-01 10:15:30"
        );
        assert_eq!(batches[0].operations[0].new_name, "b.txt");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_history("{not json"),
            Err(RenamerError::PersistenceFormat { .. })
        ));
        let bad_timestamp = r#"[{"timestamp": "yesterday", "directory": "/", "operations": []}]"#;
        assert!(decode_history(bad_timestamp).is_err());
    }

    #[test]
    fn test_save_caps_persisted_entries() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join(HISTORY_FILE_NAME);
        let mut store = HistoryStore::open(file.clone());
        assert_eq!(store.file(), Some(file.as_path()));
        assert!(HistoryStore::in_memory().file().is_none());

        for i in 0..(MAX_HISTORY_ENTRIES + 5) {
            let name = format!("{}.txt", i);
            store.push(batch(temp_dir.path(), &[("a.txt", name.as_str())]));
        }

        // Memory keeps everything, the file only the tail
        assert_eq!(store.len(), MAX_HISTORY_ENTRIES + 5);
        let persisted = HistoryStore::load(&file).expect("Load failed");
        assert_eq!(persisted.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(persisted[0].operations[0].new_name, "5.txt");
        assert_eq!(
            persisted.last().unwrap().operations[0].new_name,
            format!("{}.txt", MAX_HISTORY_ENTRIES + 4)
        );
    }

    #[test]
    fn test_open_missing_and_corrupt_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = HistoryStore::open(temp_dir.path().join("missing.json"));
        assert!(store.is_empty());

        let corrupt = temp_dir.path().join("corrupt.json");
        fs::write(&corrupt, "not json").expect("Failed to write file");
        let store = HistoryStore::open(corrupt.clone());
        assert!(store.is_empty());
        assert!(HistoryStore::load(&corrupt).is_err());
    }

    #[test]
    fn test_delete_at_keeps_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("b.txt"), "x").expect("Failed to write file");

        let mut store = HistoryStore::in_memory();
        store.push(batch(dir, &[("a.txt", "b.txt")]));
        store.push(batch(dir, &[("c.txt", "d.txt")]));

        let removed = store.delete_at(0).expect("Delete failed");
        assert_eq!(removed.operations[0].new_name, "b.txt");
        assert_eq!(store.len(), 1);
        assert!(dir.join("b.txt").exists());
        assert!(!dir.join("a.txt").exists());

        assert!(matches!(
            store.delete_at(3),
            Err(RenamerError::HistoryIndexOutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_undo_last_on_empty_history() {
        let mut store = HistoryStore::in_memory();
        assert!(matches!(store.undo_last(), Err(RenamerError::NothingToUndo)));
    }

    #[test]
    fn test_undo_last_restores_in_reverse_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        // a -> b then b -> c, recorded in that order; only c exists now
        fs::write(dir.join("c.txt"), "content").expect("Failed to write file");

        let mut store = HistoryStore::in_memory();
        store.push(batch(dir, &[("a.txt", "b.txt"), ("b.txt", "c.txt")]));

        let report = store.undo_last().expect("Undo failed");
        assert_eq!(report.restored, 2);
        assert!(report.is_complete_success());
        assert!(dir.join("a.txt").exists());
        assert!(!dir.join("b.txt").exists());
        assert!(!dir.join("c.txt").exists());
        assert!(store.is_empty());
    }

    #[test]
    fn test_undo_last_skips_missing_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("new1.txt"), "1").expect("Failed to write file");

        let mut store = HistoryStore::in_memory();
        store.push(batch(
            dir,
            &[("old1.txt", "new1.txt"), ("old2.txt", "new2.txt")],
        ));

        let report = store.undo_last().expect("Undo failed");
        assert_eq!(report.restored, 1);
        assert_eq!(report.skipped, vec![dir.join("new2.txt")]);
        assert!(dir.join("old1.txt").exists());
        // Skips are best-effort, the batch is still consumed
        assert!(store.is_empty());
    }

    #[test]
    fn test_undo_last_keeps_batch_when_original_name_taken() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("new.txt"), "moved").expect("Failed to write file");
        fs::write(dir.join("old.txt"), "someone else").expect("Failed to write file");

        let mut store = HistoryStore::in_memory();
        store.push(batch(dir, &[("old.txt", "new.txt")]));

        let report = store.undo_last().expect("Undo failed");
        assert_eq!(report.restored, 0);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(
            fs::read_to_string(dir.join("old.txt")).expect("Failed to read file"),
            "someone else"
        );
    }

    #[test]
    fn test_undo_at_requires_opt_in_for_older_batches() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("b.txt"), "b").expect("Failed to write file");
        fs::write(dir.join("d.txt"), "d").expect("Failed to write file");

        let mut store = HistoryStore::in_memory();
        store.push(batch(dir, &[("a.txt", "b.txt")]));
        store.push(batch(dir, &[("c.txt", "d.txt")]));

        assert!(matches!(
            store.undo_at(0, false),
            Err(RenamerError::OutOfOrderUndo {
                index: 0,
                latest: 1
            })
        ));
        assert!(matches!(
            store.undo_at(2, true),
            Err(RenamerError::HistoryIndexOutOfRange { .. })
        ));

        let report = store.undo_at(0, true).expect("Undo failed");
        assert_eq!(report.restored, 1);
        assert!(dir.join("a.txt").exists());
        assert!(dir.join("d.txt").exists());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().operations[0].old_name, "c.txt");
    }

    #[test]
    fn test_undo_at_refuses_when_precondition_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        // First batch: a -> x_a, b -> x_b. A later batch moved x_a on again.
        fs::write(dir.join("x_b.txt"), "b").expect("Failed to write file");
        fs::write(dir.join("y_x_a.txt"), "a").expect("Failed to write file");

        let mut store = HistoryStore::in_memory();
        store.push(batch(
            dir,
            &[("a.txt", "x_a.txt"), ("b.txt", "x_b.txt")],
        ));
        store.push(batch(dir, &[("x_a.txt", "y_x_a.txt")]));

        let result = store.undo_at(0, true);
        match result {
            Err(RenamerError::UndoConflict { failures }) => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].contains("x_a.txt"));
            }
            other => panic!("Expected UndoConflict, got {:?}", other),
        }

        // Nothing moved, nothing forgotten
        assert!(dir.join("x_b.txt").exists());
        assert!(!dir.join("b.txt").exists());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_export_contains_full_history() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        let mut store = HistoryStore::in_memory();
        store.push(batch(dir, &[("a", "b"), ("c", "d")]));
        store.push(batch(dir, &[("e", "f")]));

        let out = temp_dir.path().join("export.json");
        store.export(&out).expect("Export failed");

        let json: Value =
            serde_json::from_str(&fs::read_to_string(&out).expect("Failed to read export"))
                .expect("Invalid JSON");
        assert!(json["export_time"].is_string());
        assert_eq!(json["total_operations"], 2);
        assert_eq!(json["history"].as_array().unwrap().len(), 2);
        assert_eq!(json["history"][1]["operations"][0]["new_name"], "f");
    }

    #[test]
    fn test_totals() {
        let dir = Path::new("/data");
        let mut store = HistoryStore::in_memory();
        assert_eq!(store.latest_index(), None);
        store.push(batch(dir, &[("a", "b"), ("c", "d")]));
        store.push(batch(dir, &[("e", "f")]));
        assert_eq!(store.total_files(), 3);
        assert_eq!(store.latest_index(), Some(1));
    }
}
