/// User settings document.
///
/// Settings are a small JSON object. The renaming engine only reads
/// `last_directory`, `confirm_operations`, `show_hidden_files` and
/// `auto_save`; everything else is stored and returned untouched, including
/// fields this version does not know about.
use crate::error::{RenamerError, RenamerResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Default file name of the settings document.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub last_directory: String,
    /// Opaque to the engine.
    pub window_geometry: String,
    /// Opaque to the engine.
    pub recent_rules: Vec<Value>,
    pub auto_save: bool,
    /// Ask before executing a batch.
    pub confirm_operations: bool,
    pub show_hidden_files: bool,
    pub theme: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_directory: String::new(),
            window_geometry: "1000x700".to_string(),
            recent_rules: Vec::new(),
            auto_save: true,
            confirm_operations: true,
            show_hidden_files: false,
            theme: "default".to_string(),
            extra: Map::new(),
        }
    }
}

impl Settings {
    /// Loads settings from `path`.
    ///
    /// Falls back to defaults when the file is missing or cannot be parsed;
    /// the latter is logged.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str(&text).map_err(|e| e.to_string()));

        match parsed {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Using default settings, could not read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Writes settings to `path` as pretty UTF-8 JSON, overwriting it.
    pub fn save(&self, path: &Path) -> RenamerResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            RenamerError::PersistenceFormat {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| RenamerError::Persistence {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(path, json).map_err(|e| RenamerError::Persistence {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
