//! Rule preset configuration.
//!
//! A preset file stores the filters and the rule chain of a recurring rename
//! job, so it does not have to be spelled out on the command line each time.
//!
//! # Configuration File Format
//!
//! ```toml
//! [filters]
//! patterns = [".jpg", ".jpeg", "IMG_"]
//! include_hidden = false
//!
//! [[rules]]
//! type = "replace"
//! find = "IMG_"
//! replace_with = ""
//!
//! [[rules]]
//! type = "sequence"
//! start = 1
//! digits = 4
//!
//! [[rules]]
//! type = "case"
//! mode = "lower"
//! ```

use crate::error::{RenamerError, RenamerResult};
use crate::filter::FilterSet;
use crate::name_rule::{NameRule, RuleChain};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the application directory under the user's config directory.
pub const APP_DIR_NAME: &str = "bulk-renamer";

/// Preset file looked up in the working directory.
pub const LOCAL_CONFIG_NAME: &str = ".bulk-renamer.toml";

/// Returns `<config_dir>/bulk-renamer`, where settings, history and the
/// user-wide preset live.
pub fn app_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
}

/// A rename preset loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamerConfig {
    #[serde(default)]
    pub filters: FilterConfig,

    #[serde(default)]
    pub rules: Vec<NameRule>,
}

/// The `[filters]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Extensions (`.txt`) or name patterns, combined with OR.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Whether dot-files take part. When unset, the user setting decides.
    #[serde(default)]
    pub include_hidden: Option<bool>,
}

impl RenamerConfig {
    /// Load a preset, with fallback to an empty one.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.bulk-renamer.toml` in the current directory
    /// 3. Look for `config.toml` in the application config directory
    /// 4. Fall back to an empty preset
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any file found is not a valid preset.
    pub fn load(config_path: Option<&Path>) -> RenamerResult<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(dir) = app_config_dir() {
            let user_config = dir.join("config.toml");
            if user_config.exists() {
                return Self::load_from_file(&user_config);
            }
        }

        Ok(Self::default())
    }

    /// Load a preset from a specific file.
    pub fn load_from_file(path: &Path) -> RenamerResult<Self> {
        if !path.exists() {
            return Err(RenamerError::Config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| RenamerError::Persistence {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content)
            .map_err(|e| RenamerError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Compiles the `[filters]` table. `show_hidden_files` is the user
    /// setting, used when the preset does not decide.
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern is invalid.
    pub fn filter_set(&self, show_hidden_files: bool) -> RenamerResult<FilterSet> {
        let include_hidden = self.filters.include_hidden.unwrap_or(show_hidden_files);
        Ok(FilterSet::new(&self.filters.patterns)?.with_hidden(include_hidden))
    }

    pub fn rule_chain(&self) -> RuleChain {
        self.rules.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name_rule::CaseMode;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_empty() {
        let config = RenamerConfig::default();
        assert!(config.rules.is_empty());
        assert!(config.filters.patterns.is_empty());
        assert!(config.rule_chain().is_empty());
    }

    #[test]
    fn test_load_full_preset() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("preset.toml");
        fs::write(
            &path,
            r#"
            [filters]
            patterns = [".jpg", "IMG_"]
            include_hidden = true

            [[rules]]
            type = "replace"
            find = "IMG_"
            replace_with = ""

            [[rules]]
            type = "sequence"
            start = 1
            digits = 4

            [[rules]]
            type = "case"
            mode = "upper"
            "#,
        )
        .expect("Failed to write config");

        let config = RenamerConfig::load(Some(&path)).expect("Load failed");
        assert_eq!(config.filters.patterns, vec![".jpg", "IMG_"]);
        assert_eq!(config.filters.include_hidden, Some(true));
        assert_eq!(config.rules.len(), 3);
        assert_eq!(
            config.rules[2],
            NameRule::CaseTransform {
                mode: CaseMode::Upper
            }
        );
        assert_eq!(config.rule_chain().apply("IMG_5.jpg", 0), "0001.jpg");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = RenamerConfig::load(Some(Path::new("/non/existent/preset.toml")));
        assert!(matches!(result, Err(RenamerError::Config(_))));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("bad.toml");
        fs::write(&path, "[[rules]]\ntype = \"explode\"\n").expect("Failed to write config");

        assert!(RenamerConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_filter_set_uses_setting_when_preset_is_silent() {
        let config = RenamerConfig {
            filters: FilterConfig {
                patterns: vec![".txt".to_string()],
                include_hidden: None,
            },
            rules: Vec::new(),
        };
        assert!(config.filter_set(false).is_ok());

        let config = RenamerConfig {
            filters: FilterConfig {
                patterns: vec!["[bad".to_string()],
                include_hidden: Some(false),
            },
            rules: Vec::new(),
        };
        assert!(config.filter_set(true).is_err());
    }
}
