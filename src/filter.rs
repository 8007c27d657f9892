//! File selection for a rename batch.
//!
//! A filter set is a list of patterns combined with logical OR:
//! - Patterns starting with `.` are extensions, matched by exact
//!   case-insensitive equality (`.jpg` matches `a.JPG` but not `a.jpeg`)
//! - Anything else is a case-insensitive regex searched in the full file name
//! - A pattern that is not a valid regex is tried as a case-insensitive glob,
//!   so shell-style `*.txt` or `IMG_????*` also work
//!
//! An empty filter set matches every file.

use crate::error::{RenamerError, RenamerResult};
use crate::name_rule::split_name;
use crate::scanner::FileEntry;
use glob::{MatchOptions, Pattern};
use regex::{Regex, RegexBuilder};

/// A single compiled pattern.
#[derive(Debug, Clone)]
pub enum FilterPattern {
    /// Lower-cased extension including the leading dot.
    Extension(String),
    Regex(Regex),
    Glob(Pattern),
}

impl FilterPattern {
    /// Compiles a single pattern.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFilterPattern` if the pattern is neither a valid regex
    /// nor a valid glob.
    pub fn parse(pattern: &str) -> RenamerResult<Self> {
        if pattern.starts_with('.') {
            return Ok(FilterPattern::Extension(pattern.to_lowercase()));
        }

        match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(regex) => Ok(FilterPattern::Regex(regex)),
            Err(regex_err) => Pattern::new(pattern).map(FilterPattern::Glob).map_err(|_| {
                RenamerError::InvalidFilterPattern {
                    pattern: pattern.to_string(),
                    reason: regex_err.to_string(),
                }
            }),
        }
    }

    /// Checks a file name against this pattern.
    pub fn matches(&self, file_name: &str) -> bool {
        match self {
            FilterPattern::Extension(ext) => split_name(file_name).1.to_lowercase() == *ext,
            FilterPattern::Regex(regex) => regex.is_match(file_name),
            FilterPattern::Glob(pattern) => pattern.matches_with(
                file_name,
                MatchOptions {
                    case_sensitive: false,
                    require_literal_separator: false,
                    require_literal_leading_dot: false,
                },
            ),
        }
    }
}

/// Compiled filter patterns plus the hidden-file switch.
#[derive(Debug, Clone)]
pub struct FilterSet {
    patterns: Vec<FilterPattern>,
    raw: Vec<String>,
    include_hidden: bool,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            raw: Vec::new(),
            include_hidden: true,
        }
    }
}

impl FilterSet {
    /// A filter set that matches everything.
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Compiles every pattern up front. Blank patterns are ignored.
    ///
    /// # Errors
    ///
    /// Fails on the first pattern that cannot be compiled.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> RenamerResult<Self> {
        let raw: Vec<String> = patterns
            .iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        let patterns = raw
            .iter()
            .map(|p| FilterPattern::parse(p))
            .collect::<RenamerResult<Vec<_>>>()?;

        Ok(Self {
            patterns,
            raw,
            include_hidden: true,
        })
    }

    /// Whether dot-files take part at all. Enabled by default.
    pub fn with_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// The patterns as they were given, for display.
    pub fn patterns(&self) -> &[String] {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns true if the entry should take part in the batch.
    pub fn matches(&self, entry: &FileEntry) -> bool {
        if !self.include_hidden && entry.is_hidden() {
            return false;
        }
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(&entry.name))
    }

    /// Returns the matching subset, keeping scan order.
    pub fn apply(&self, entries: &[FileEntry]) -> Vec<FileEntry> {
        entries
            .iter()
            .filter(|entry| self.matches(entry))
            .cloned()
            .collect()
    }
}
