//! Name transformation rules and the ordered rule chain.
//!
//! A rule chain is folded left-to-right over the base name of a file (the
//! part before the extension). Every rule is a total function over text, so
//! applying a chain never fails.
//!
//! # Examples
//!
//! ```
//! use bulk_renamer::name_rule::{CaseMode, NameRule, RuleChain};
//!
//! let mut chain = RuleChain::new();
//! chain.push(NameRule::Prefix { text: "x_".to_string() });
//! chain.push(NameRule::CaseTransform { mode: CaseMode::Upper });
//! assert_eq!(chain.apply("report.txt", 0), "X_REPORT.txt");
//! ```

use crate::error::{RenamerError, RenamerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Case conversion applied to the base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseMode {
    #[default]
    Keep,
    Upper,
    Lower,
    /// First letter of every alphabetic run upper-cased, the rest lower-cased.
    Title,
    /// First character upper-cased, the rest lower-cased.
    Capitalize,
}

impl CaseMode {
    /// Applies this case mode to `text`.
    pub fn apply(self, text: &str) -> String {
        match self {
            CaseMode::Keep => text.to_string(),
            CaseMode::Upper => text.to_uppercase(),
            CaseMode::Lower => text.to_lowercase(),
            CaseMode::Title => title_case(text),
            CaseMode::Capitalize => capitalize(text),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CaseMode::Keep => "keep",
            CaseMode::Upper => "upper",
            CaseMode::Lower => "lower",
            CaseMode::Title => "title",
            CaseMode::Capitalize => "capitalize",
        }
    }
}

impl FromStr for CaseMode {
    type Err = RenamerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep" => Ok(CaseMode::Keep),
            "upper" => Ok(CaseMode::Upper),
            "lower" => Ok(CaseMode::Lower),
            "title" => Ok(CaseMode::Title),
            "capitalize" => Ok(CaseMode::Capitalize),
            other => Err(RenamerError::InvalidRule(format!(
                "unknown case mode '{}': expected keep, upper, lower, title or capitalize",
                other
            ))),
        }
    }
}

fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            result.push(c);
            in_word = false;
        }
    }
    result
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn default_sequence_start() -> i64 {
    1
}

/// Largest digit count accepted by the textual rule syntax. A wider number
/// could never fit in a file name.
pub const MAX_SEQUENCE_DIGITS: usize = 255;

fn default_sequence_digits() -> usize {
    3
}

/// A single step of the rule chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NameRule {
    /// Prepends `text` to the base name.
    Prefix { text: String },
    /// Appends `text` to the base name.
    Suffix { text: String },
    /// Literal substitution of every occurrence of `find`.
    Replace {
        find: String,
        replace_with: String,
        /// When set, the substitution runs over `base + ext` and the result
        /// is split again, so the extension can change.
        #[serde(default)]
        include_extension: bool,
    },
    /// Replaces the base name with `start + index`, zero-padded to `digits`.
    ///
    /// Whatever earlier rules produced is discarded; later rules see only
    /// the number.
    Sequence {
        #[serde(default = "default_sequence_start")]
        start: i64,
        #[serde(default = "default_sequence_digits")]
        digits: usize,
    },
    /// Changes the case of the base name. The extension is never touched.
    #[serde(rename = "case")]
    CaseTransform {
        #[serde(default)]
        mode: CaseMode,
    },
}

impl NameRule {
    /// Short kind name, as used in rule syntax and listings.
    pub fn kind(&self) -> &'static str {
        match self {
            NameRule::Prefix { .. } => "prefix",
            NameRule::Suffix { .. } => "suffix",
            NameRule::Replace {
                include_extension: false,
                ..
            } => "replace",
            NameRule::Replace {
                include_extension: true,
                ..
            } => "replace-ext",
            NameRule::Sequence { .. } => "sequence",
            NameRule::CaseTransform { .. } => "case",
        }
    }

    /// Human-readable description of what the rule does.
    pub fn description(&self) -> String {
        match self {
            NameRule::Prefix { text } => format!("add prefix \"{}\"", text),
            NameRule::Suffix { text } => format!("add suffix \"{}\"", text),
            NameRule::Replace {
                find,
                replace_with,
                include_extension,
            } => {
                let scope = if *include_extension {
                    " (including extension)"
                } else {
                    ""
                };
                format!("replace \"{}\" with \"{}\"{}", find, replace_with, scope)
            }
            NameRule::Sequence { start, digits } => {
                format!("number from {} ({} digits)", start, digits)
            }
            NameRule::CaseTransform { mode } => format!("case: {}", mode.as_str()),
        }
    }

    /// Applies this rule to a split name. `index` is the position of the file
    /// within the current filtered set.
    fn apply_to(&self, base: &mut String, ext: &mut String, index: usize) {
        match self {
            NameRule::Prefix { text } => base.insert_str(0, text),
            NameRule::Suffix { text } => base.push_str(text),
            NameRule::Replace {
                find,
                replace_with,
                include_extension,
            } => {
                if find.is_empty() {
                    return;
                }
                if *include_extension {
                    let full = format!("{}{}", base, ext).replace(find.as_str(), replace_with);
                    let (new_base, new_ext) = split_name(&full);
                    *base = new_base.to_string();
                    *ext = new_ext.to_string();
                } else {
                    *base = base.replace(find.as_str(), replace_with);
                }
            }
            NameRule::Sequence { start, digits } => {
                let value = start.saturating_add(i64::try_from(index).unwrap_or(i64::MAX));
                *base = zero_pad(value, *digits);
            }
            NameRule::CaseTransform { mode } => *base = mode.apply(base),
        }
    }
}

impl fmt::Display for NameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Parses the command-line rule syntax.
///
/// ```
/// use bulk_renamer::name_rule::NameRule;
///
/// let rule: NameRule = "sequence:1,3".parse().unwrap();
/// assert_eq!(rule, NameRule::Sequence { start: 1, digits: 3 });
/// ```
impl FromStr for NameRule {
    type Err = RenamerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, arg) = s.split_once(':').ok_or_else(|| {
            RenamerError::InvalidRule(format!("'{}': expected KIND:ARGUMENT", s))
        })?;

        match kind.trim().to_lowercase().as_str() {
            "prefix" => Ok(NameRule::Prefix {
                text: arg.to_string(),
            }),
            "suffix" => Ok(NameRule::Suffix {
                text: arg.to_string(),
            }),
            "replace" | "replace-ext" => {
                let (find, replace_with) = arg.split_once("=>").ok_or_else(|| {
                    RenamerError::InvalidRule(format!("'{}': expected FIND=>REPLACEMENT", s))
                })?;
                if find.is_empty() {
                    return Err(RenamerError::InvalidRule(format!(
                        "'{}': search text cannot be empty",
                        s
                    )));
                }
                Ok(NameRule::Replace {
                    find: find.to_string(),
                    replace_with: replace_with.to_string(),
                    include_extension: kind.trim().eq_ignore_ascii_case("replace-ext"),
                })
            }
            "sequence" | "seq" => {
                let (start, digits) = match arg.split_once(',') {
                    Some((start, digits)) => (start, Some(digits)),
                    None => (arg, None),
                };
                let start = start.trim().parse::<i64>().map_err(|e| {
                    RenamerError::InvalidRule(format!("'{}': invalid start number: {}", s, e))
                })?;
                let digits = match digits {
                    Some(d) => d.trim().parse::<usize>().map_err(|e| {
                        RenamerError::InvalidRule(format!("'{}': invalid digit count: {}", s, e))
                    })?,
                    None => default_sequence_digits(),
                };
                if digits > MAX_SEQUENCE_DIGITS {
                    return Err(RenamerError::InvalidRule(format!(
                        "'{}': at most {} digits are allowed",
                        s, MAX_SEQUENCE_DIGITS
                    )));
                }
                Ok(NameRule::Sequence { start, digits })
            }
            "case" => Ok(NameRule::CaseTransform { mode: arg.parse()? }),
            other => Err(RenamerError::InvalidRule(format!(
                "unknown rule kind '{}': expected prefix, suffix, replace, replace-ext, sequence or case",
                other
            ))),
        }
    }
}

/// Splits a file name into `(base, extension)`.
///
/// The extension starts at the last dot and keeps it. Leading dots never
/// start an extension, so hidden files without a further dot have none.
///
/// ```
/// use bulk_renamer::name_rule::split_name;
///
/// assert_eq!(split_name("archive.tar.gz"), ("archive.tar", ".gz"));
/// assert_eq!(split_name(".bashrc"), (".bashrc", ""));
/// assert_eq!(split_name("README"), ("README", ""));
/// ```
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if name[..dot].chars().any(|c| c != '.') => name.split_at(dot),
        _ => (name, ""),
    }
}

/// Formats `value` left-padded with zeros to at least `digits` characters.
/// A minus sign counts towards the width. Any width is accepted.
pub fn zero_pad(value: i64, digits: usize) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let number = value.unsigned_abs().to_string();
    let zeros = digits.saturating_sub(sign.len() + number.len());
    format!("{}{}{}", sign, "0".repeat(zeros), number)
}

/// Ordered sequence of rules. Order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleChain {
    rules: Vec<NameRule>,
}

impl RuleChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: NameRule) {
        self.rules.push(rule);
    }

    /// Removes the rule at `index`, returning it if it existed.
    pub fn remove(&mut self, index: usize) -> Option<NameRule> {
        if index < self.rules.len() {
            Some(self.rules.remove(index))
        } else {
            None
        }
    }

    /// Moves the rule at `from` so that it ends up at position `to`.
    /// Returns false when either index is out of range.
    pub fn move_rule(&mut self, from: usize, to: usize) -> bool {
        if from >= self.rules.len() || to >= self.rules.len() {
            return false;
        }
        let rule = self.rules.remove(from);
        self.rules.insert(to, rule);
        true
    }

    pub fn move_up(&mut self, index: usize) -> bool {
        index > 0 && self.move_rule(index, index - 1)
    }

    pub fn move_down(&mut self, index: usize) -> bool {
        self.move_rule(index, index + 1)
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn get(&self, index: usize) -> Option<&NameRule> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NameRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Computes the new name for `file_name`, the file at position `index`
    /// of the filtered set.
    pub fn apply(&self, file_name: &str, index: usize) -> String {
        let (base, ext) = split_name(file_name);
        let mut base = base.to_string();
        let mut ext = ext.to_string();

        for rule in &self.rules {
            rule.apply_to(&mut base, &mut ext, index);
        }

        base + &ext
    }
}

impl From<Vec<NameRule>> for RuleChain {
    fn from(rules: Vec<NameRule>) -> Self {
        Self { rules }
    }
}

impl FromIterator<NameRule> for RuleChain {
    fn from_iter<I: IntoIterator<Item = NameRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

/// Parses a list of textual rules into a chain, keeping their order.
pub fn parse_rules<S: AsRef<str>>(specs: &[S]) -> RenamerResult<RuleChain> {
    specs.iter().map(|s| s.as_ref().parse::<NameRule>()).collect()
}
