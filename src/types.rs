use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, hash::BuildHasherDefault, path::PathBuf};
use xxhash_rust::xxh3::Xxh3;

pub type Xxh3IndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<Xxh3>>;
pub type Xxh3HashSet<T> = HashSet<T, BuildHasherDefault<Xxh3>>;

/// Structural kind of a single passage line, derived from its syntax alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Command,
    Logic,
    Choice,
    Content,
}

impl LineKind {
    pub fn is_command(self) -> bool {
        matches!(self, LineKind::Command)
    }

    pub fn is_logic(self) -> bool {
        matches!(self, LineKind::Logic)
    }

    pub fn is_content(self) -> bool {
        matches!(self, LineKind::Content)
    }

    /// Commands and logic lines are matched by kind, never by prose similarity.
    pub fn is_special(self) -> bool {
        matches!(self, LineKind::Command | LineKind::Logic)
    }
}

/// Category of a reference line that has no counterpart in the target passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "MISSING_TEXT")]
    MissingText,
    #[serde(rename = "MISSING_COMMAND")]
    MissingCommand,
    #[serde(rename = "MISSING_LOGIC")]
    MissingLogic,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::MissingText => "MISSING_TEXT",
            Category::MissingCommand => "MISSING_COMMAND",
            Category::MissingLogic => "MISSING_LOGIC",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "MISSING_TEXT" => Some(Category::MissingText),
            "MISSING_COMMAND" => Some(Category::MissingCommand),
            "MISSING_LOGIC" => Some(Category::MissingLogic),
            _ => None,
        }
    }
}

impl From<LineKind> for Category {
    fn from(kind: LineKind) -> Self {
        match kind {
            LineKind::Command => Category::MissingCommand,
            LineKind::Logic => Category::MissingLogic,
            LineKind::Choice | LineKind::Content => Category::MissingText,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub text: String,
    pub target: String,
}

/// One passage of the reference dump. `line_count` and `choice_count` are the
/// counts the dump declares, `lines` and `choices` what it actually contains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencePassage {
    pub name: String,
    pub line_count: usize,
    pub choice_count: usize,
    pub lines: Vec<String>,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceObject {
    pub id: String,
    pub passages: Xxh3IndexMap<String, ReferencePassage>,
}

/// Whole reference dump, objects in dump order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceDump {
    pub objects: Xxh3IndexMap<String, ReferenceObject>,
}

/// A non-blank line of a target passage with its 0-based index in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLine {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetPassage {
    pub name: String,
    /// Index of the `=== name` header line.
    pub header: usize,
    /// One past the last line that belongs to the passage.
    pub end: usize,
    /// Commands, logic and content, in file order.
    pub lines: Vec<TargetLine>,
    pub choices: Vec<TargetLine>,
}

impl TargetPassage {
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|line: &TargetLine| line.text.as_str()).collect()
    }
}

/// A parsed target file. `raw` keeps every line verbatim so writes only touch
/// what was changed.
#[derive(Debug, Clone, Default)]
pub struct TargetFile {
    pub path: PathBuf,
    pub file_name: String,
    pub raw: Vec<String>,
    pub passages: Xxh3IndexMap<String, TargetPassage>,
    pub line_ending: &'static str,
    pub trailing_newline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingLine {
    pub category: Category,
    #[serde(alias = "english_text")]
    pub text: String,
    pub position: usize,
    #[serde(default)]
    pub context_before: String,
    #[serde(default)]
    pub context_after: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageReport {
    pub file: String,
    pub passage: String,
    #[serde(alias = "eng_total")]
    pub reference_total: usize,
    #[serde(alias = "rus_total")]
    pub target_total: usize,
    pub missing: Vec<MissingLine>,
}

/// One row of the pipe-delimited translation queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub file: String,
    pub passage: String,
    pub position: usize,
    pub category: Category,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    #[serde(rename = "WARN")]
    Warn,
    #[serde(rename = "ERROR")]
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }
}

/// A single finding of `audit`, `validate`, `scan` or `duplicates`.
/// `line` is 1-based and zero when the finding concerns a whole passage or file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub file: String,
    pub passage: String,
    pub line: usize,
    pub rule: &'static str,
    pub severity: Severity,
    pub detail: String,
}
