//! Domain entities: core data structures

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use itertools::Itertools;

/// Name path of a discipline: cleaned names from the top-level node down.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DisciplinePath(Vec<String>);

impl DisciplinePath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Slash-delimited form, as accepted by `reset` and `done`.
    pub fn to_slash_string(&self) -> String {
        self.0.join("/")
    }
}

impl fmt::Display for DisciplinePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join(" / "))
    }
}

/// Parses `人文学科/哲学/道家哲学`; empty segments and surrounding blanks are dropped.
impl FromStr for DisciplinePath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(
            s.split('/')
                .map(str::trim)
                .filter(|seg| !seg.is_empty())
                .map(String::from)
                .collect(),
        ))
    }
}

impl AsRef<[String]> for DisciplinePath {
    fn as_ref(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for DisciplinePath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for DisciplinePath {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(|s| s.to_string()).collect())
    }
}

/// One directory reported by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    /// Path relative to the base directory (never empty)
    pub relative: PathBuf,
    /// Plain filenames directly inside the directory
    pub files: Vec<String>,
}

/// Leaf counts of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeafSummary {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
}

/// Outcome of a completion change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionChange {
    /// Node was already in the requested state
    Unchanged,
    /// Directory was renamed
    Renamed { from: PathBuf, to: PathBuf },
}
