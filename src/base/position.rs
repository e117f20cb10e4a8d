//! Position tracking for diagnostics
//!
//! Stores the source location (file/line/column) of declarations so that
//! resolution problems can be reported against the member that caused them.

use std::fmt;
use std::sync::Arc;

/// A location in a source unit (1-indexed line and column).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// A location that only names the file (line and column unknown).
    pub fn file_only(file: impl Into<Arc<str>>) -> Self {
        Self::new(file, 0, 0)
    }

    /// Returns true if no line information is available.
    pub fn is_file_only(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_file_only() {
            write!(f, "{}", self.file)
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}
