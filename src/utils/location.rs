//! Source positions for tokens, tree nodes and diagnostics.
//!
//! Lines and columns are 1-based. A span with line 0 marks a node with no
//! source text (an empty statement or epsilon-derived list).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in the source: line, column and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Byte offset from start of file
    pub offset: usize,
}

impl SourceLocation {
    /// Create a new source location.
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }

    /// First character of a file.
    pub fn start() -> Self {
        Self::new(1, 1, 0)
    }

    fn key(&self) -> (usize, usize) {
        (self.line, self.column)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The source range a token or node was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start line (1-indexed)
    pub start_line: usize,
    /// Start column (1-indexed)
    pub start_column: usize,
    /// End line (1-indexed)
    pub end_line: usize,
    /// End column (1-indexed)
    pub end_column: usize,
    /// Byte offset of start
    pub start_offset: usize,
    /// Byte offset of end
    pub end_offset: usize,
}

impl Span {
    /// Span between two line/column pairs, without offsets.
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self::from_locations(
            SourceLocation::new(start_line, start_column, 0),
            SourceLocation::new(end_line, end_column, 0),
        )
    }

    /// Span from its two end points.
    pub fn from_locations(start: SourceLocation, end: SourceLocation) -> Self {
        Self {
            start_line: start.line,
            start_column: start.column,
            end_line: end.line,
            end_column: end.column,
            start_offset: start.offset,
            end_offset: end.offset,
        }
    }

    /// Span of a node derived from no tokens.
    pub fn dummy() -> Self {
        Self::default()
    }

    /// Check if this span is a dummy span.
    pub fn is_dummy(&self) -> bool {
        self.start_line == 0 && self.end_line == 0
    }

    /// Start point.
    pub fn start(&self) -> SourceLocation {
        SourceLocation::new(self.start_line, self.start_column, self.start_offset)
    }

    /// End point.
    pub fn end(&self) -> SourceLocation {
        SourceLocation::new(self.end_line, self.end_column, self.end_offset)
    }

    /// Smallest span covering both.
    pub fn merge(&self, other: &Span) -> Span {
        let (a, b) = (self.start(), other.start());
        let start = if a.key() <= b.key() { a } else { b };
        let (a, b) = (self.end(), other.end());
        let end = if a.key() >= b.key() { a } else { b };
        Span::from_locations(start, end)
    }

    /// Like `merge`, but a dummy side is ignored.
    pub fn cover(&self, other: &Span) -> Span {
        match (self.is_dummy(), other.is_dummy()) {
            (true, _) => *other,
            (_, true) => *self,
            _ => self.merge(other),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}:{}-{}", self.start_line, self.start_column, self.end_column)
        } else {
            write!(f, "{}-{}", self.start(), self.end())
        }
    }
}

/// Line index over a source file, used to quote lines in diagnostics.
#[derive(Debug, Clone)]
pub struct SourceMap {
    source: String,
    line_starts: Vec<usize>,
}

impl SourceMap {
    /// Index the lines of `source`.
    pub fn new(source: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { source, line_starts }
    }

    /// Text of a 1-based line, without its newline.
    pub fn line(&self, line_number: usize) -> Option<&str> {
        let start = *self.line_starts.get(line_number.checked_sub(1)?)?;
        let end = self.line_starts.get(line_number).copied().unwrap_or(self.source.len());
        self.source.get(start..end).map(|text| text.trim_end_matches(['\n', '\r']))
    }
}
