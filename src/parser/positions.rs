//! Source positions and ranges.
//!
//! Every node and every embedded host-language snippet carries a [`Range`]
//! made of two [`Position`]s. The byte offset is what slicing uses; line and
//! column are 1-based and meant for people and for source-map lookups. The
//! column counts characters, not bytes.

use serde::Serialize;
use std::fmt;

/// A location in a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    /// Byte offset from the start of the text
    pub offset: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, counted in characters)
    pub column: usize,
}

impl Position {
    /// The first character of a text.
    pub const START: Position = Position { offset: 0, line: 1, column: 1 };

    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self { offset, line, column }
    }

    /// Key used for ordering: line first, then column. The offset is ignored
    /// so that positions built from line/column pairs alone still compare.
    pub fn line_col(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    /// Advance past `c`, keeping line and column in step with the offset.
    pub fn advance(&mut self, c: char) {
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {} (offset {})", self.line, self.column, self.offset)
    }
}

/// A span between two positions. `to` is the position just past the last
/// character, so `text[from.offset..to.offset]` is the spanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Range {
    pub from: Position,
    pub to: Position,
}

impl Range {
    pub fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }

    /// An empty range at `at`.
    pub fn point(at: Position) -> Self {
        Self { from: at, to: at }
    }

    /// Whether `(line, column)` lies within the range, both ends inclusive.
    pub fn contains(&self, line: usize, column: usize) -> bool {
        let p = (line, column);
        self.from.line_col() <= p && p <= self.to.line_col()
    }

    /// The spanned slice of `source`, if the offsets are in bounds.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.from.offset..self.to.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.from.offset == self.to.offset
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.from.line, self.from.column, self.to.line, self.to.column
        )
    }
}

/// A verbatim host-language fragment and where it came from. The text is
/// never re-escaped or normalised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Expression {
    pub text: String,
    pub range: Range,
}

impl Expression {
    pub fn new(text: impl Into<String>, range: Range) -> Self {
        Self { text: text.into(), range }
    }

    /// An expression that does not come from the source, such as a default
    /// package name. Its range is empty and sits at the start of the file.
    pub fn synthetic(text: impl Into<String>) -> Self {
        Self { text: text.into(), range: Range::point(Position::START) }
    }
}
