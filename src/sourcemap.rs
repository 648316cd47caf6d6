//! Position mapping between a template and the code generated from it.
//!
//! The map is a flat list of `(source, target)` range pairs in the order the
//! generator wrote them, outer constructs before the pieces inside them. A
//! lookup picks the innermost entry containing the query, that is the one
//! whose start is greatest, and translates the position within it.
//!
//! Lines and columns always translate. Byte offsets need the mapped text:
//! entries recorded with it (every entry a [`RangeWriter`] writes) give exact
//! offsets, entries built from bare ranges only do so for single-line spans
//! of one-byte characters and otherwise report the start of the range.
//!
//! [`RangeWriter`]: crate::generate::RangeWriter

use serde::Serialize;

use crate::ast::Expression;
use crate::parser::positions::{Position, Range};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMapEntry {
    pub source: Range,
    pub target: Range,
    /// The text both ranges span, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceMap {
    entries: Vec<SourceMapEntry>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair. Nothing is merged or deduplicated.
    pub fn add(&mut self, source: Range, target: Range) {
        self.entries.push(SourceMapEntry { source, target, text: None });
    }

    /// Append a pair for `text` copied verbatim from `source` to `target`.
    pub fn add_text(&mut self, text: &str, source: Range, target: Range) {
        self.entries.push(SourceMapEntry {
            source,
            target,
            text: Some(text.to_string()),
        });
    }

    pub fn add_expression(&mut self, source: &Expression, target: Range) {
        self.add_text(&source.text, source.range, target);
    }

    pub fn entries(&self) -> &[SourceMapEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Where `(line, column)` in the template ends up in the generated code.
    pub fn target_from_source(&self, line: usize, column: usize) -> Option<(Position, &SourceMapEntry)> {
        let entry = innermost(&self.entries, line, column, |e| e.source)?;
        Some((translate(entry.source, entry.target, entry.text.as_deref(), line, column), entry))
    }

    /// Where `(line, column)` in the generated code came from in the template.
    pub fn source_from_target(&self, line: usize, column: usize) -> Option<(Position, &SourceMapEntry)> {
        let entry = innermost(&self.entries, line, column, |e| e.target)?;
        Some((translate(entry.target, entry.source, entry.text.as_deref(), line, column), entry))
    }
}

/// The containing entry with the greatest start. Ties go to the entry added
/// last.
fn innermost(
    entries: &[SourceMapEntry],
    line: usize,
    column: usize,
    side: impl Fn(&SourceMapEntry) -> Range,
) -> Option<&SourceMapEntry> {
    entries
        .iter()
        .filter(|e| side(e).contains(line, column))
        .max_by_key(|e| side(e).from.line_col())
}

/// Move `(line, column)` from `from_side` into `to_side`.
///
/// On the first line of the range the column offset carries over. On later
/// lines the line offset carries over and the column is kept, since mapped
/// snippets are copied line for line. The result never passes the end of
/// `to_side`.
fn translate(
    from_side: Range,
    to_side: Range,
    text: Option<&str>,
    line: usize,
    column: usize,
) -> Position {
    let start = to_side.from;
    let lines_down = line - from_side.from.line;
    let (line, column, chars_in) = if lines_down == 0 {
        let delta = column - from_side.from.column;
        (start.line, start.column + delta, delta)
    } else {
        (start.line + lines_down, column, column - 1)
    };
    if (line, column) > to_side.to.line_col() {
        return to_side.to;
    }
    let offset = start.offset + byte_delta(to_side, text, lines_down, chars_in);
    Position::new(offset, line, column)
}

/// Bytes from the start of `range` to the character `chars_in` characters
/// into its line `lines_down`. Line 0 counts from the start of the range,
/// later lines from column 1.
fn byte_delta(range: Range, text: Option<&str>, lines_down: usize, chars_in: usize) -> usize {
    let Some(text) = text else {
        let single_byte = range.from.line == range.to.line
            && range.to.offset - range.from.offset == range.to.column - range.from.column;
        return if lines_down == 0 && single_byte { chars_in } else { 0 };
    };
    let line_start = match lines_down {
        0 => 0,
        n => text.match_indices('\n').nth(n - 1).map_or(text.len(), |(i, _)| i + 1),
    };
    let rest = &text[line_start..];
    line_start + rest.char_indices().nth(chars_in).map_or(rest.len(), |(i, _)| i)
}
