use crate::ast::Expression;
use crate::parser::positions::{Position, Range};
use crate::sourcemap::SourceMap;

/// Output buffer that tracks where each write lands and records source
/// mappings for the writes that came from the template.
///
/// Positions use the same conventions as the parser: byte offset, 1-based
/// line, 1-based column counted in characters.
#[derive(Debug, Default)]
pub struct RangeWriter {
    buf: String,
    current: Position,
    source_map: SourceMap,
}

impl RangeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The position the next write starts at.
    pub fn position(&self) -> Position {
        self.current
    }

    /// Add text without mapping
    pub fn write(&mut self, text: &str) -> Range {
        let from = self.current;
        self.buf.push_str(text);
        for c in text.chars() {
            self.current.advance(c);
        }
        Range::new(from, self.current)
    }

    /// Add text that was derived from `source` in the template.
    pub fn write_mapped(&mut self, text: &str, source: Range) -> Range {
        let target = self.write(text);
        self.source_map.add_text(text, source, target);
        target
    }

    /// Copy an expression through verbatim and map it.
    pub fn write_expression(&mut self, expr: &Expression) -> Range {
        self.write_mapped(&expr.text, expr.range)
    }

    pub fn newline(&mut self) {
        self.write("\n");
    }

    /// Finish and return the text and its mappings
    pub fn finish(self) -> (String, SourceMap) {
        (self.buf, self.source_map)
    }
}
