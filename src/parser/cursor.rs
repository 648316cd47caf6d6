//! A read position over a fully buffered source text.
//!
//! The cursor never copies the input. Saving and restoring a position is a
//! plain copy of a [`Mark`], which is what makes backtracking free.

use super::positions::{Position, Range};

/// Which delimiter family the input is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `if x {` ... `}`
    #[default]
    Brace,
    /// `{% if x %}` ... `{% endif %}`
    Legacy,
}

/// A saved cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(Position);

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    src: &'a str,
    pos: Position,
    dialect: Dialect,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::with_dialect(src, Dialect::Brace)
    }

    pub fn with_dialect(src: &'a str, dialect: Dialect) -> Self {
        Self { src, pos: Position::START, dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn source(&self) -> &'a str {
        self.src
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn mark(&self) -> Mark {
        Mark(self.pos)
    }

    pub fn reset(&mut self, mark: Mark) {
        self.pos = mark.0;
    }

    /// Everything not consumed yet.
    pub fn rest(&self) -> &'a str {
        &self.src[self.pos.offset..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos.offset >= self.src.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos.advance(c);
        Some(c)
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// Consume `s` if the input continues with it.
    pub fn eat(&mut self, s: &str) -> bool {
        if !self.starts_with(s) {
            return false;
        }
        for c in s.chars() {
            self.pos.advance(c);
        }
        true
    }

    /// Consume characters while `pred` holds and return them.
    pub fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'a str {
        let start = self.pos.offset;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos.advance(c);
        }
        &self.src[start..self.pos.offset]
    }

    /// Spaces and tabs only.
    pub fn skip_blanks(&mut self) -> &'a str {
        self.eat_while(|c| c == ' ' || c == '\t')
    }

    pub fn skip_whitespace(&mut self) -> &'a str {
        self.eat_while(char::is_whitespace)
    }

    /// Text between `from` and the current position.
    pub fn slice_from(&self, from: Position) -> &'a str {
        &self.src[from.offset..self.pos.offset]
    }

    pub fn range_from(&self, from: Position) -> Range {
        Range::new(from, self.pos)
    }

    /// Whether only blanks remain before the next newline or the end of input.
    pub fn at_line_end(&self) -> bool {
        self.rest()
            .chars()
            .find(|c| *c != ' ' && *c != '\t' && *c != '\r')
            .is_none_or(|c| c == '\n')
    }
}
