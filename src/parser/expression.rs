//! Scanners for embedded host-language snippets.
//!
//! The snippets are never parsed, only delimited: bracket depth is tracked
//! and string literals are skipped so that a `}` or `{` inside `"..."`,
//! `` `...` `` or `'...'` does not end the snippet early. Trailing blanks are
//! left out of the captured range, so the range always slices back to
//! exactly the captured text.

use super::cursor::Cursor;
use super::positions::{Expression, Position, Range};

/// Why a header scan stopped without finding its terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderEnd {
    Newline,
    Eof,
}

/// Skip a string literal starting at the cursor. Returns false if the cursor
/// is not on a quote.
fn skip_string(cur: &mut Cursor<'_>) -> bool {
    let Some(quote) = cur.peek() else {
        return false;
    };
    if !matches!(quote, '"' | '\'' | '`') {
        return false;
    }
    cur.advance();
    while let Some(c) = cur.peek() {
        if c == '\n' && quote != '`' {
            // Unterminated interpreted string; let the caller see the newline.
            return true;
        }
        cur.advance();
        if c == '\\' && quote != '`' {
            cur.advance();
        } else if c == quote {
            return true;
        }
    }
    true
}

/// Tracks the last non-blank position so trailing blanks can be trimmed.
struct Capture {
    from: Position,
    end: Position,
}

impl Capture {
    fn start(cur: &Cursor<'_>) -> Self {
        let from = cur.position();
        Self { from, end: from }
    }

    fn seen(&mut self, cur: &Cursor<'_>) {
        self.end = cur.position();
    }

    fn finish(&self, cur: &Cursor<'_>) -> Expression {
        let text = &cur.source()[self.from.offset..self.end.offset];
        Expression::new(text, Range::new(self.from, self.end))
    }
}

/// Scan up to the `}` closing an already consumed `{`. The cursor is left on
/// the `}`. Leading whitespace is skipped. `None` when the input ends first.
pub fn until_closing_brace(cur: &mut Cursor<'_>) -> Option<Expression> {
    cur.skip_whitespace();
    let mut cap = Capture::start(cur);
    let mut depth = 0usize;
    loop {
        let c = cur.peek()?;
        match c {
            '}' if depth == 0 => return Some(cap.finish(cur)),
            '{' | '(' | '[' => {
                depth += 1;
                cur.advance();
            }
            '}' | ')' | ']' => {
                depth = depth.saturating_sub(1);
                cur.advance();
            }
            '"' | '\'' | '`' => {
                skip_string(cur);
            }
            _ => {
                cur.advance();
            }
        }
        if !c.is_whitespace() {
            cap.seen(cur);
        }
    }
}

/// Scan a block header up to `terminator` at bracket depth zero, where the
/// terminator is the last thing on its line. The cursor is left on the
/// terminator. Leading blanks are skipped.
pub fn header(cur: &mut Cursor<'_>, terminator: char) -> Result<Expression, HeaderEnd> {
    cur.skip_blanks();
    let mut cap = Capture::start(cur);
    let mut depth = 0usize;
    loop {
        let Some(c) = cur.peek() else {
            return Err(HeaderEnd::Eof);
        };
        if depth == 0 && c == terminator {
            let mark = cur.mark();
            cur.advance();
            let at_end = cur.at_line_end();
            cur.reset(mark);
            if at_end {
                return Ok(cap.finish(cur));
            }
        }
        match c {
            '\n' if depth == 0 => return Err(HeaderEnd::Newline),
            '{' | '(' | '[' => {
                depth += 1;
                cur.advance();
            }
            '}' | ')' | ']' => {
                depth = depth.saturating_sub(1);
                cur.advance();
            }
            '"' | '\'' | '`' => {
                skip_string(cur);
            }
            _ => {
                cur.advance();
            }
        }
        if !c.is_whitespace() {
            cap.seen(cur);
        }
    }
}

/// Scan up to the first `{` at bracket depth zero on the current line. The
/// cursor is left on the `{`. `None` when the line or the input ends first.
pub fn until_open_brace(cur: &mut Cursor<'_>) -> Option<Expression> {
    cur.skip_blanks();
    let mut cap = Capture::start(cur);
    let mut depth = 0usize;
    loop {
        let c = cur.peek()?;
        match c {
            '{' if depth == 0 => return Some(cap.finish(cur)),
            '\n' if depth == 0 => return None,
            '{' | '(' | '[' => {
                depth += 1;
                cur.advance();
            }
            '}' | ')' | ']' => {
                depth = depth.saturating_sub(1);
                cur.advance();
            }
            '"' | '\'' | '`' => {
                skip_string(cur);
            }
            _ => {
                cur.advance();
            }
        }
        if !c.is_whitespace() {
            cap.seen(cur);
        }
    }
}

/// With the cursor on `(`, capture everything up to the matching `)` and
/// consume both parentheses. `None` if the cursor is not on `(` or the input
/// ends first.
pub fn parenthesised(cur: &mut Cursor<'_>) -> Option<Expression> {
    let mark = cur.mark();
    if !cur.eat("(") {
        return None;
    }
    let from = cur.position();
    let mut depth = 0usize;
    loop {
        let Some(c) = cur.peek() else {
            cur.reset(mark);
            return None;
        };
        match c {
            ')' if depth == 0 => {
                let expr = Expression::new(cur.slice_from(from), cur.range_from(from));
                cur.advance();
                return Some(expr);
            }
            '{' | '(' | '[' => {
                depth += 1;
                cur.advance();
            }
            '}' | ')' | ']' => {
                depth = depth.saturating_sub(1);
                cur.advance();
            }
            '"' | '\'' | '`' => {
                skip_string(cur);
            }
            _ => {
                cur.advance();
            }
        }
    }
}

pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A host-language identifier at the cursor.
pub fn identifier(cur: &mut Cursor<'_>) -> Option<Expression> {
    if !cur.peek().is_some_and(is_ident_start) {
        return None;
    }
    let from = cur.position();
    let text = cur.eat_while(is_ident_continue);
    Some(Expression::new(text, cur.range_from(from)))
}

/// Whether `s` is usable as an identifier: a letter or underscore first,
/// then letters, digits or underscores.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_continue)
}
