//! `if`, `for` and `switch` blocks in the brace dialect.

use super::combinator::{Outcome, attempt, literal, newline};
use super::cursor::Cursor;
use super::expression::{self, HeaderEnd};
use super::nodes::{node_list, unfinished};
use super::positions::{Expression, Position, Range};
use crate::ast::{
    CaseExpression, CaseKind, ElseIf, ForExpression, IfExpression, Node, SwitchExpression,
};
use crate::error::ParseError;

const ESCAPE_HELP: &str = "to write the keyword as text, put it in a string expression, e.g. { \"for\" }";

/// Capture a header up to the `{` that ends its line, then consume the brace
/// and the line break after it.
pub(super) fn block_header(
    cur: &mut Cursor<'_>,
    construct: &str,
    start: Position,
) -> Result<Expression, ParseError> {
    match expression::header(cur, '{') {
        Ok(expr) => {
            if expr.text.is_empty() {
                return Err(unfinished(
                    cur,
                    start,
                    format!("{construct}: missing expression (expected an expression before '{{')"),
                ));
            }
            cur.eat("{");
            end_of_line(cur);
            Ok(expr)
        }
        Err(HeaderEnd::Newline | HeaderEnd::Eof) => Err(unfinished(
            cur,
            start,
            format!("{construct}: unterminated (missing closing '{{')"),
        )
        .with_help(ESCAPE_HELP)),
    }
}

/// Blanks and one line break, if present.
pub(super) fn end_of_line(cur: &mut Cursor<'_>) {
    cur.skip_blanks();
    newline(cur);
}

fn close_brace(cur: &mut Cursor<'_>, construct: &str, start: Position) -> Result<(), ParseError> {
    if cur.eat("}") {
        Ok(())
    } else {
        Err(unfinished(
            cur,
            start,
            format!("{construct}: missing end (expected '}}')"),
        ))
    }
}

/// `} else if cond {` or `} else {`, with the cursor on the `}`.
enum ElseClause {
    ElseIf(Expression),
    Else,
}

fn else_clause(cur: &mut Cursor<'_>) -> Result<Option<ElseClause>, ParseError> {
    let start = cur.position();
    let mark = cur.mark();
    if !cur.eat("}") {
        return Ok(None);
    }
    cur.skip_blanks();
    if !cur.eat("else") || !matches!(cur.peek(), Some(' ' | '\t' | '{')) {
        cur.reset(mark);
        return Ok(None);
    }
    cur.skip_blanks();
    if cur.eat("if ") {
        return block_header(cur, "else if", start).map(|cond| Some(ElseClause::ElseIf(cond)));
    }
    if cur.eat("{") && cur.at_line_end() {
        end_of_line(cur);
        return Ok(Some(ElseClause::Else));
    }
    Err(unfinished(cur, start, "if: malformed else (expected '{' or 'if')"))
}

/// `if cond {` ... `} else if cond {` ... `} else {` ... `}`
pub fn if_expression(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !cur.eat("if ") {
            return Ok(None);
        }
        let cond = block_header(cur, "if", start)?;
        let then = node_list(cur, &literal("}"))?;

        let mut else_ifs = Vec::new();
        let mut else_ = None;
        loop {
            let clause_start = cur.position();
            match else_clause(cur)? {
                Some(ElseClause::ElseIf(cond)) => {
                    let then = node_list(cur, &literal("}"))?;
                    else_ifs.push(ElseIf {
                        cond,
                        then,
                        range: cur.range_from(clause_start),
                    });
                }
                Some(ElseClause::Else) => {
                    else_ = Some(node_list(cur, &literal("}"))?);
                    break;
                }
                None => break,
            }
        }

        close_brace(cur, "if", start)?;
        Ok(Some(Node::If(IfExpression {
            cond,
            then,
            else_ifs,
            else_,
            range: cur.range_from(start),
        })))
    })
}

/// `for header {` ... `}`
pub fn for_expression(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !cur.eat("for ") {
            return Ok(None);
        }
        let header = block_header(cur, "for", start)?;
        let children = node_list(cur, &literal("}"))?;
        close_brace(cur, "for", start)?;
        Ok(Some(Node::For(ForExpression {
            header,
            children,
            range: cur.range_from(start),
        })))
    })
}

/// Where a case body ends: the next clause or the switch's closing brace.
fn case_end(cur: &mut Cursor<'_>) -> Outcome<()> {
    if cur.starts_with("}") || clause_ahead(cur) {
        Outcome::Matched(())
    } else {
        Outcome::NotApplicable
    }
}

/// Whether a complete `case expr:` or `default:` header starts at the cursor.
/// Leaves the cursor where it was.
fn clause_ahead(cur: &mut Cursor<'_>) -> bool {
    let mark = cur.mark();
    let found = if cur.eat("case ") {
        expression::header(cur, ':').is_ok_and(|expr| !expr.text.is_empty())
    } else if cur.eat("default") {
        cur.skip_blanks();
        cur.eat(":")
    } else {
        false
    };
    cur.reset(mark);
    found
}

/// `case expr:` or `default:` and the nodes up to the next clause
pub fn case_expression(cur: &mut Cursor<'_>) -> Outcome<CaseExpression> {
    attempt(cur, |cur| {
        let start = cur.position();
        let (kind, expr) = if cur.eat("case ") {
            match expression::header(cur, ':') {
                Ok(expr) => {
                    cur.eat(":");
                    (CaseKind::Case, expr)
                }
                Err(_) => {
                    return Err(unfinished(
                        cur,
                        start,
                        "case: unterminated (missing closing ':')",
                    ));
                }
            }
        } else if cur.eat("default") {
            let at = cur.position();
            cur.skip_blanks();
            if !cur.eat(":") {
                return Err(unfinished(cur, start, "default: missing ':'"));
            }
            (CaseKind::Default, Expression::new("", Range::point(at)))
        } else {
            return Ok(None);
        };
        end_of_line(cur);

        let children = node_list(cur, &case_end)?;
        Ok(Some(CaseExpression {
            kind,
            expr,
            children,
            range: cur.range_from(start),
        }))
    })
}

/// `switch selector {` then clauses then `}`
pub fn switch_expression(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !cur.eat("switch ") {
            return Ok(None);
        }
        let selector = block_header(cur, "switch", start)?;

        let mut cases = Vec::new();
        loop {
            cur.skip_whitespace();
            match case_expression(cur) {
                Outcome::Matched(case) => cases.push(case),
                Outcome::NotApplicable => break,
                Outcome::Malformed(e) => return Err(e),
            }
        }

        close_brace(cur, "switch", start)?;
        Ok(Some(Node::Switch(SwitchExpression {
            selector,
            cases,
            range: cur.range_from(start),
        })))
    })
}
