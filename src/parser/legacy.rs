//! The older `{% ... %}` dialect.
//!
//! Files written this way produce the same tree as brace files, so the
//! formatter doubles as a migration tool.

use super::combinator::{Outcome, Rule, attempt, first_of, literal, until};
use super::control::end_of_line;
use super::cursor::Cursor;
use super::expression;
use super::nodes::{node_list, opens_tag, text_until, unfinished};
use super::positions::{Expression, Position, Range};
use crate::ast::{
    Block, CallExpression, CaseExpression, CaseKind, ForExpression, IfExpression, Import, Node,
    Package, StringExpression, SwitchExpression, TemplateBlock,
};
use crate::error::{ErrorKind, ParseError};

/// `{%` then `keyword`, with any blanks between.
fn open_tag(cur: &mut Cursor<'_>, keyword: &str) -> bool {
    let mark = cur.mark();
    if cur.eat("{%") {
        cur.skip_blanks();
        if cur.eat(keyword) {
            return true;
        }
    }
    cur.reset(mark);
    false
}

/// A complete `{% keyword %}` tag, such as `{% endif %}`.
fn closing_tag(cur: &mut Cursor<'_>, keyword: &str) -> bool {
    let mark = cur.mark();
    if open_tag(cur, keyword) {
        cur.skip_blanks();
        if cur.eat("%}") {
            return true;
        }
    }
    cur.reset(mark);
    false
}

/// Matches, without consuming, any of the given closing tags.
fn tag_ahead(cur: &mut Cursor<'_>, keywords: &[&str]) -> Outcome<()> {
    for keyword in keywords {
        let mark = cur.mark();
        let found = closing_tag(cur, keyword);
        cur.reset(mark);
        if found {
            return Outcome::Matched(());
        }
    }
    Outcome::NotApplicable
}

fn trim_end(expr: Expression) -> Expression {
    let trimmed = expr.text.trim_end();
    let cut_bytes = expr.text.len() - trimmed.len();
    let cut_chars = expr.text[trimmed.len()..].chars().count();
    let mut to = expr.range.to;
    to.offset -= cut_bytes;
    to.column -= cut_chars;
    Expression::new(trimmed, Range::new(expr.range.from, to))
}

/// The expression inside a tag, up to and including its `%}`. The tag may
/// not span lines.
pub(super) fn tag_expression(
    cur: &mut Cursor<'_>,
    construct: &str,
    start: Position,
) -> Result<Expression, ParseError> {
    cur.skip_blanks();
    let ends = [literal("%}"), literal("\n")];
    let raw = until(first_of(&ends)).parse(cur).into_result()?;
    match raw {
        Some(raw) if cur.eat("%}") => Ok(trim_end(raw)),
        _ => Err(unfinished(
            cur,
            start,
            format!("legacy {construct}: unterminated (missing closing ' %}}')"),
        )),
    }
}

fn missing_end(cur: &Cursor<'_>, construct: &str, start: Position) -> ParseError {
    unfinished(
        cur,
        start,
        format!("legacy {construct}: missing end (expected '{{% end{construct} %}}')"),
    )
}

/// `{%= expr %}`
pub fn string_expression(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !cur.eat("{%=") {
            return Ok(None);
        }
        let expr = tag_expression(cur, "string expression", start)?;
        Ok(Some(Node::StringExpression(StringExpression {
            expr,
            range: cur.range_from(start),
        })))
    })
}

/// `{%! Template(args) %}`
pub fn call_expression(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !cur.eat("{%!") {
            return Ok(None);
        }
        let expr = tag_expression(cur, "call", start)?;
        Ok(Some(Node::Call(CallExpression {
            expr,
            legacy: true,
            range: cur.range_from(start),
        })))
    })
}

pub fn text(cur: &mut Cursor<'_>) -> Outcome<Node> {
    text_until(cur, |rest| opens_tag(rest) || rest.starts_with("{%"))
}

pub fn if_expression(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !open_tag(cur, "if ") {
            return Ok(None);
        }
        let cond = tag_expression(cur, "if", start)?;
        end_of_line(cur);

        let then = node_list(cur, &|c: &mut Cursor<'_>| tag_ahead(c, &["else", "endif"]))?;
        let else_ = if closing_tag(cur, "else") {
            end_of_line(cur);
            Some(node_list(cur, &|c: &mut Cursor<'_>| tag_ahead(c, &["endif"]))?)
        } else {
            None
        };
        if !closing_tag(cur, "endif") {
            return Err(missing_end(cur, "if", start));
        }

        Ok(Some(Node::If(IfExpression {
            cond,
            then,
            else_ifs: Vec::new(),
            else_,
            range: cur.range_from(start),
        })))
    })
}

pub fn for_expression(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !open_tag(cur, "for ") {
            return Ok(None);
        }
        let header = tag_expression(cur, "for", start)?;
        end_of_line(cur);
        let children = node_list(cur, &|c: &mut Cursor<'_>| tag_ahead(c, &["endfor"]))?;
        if !closing_tag(cur, "endfor") {
            return Err(missing_end(cur, "for", start));
        }
        Ok(Some(Node::For(ForExpression {
            header,
            children,
            range: cur.range_from(start),
        })))
    })
}

fn case_expression(cur: &mut Cursor<'_>) -> Result<Option<CaseExpression>, ParseError> {
    let start = cur.position();
    let (kind, expr, end) = if open_tag(cur, "case ") {
        let expr = tag_expression(cur, "case", start)?;
        (CaseKind::Case, expr, "endcase")
    } else if closing_tag(cur, "default") {
        let expr = Expression::new("", Range::point(cur.position()));
        (CaseKind::Default, expr, "enddefault")
    } else {
        return Ok(None);
    };
    end_of_line(cur);

    let children = node_list(cur, &|c: &mut Cursor<'_>| tag_ahead(c, &[end]))?;
    if !closing_tag(cur, end) {
        let construct = if kind == CaseKind::Case { "case" } else { "default" };
        return Err(missing_end(cur, construct, start));
    }
    Ok(Some(CaseExpression {
        kind,
        expr,
        children,
        range: cur.range_from(start),
    }))
}

pub fn switch_expression(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !open_tag(cur, "switch ") {
            return Ok(None);
        }
        let selector = tag_expression(cur, "switch", start)?;
        end_of_line(cur);

        let mut cases = Vec::new();
        loop {
            cur.skip_whitespace();
            match case_expression(cur)? {
                Some(case) => cases.push(case),
                None => break,
            }
        }
        if !closing_tag(cur, "endswitch") {
            return Err(missing_end(cur, "switch", start));
        }
        Ok(Some(Node::Switch(SwitchExpression {
            selector,
            cases,
            range: cur.range_from(start),
        })))
    })
}

/// `{% package name %}`
pub fn package(cur: &mut Cursor<'_>) -> Outcome<Package> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !open_tag(cur, "package ") {
            return Ok(None);
        }
        let expr = tag_expression(cur, "package", start)?;
        Ok(Some(Package { expr }))
    })
}

/// `{% import "path" %}`
pub fn import(cur: &mut Cursor<'_>) -> Outcome<Import> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !open_tag(cur, "import ") {
            return Ok(None);
        }
        let expr = tag_expression(cur, "import", start)?;
        Ok(Some(Import { expr }))
    })
}

/// `{% templ Name(params) %}` ... `{% endtempl %}`
pub fn template(cur: &mut Cursor<'_>) -> Outcome<Block> {
    attempt(cur, |cur| {
        let start = cur.position();
        for keyword in ["css ", "script "] {
            if open_tag(cur, keyword) {
                return Err(ParseError::new(
                    ErrorKind::LegacyUnsupported,
                    format!("legacy {}: not supported in '{{% %}}' files", keyword.trim()),
                    cur.range_from(start),
                )
                .with_help("rewrite the file in the brace syntax to use css and script blocks"));
            }
        }
        if !open_tag(cur, "templ ") {
            return Ok(None);
        }
        cur.skip_blanks();
        let Some(name) = expression::identifier(cur) else {
            return Err(unfinished(cur, start, "legacy templ: expected template name"));
        };
        let Some(params) = expression::parenthesised(cur) else {
            return Err(unfinished(
                cur,
                start,
                "legacy templ: unterminated parameters (missing closing ')')",
            ));
        };
        cur.skip_blanks();
        if !cur.eat("%}") {
            return Err(unfinished(
                cur,
                start,
                "legacy templ: unterminated (missing closing ' %}')",
            ));
        }
        end_of_line(cur);

        let children = node_list(cur, &|c: &mut Cursor<'_>| tag_ahead(c, &["endtempl"]))?;
        if !closing_tag(cur, "endtempl") {
            return Err(missing_end(cur, "templ", start));
        }
        Ok(Some(Block::Template(TemplateBlock {
            name,
            params,
            children,
            range: cur.range_from(start),
        })))
    })
}
