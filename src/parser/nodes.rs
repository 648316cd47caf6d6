//! The node-list rule shared by every block, plus the inline rules: text,
//! whitespace, `{ expr }`, `{ children... }`, calls and Go comments.

use super::combinator::{
    Outcome, Rule, attempt, first_of, literal, one_or_more, optional, peek, rune_where,
    sequence, until, whitespace,
};
use super::cursor::{Cursor, Dialect};
use super::expression::{self, is_ident_continue, is_ident_start};
use super::positions::{Expression, Position, Range};
use super::{control, element, legacy};
use crate::ast::{
    CallExpression, ChildrenExpression, GoCommentNode, Node, StringExpression, TextNode,
    WhitespaceNode,
};
use crate::error::{ErrorKind, ParseError};

type NodeRule = fn(&mut Cursor<'_>) -> Outcome<Node>;

const BRACE_NODES: &[NodeRule] = &[
    element::doctype,
    element::comment,
    element::raw_element,
    element::element,
    control::if_expression,
    control::for_expression,
    control::switch_expression,
    call_expression,
    legacy_call_expression,
    children_expression,
    string_expression,
    go_comment,
    text,
    whitespace_node,
];

const LEGACY_NODES: &[NodeRule] = &[
    element::doctype,
    element::comment,
    element::raw_element,
    element::element,
    legacy::if_expression,
    legacy::for_expression,
    legacy::switch_expression,
    legacy::call_expression,
    legacy::string_expression,
    legacy::text,
    whitespace_node,
];

/// Any single template node, in the cursor's dialect.
pub fn node(cur: &mut Cursor<'_>) -> Outcome<Node> {
    match cur.dialect() {
        Dialect::Brace => first_of(BRACE_NODES).parse(cur),
        Dialect::Legacy => first_of(LEGACY_NODES).parse(cur),
    }
}

/// Parse nodes until `until` matches or nothing applies. The terminator is
/// left for the caller to consume, and so is reporting it missing.
pub fn node_list<T, R: Rule<T>>(cur: &mut Cursor<'_>, until: &R) -> Result<Vec<Node>, ParseError> {
    let mut nodes = Vec::new();
    loop {
        match peek(until).parse(cur) {
            Outcome::Matched(_) => break,
            Outcome::Malformed(e) => return Err(e),
            Outcome::NotApplicable => {}
        }
        match node(cur) {
            Outcome::Matched(n) => nodes.push(n),
            Outcome::NotApplicable => break,
            Outcome::Malformed(e) => return Err(e),
        }
    }
    Ok(nodes)
}

/// An error for a construct that started at `start` and could not be
/// finished at the current position.
pub fn unfinished(cur: &Cursor<'_>, start: Position, message: impl Into<String>) -> ParseError {
    let kind = if cur.at_eof() {
        ErrorKind::UnexpectedEof
    } else {
        ErrorKind::Malformed
    };
    ParseError::new(kind, message, cur.range_from(start))
}

pub fn whitespace_node(cur: &mut Cursor<'_>) -> Outcome<Node> {
    whitespace(cur).map(|ws| Node::Whitespace(WhitespaceNode { text: ws.text, range: ws.range }))
}

/// Whether a `<` at the start of `rest` opens markup rather than being text.
pub(super) fn opens_tag(rest: &str) -> bool {
    let mut chars = rest.chars();
    chars.next() == Some('<')
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!')
}

/// A run of text up to a tag, a brace or the end of the line. Trailing
/// blanks are left for the whitespace rule.
pub fn text(cur: &mut Cursor<'_>) -> Outcome<Node> {
    text_until(cur, |rest| {
        opens_tag(rest) || rest.starts_with('{') || rest.starts_with('}')
    })
}

pub(super) fn text_until(cur: &mut Cursor<'_>, stop: impl Fn(&str) -> bool) -> Outcome<Node> {
    if cur.peek().is_none_or(char::is_whitespace) {
        return Outcome::NotApplicable;
    }
    let from = cur.position();
    let mut end = cur.mark();
    while let Some(c) = cur.peek() {
        if c == '\n' || stop(cur.rest()) {
            break;
        }
        cur.advance();
        if c != ' ' && c != '\t' && c != '\r' {
            end = cur.mark();
        }
    }
    // Give the trailing blanks back.
    cur.reset(end);
    let text = cur.slice_from(from);
    if text.is_empty() {
        return Outcome::NotApplicable;
    }
    Outcome::Matched(Node::Text(TextNode {
        text: text.to_string(),
        range: Range::new(from, cur.position()),
    }))
}

/// `{ expr }`
pub fn string_expression(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        if cur.starts_with("{!") || !cur.eat("{") {
            return Ok(None);
        }
        let Some(expr) = expression::until_closing_brace(cur) else {
            return Err(unfinished(
                cur,
                start,
                "string expression: unterminated (missing closing '}')",
            ));
        };
        cur.eat("}");
        Ok(Some(Node::StringExpression(StringExpression {
            expr,
            range: cur.range_from(start),
        })))
    })
}

/// `{ children... }`
pub fn children_expression(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !cur.eat("{") {
            return Ok(None);
        }
        cur.skip_blanks();
        if !cur.eat("children...") {
            return Ok(None);
        }
        cur.skip_blanks();
        if !cur.eat("}") {
            return Ok(None);
        }
        Ok(Some(Node::Children(ChildrenExpression {
            range: cur.range_from(start),
        })))
    })
}

/// `// text` to the end of the line, or `/* text */`
pub fn go_comment(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        if cur.eat("//") {
            let text = cur.eat_while(|c| c != '\n').trim_end().to_string();
            return Ok(Some(Node::GoComment(GoCommentNode {
                text,
                multiline: false,
                range: cur.range_from(start),
            })));
        }
        if !cur.eat("/*") {
            return Ok(None);
        }
        let Some(body) = until(literal("*/")).parse(cur).into_result()? else {
            return Err(unfinished(
                cur,
                start,
                "go comment: unterminated (missing closing '*/')",
            ));
        };
        cur.eat("*/");
        Ok(Some(Node::GoComment(GoCommentNode {
            text: body.text,
            multiline: true,
            range: cur.range_from(start),
        })))
    })
}

/// `@Name(args)` or `@pkg.Name(args)`
pub fn call_expression(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !cur.eat("@") {
            return Ok(None);
        }
        let from = cur.position();
        let name = sequence((
            rune_where(is_ident_start),
            optional(one_or_more(rune_where(|c| is_ident_continue(c) || c == '.'))),
        ));
        if name.parse(cur).into_result()?.is_none() {
            return Ok(None);
        }
        if cur.peek() == Some('(') && expression::parenthesised(cur).is_none() {
            return Err(unfinished(
                cur,
                start,
                "call: unterminated (missing closing ')')",
            ));
        }
        let expr = Expression::new(cur.slice_from(from), cur.range_from(from));
        Ok(Some(Node::Call(CallExpression {
            expr,
            legacy: false,
            range: cur.range_from(start),
        })))
    })
}

/// `{! expr }`, the older call syntax
pub fn legacy_call_expression(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        if literal("{!").parse(cur).into_result()?.is_none() {
            return Ok(None);
        }
        let Some(expr) = expression::until_closing_brace(cur) else {
            return Err(unfinished(cur, start, "call: unterminated (missing closing '}')"));
        };
        cur.eat("}");
        Ok(Some(Node::Call(CallExpression {
            expr,
            legacy: true,
            range: cur.range_from(start),
        })))
    })
}
