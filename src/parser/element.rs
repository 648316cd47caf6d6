//! Markup: elements and their attributes, raw `<script>`/`<style>`
//! elements, HTML comments and the doctype.

use super::combinator::{Outcome, Rule, attempt, first_of, literal, until};
use super::cursor::{Cursor, Dialect};
use super::expression;
use super::legacy;
use super::nodes::{node_list, unfinished};
use super::positions::{Expression, Position, Range};
use crate::ast::{
    Attribute, AttributeKind, CommentNode, DocTypeNode, Element, Node, RawElement,
};
use crate::error::ParseError;
use crate::html::{is_raw_text_element, is_void_element};

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
}

fn is_attribute_name_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\'' | '{' | '}' | '?' | '<')
}

/// `<name` with the cursor left after the name.
fn open_tag_name<'a>(cur: &mut Cursor<'a>) -> Option<&'a str> {
    let mark = cur.mark();
    if !cur.eat("<") || !cur.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
        cur.reset(mark);
        return None;
    }
    Some(cur.eat_while(is_name_char))
}

/// Attributes up to `>` or `/>`. Returns the attributes and whether the tag
/// closed itself.
fn attributes(
    cur: &mut Cursor<'_>,
    tag: &str,
    start: Position,
) -> Result<(Vec<Attribute>, bool), ParseError> {
    let mut attrs = Vec::new();
    loop {
        cur.skip_whitespace();
        if cur.eat("/>") {
            return Ok((attrs, true));
        }
        if cur.eat(">") {
            return Ok((attrs, false));
        }
        if cur.at_eof() {
            return Err(unfinished(
                cur,
                start,
                format!("<{tag}>: unterminated open tag (expected '>')"),
            ));
        }
        match attribute_item(cur) {
            Outcome::Matched(a) => attrs.push(a),
            Outcome::Malformed(e) => return Err(e),
            Outcome::NotApplicable => {
                return Err(unfinished(
                    cur,
                    start,
                    format!("<{tag}>: malformed open element (expected attribute, '>' or '/>')"),
                ));
            }
        }
    }
}

type AttributeRule = fn(&mut Cursor<'_>) -> Outcome<Attribute>;

const BRACE_ATTRIBUTES: &[AttributeRule] = &[conditional_attribute, spread_attribute, attribute];

/// One entry of an open tag. Spread and conditional attributes exist only in
/// the brace dialect.
fn attribute_item(cur: &mut Cursor<'_>) -> Outcome<Attribute> {
    match cur.dialect() {
        Dialect::Brace => first_of(BRACE_ATTRIBUTES).parse(cur),
        Dialect::Legacy => attribute(cur),
    }
}

/// `{ attrs... }`
pub fn spread_attribute(cur: &mut Cursor<'_>) -> Outcome<Attribute> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !cur.eat("{") {
            return Ok(None);
        }
        let Some(expr) = expression::until_closing_brace(cur) else {
            return Err(unfinished(
                cur,
                start,
                "spread attributes: unterminated (missing closing '}')",
            ));
        };
        let Some(text) = expr.text.strip_suffix("...").map(str::trim_end) else {
            return Err(unfinished(
                cur,
                start,
                "spread attributes: missing '...' (expected '{ attrs... }')",
            ));
        };
        cur.eat("}");
        let mut to = expr.range.from;
        text.chars().for_each(|c| to.advance(c));
        Ok(Some(Attribute {
            kind: AttributeKind::Spread {
                expr: Expression::new(text, Range::new(expr.range.from, to)),
            },
            range: cur.range_from(start),
        }))
    })
}

/// `if cond { attrs }` with an optional `else { attrs }`
pub fn conditional_attribute(cur: &mut Cursor<'_>) -> Outcome<Attribute> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !cur.eat("if ") {
            return Ok(None);
        }
        let Some(cond) = expression::until_open_brace(cur) else {
            return Ok(None);
        };
        if cond.text.is_empty() {
            return Ok(None);
        }
        cur.eat("{");
        let then = attribute_block(cur, start)?;

        let mark = cur.mark();
        cur.skip_whitespace();
        let has_else = cur.eat("else") && {
            cur.skip_whitespace();
            cur.eat("{")
        };
        let else_ = if has_else {
            Some(attribute_block(cur, start)?)
        } else {
            cur.reset(mark);
            None
        };

        Ok(Some(Attribute {
            kind: AttributeKind::Conditional { cond, then, else_ },
            range: cur.range_from(start),
        }))
    })
}

/// Attributes up to and including the `}` that closes a conditional branch.
fn attribute_block(cur: &mut Cursor<'_>, start: Position) -> Result<Vec<Attribute>, ParseError> {
    let mut attrs = Vec::new();
    loop {
        cur.skip_whitespace();
        if cur.eat("}") {
            break;
        }
        if cur.at_eof() {
            return Err(unfinished(cur, start, "attribute if: missing end (expected '}')"));
        }
        match attribute_item(cur) {
            Outcome::Matched(a) => attrs.push(a),
            Outcome::Malformed(e) => return Err(e),
            Outcome::NotApplicable => {
                return Err(unfinished(
                    cur,
                    start,
                    "attribute if: malformed attribute (expected attribute or '}')",
                ));
            }
        }
    }
    if attrs.is_empty() {
        return Err(unfinished(
            cur,
            start,
            "attribute if: empty block (expected attribute before '}')",
        ));
    }
    Ok(attrs)
}

/// `{ expr }` in the brace dialect, `{%= expr %}` in the legacy one.
fn attribute_expression(
    cur: &mut Cursor<'_>,
    name: &str,
    start: Position,
) -> Result<Option<Expression>, ParseError> {
    match cur.dialect() {
        Dialect::Brace => {
            if !cur.eat("{") {
                return Ok(None);
            }
            let Some(expr) = expression::until_closing_brace(cur) else {
                return Err(unfinished(
                    cur,
                    start,
                    format!("{name}: unterminated attribute expression (missing closing '}}')"),
                ));
            };
            cur.eat("}");
            Ok(Some(expr))
        }
        Dialect::Legacy => {
            if !cur.eat("{%=") {
                return Ok(None);
            }
            legacy::tag_expression(cur, name, start).map(Some)
        }
    }
}

pub fn attribute(cur: &mut Cursor<'_>) -> Outcome<Attribute> {
    attempt(cur, |cur| {
        let start = cur.position();
        let name = cur.eat_while(is_attribute_name_char).to_string();
        if name.is_empty() {
            return Ok(None);
        }

        let kind = if cur.eat("?=") {
            let Some(expr) = attribute_expression(cur, &name, start)? else {
                return Err(unfinished(
                    cur,
                    start,
                    format!("{name}: missing boolean expression (expected an expression after '?=')"),
                ));
            };
            AttributeKind::BoolExpression { name, expr }
        } else if cur.eat("=") {
            if let Some(expr) = attribute_expression(cur, &name, start)? {
                AttributeKind::Expression { name, expr }
            } else if let Some(quote) = cur.peek().filter(|c| *c == '"' || *c == '\'') {
                cur.advance();
                let value = cur.eat_while(|c| c != quote).to_string();
                if !cur.eat(&quote.to_string()) {
                    return Err(unfinished(
                        cur,
                        start,
                        format!("{name}: unterminated attribute value (missing closing {quote})"),
                    ));
                }
                AttributeKind::Constant {
                    name,
                    value,
                    single_quote: quote == '\'',
                }
            } else {
                let from = cur.position();
                while let Some(c) = cur.peek() {
                    if c.is_whitespace() || matches!(c, '>' | '"' | '\'') || cur.starts_with("/>") {
                        break;
                    }
                    cur.advance();
                }
                let value = cur.slice_from(from).to_string();
                if value.is_empty() {
                    return Err(unfinished(
                        cur,
                        start,
                        format!("{name}: missing attribute value (expected a value after '=')"),
                    ));
                }
                AttributeKind::Constant {
                    name,
                    value,
                    single_quote: false,
                }
            }
        } else {
            AttributeKind::Bool { name }
        };

        Ok(Some(Attribute {
            kind,
            range: cur.range_from(start),
        }))
    })
}

/// `</name>` with optional whitespace before `>`.
fn close_tag(cur: &mut Cursor<'_>, name: &str) -> bool {
    let mark = cur.mark();
    if cur.eat("</") && cur.eat(name) {
        cur.skip_whitespace();
        if cur.eat(">") {
            return true;
        }
    }
    cur.reset(mark);
    false
}

/// `<div class="x">children</div>`, `<br>` or `<span/>`
pub fn element(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        let name_from = Position { offset: start.offset + 1, column: start.column + 1, ..start };
        let Some(name) = open_tag_name(cur) else {
            return Ok(None);
        };
        let name = name.to_string();
        let name_range = cur.range_from(name_from);

        let (attributes, self_closing) = attributes(cur, &name, start)?;

        let mut children = Vec::new();
        if !self_closing {
            if is_void_element(&name) {
                children = void_children(cur, &name);
            } else {
                children = node_list(cur, &literal("</"))?;
                if !close_tag(cur, &name) {
                    return Err(missing_end_tag(cur, &name, start));
                }
            }
        }

        Ok(Some(Node::Element(Element {
            name,
            name_range,
            attributes,
            children,
            range: cur.range_from(start),
        })))
    })
}

/// Content between `<br>` and a matching `</br>`. Without that end tag
/// nothing after the open tag belongs to the element.
fn void_children(cur: &mut Cursor<'_>, name: &str) -> Vec<Node> {
    let mark = cur.mark();
    if let Ok(children) = node_list(cur, &literal("</")) {
        if close_tag(cur, name) {
            return children;
        }
    }
    cur.reset(mark);
    Vec::new()
}

fn missing_end_tag(cur: &Cursor<'_>, name: &str, start: Position) -> ParseError {
    if cur.starts_with("</") {
        let found: String = cur.rest()[2..].chars().take_while(|c| *c != '>').collect();
        return unfinished(
            cur,
            start,
            format!("<{name}>: mismatched end tag (expected '</{name}>', found '</{}>')", found.trim()),
        );
    }
    unfinished(cur, start, format!("<{name}>: missing end tag (expected '</{name}>')"))
}

/// `<script>` and `<style>`: the contents are kept as written.
pub fn raw_element(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        let Some(name) = open_tag_name(cur) else {
            return Ok(None);
        };
        if !is_raw_text_element(name) {
            return Ok(None);
        }
        let name = name.to_string();
        let (attributes, self_closing) = attributes(cur, &name, start)?;

        let mut contents = String::new();
        if !self_closing {
            let end_tag = format!("</{name}>");
            let terminator = |c: &mut Cursor<'_>| {
                if c.eat(&end_tag) { Outcome::Matched(()) } else { Outcome::NotApplicable }
            };
            match until(terminator).parse(cur) {
                Outcome::Matched(body) => contents = body.text,
                Outcome::Malformed(e) => return Err(e),
                Outcome::NotApplicable => {
                    return Err(unfinished(
                        cur,
                        start,
                        format!("<{name}>: missing end tag (expected '{end_tag}')"),
                    ));
                }
            }
            cur.eat(&end_tag);
        }

        Ok(Some(Node::RawElement(RawElement {
            name,
            attributes,
            contents,
            range: cur.range_from(start),
        })))
    })
}

/// `<!DOCTYPE html>`, in any letter case
pub fn doctype(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        let prefix = cur.rest().get(..9);
        if !prefix.is_some_and(|p| p.eq_ignore_ascii_case("<!doctype")) {
            return Ok(None);
        }
        cur.eat(&cur.rest()[..9]);
        let text = cur.eat_while(|c| c != '>' && c != '<').trim().to_string();
        if !cur.eat(">") {
            return Err(unfinished(
                cur,
                start,
                "doctype: unterminated (missing closing '>')",
            ));
        }
        Ok(Some(Node::DocType(DocTypeNode {
            text,
            range: cur.range_from(start),
        })))
    })
}

/// `<!-- ... -->`
pub fn comment(cur: &mut Cursor<'_>) -> Outcome<Node> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !cur.eat("<!--") {
            return Ok(None);
        }
        let Some(body) = until(literal("-->")).parse(cur).into_result()? else {
            return Err(unfinished(
                cur,
                start,
                "comment: unterminated (missing closing '-->')",
            ));
        };
        cur.eat("-->");
        Ok(Some(Node::Comment(CommentNode {
            text: body.text,
            range: cur.range_from(start),
        })))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn parse_element(src: &str) -> Element {
        let mut cur = Cursor::new(src);
        match element(&mut cur) {
            Outcome::Matched(Node::Element(e)) => e,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_element_with_children() {
        let e = parse_element("<div>{ item }</div>");
        assert_eq!(e.name, "div");
        assert_eq!(e.children.len(), 1);
        assert!(matches!(e.children[0], Node::StringExpression(_)));
    }

    #[test]
    fn test_element_name_range() {
        let src = "<span>x</span>";
        let e = parse_element(src);
        assert_eq!(e.name_range.slice(src), Some("span"));
        assert_eq!(e.range.slice(src), Some(src));
    }

    #[test]
    fn test_attribute_kinds() {
        let e = parse_element(r#"<input type="text" value='a"b' disabled checked?={ on } name={ n } size=3/>"#);
        let kinds: Vec<_> = e.attributes.iter().map(|a| &a.kind).collect();
        assert!(matches!(kinds[0], AttributeKind::Constant { name, value, single_quote: false } if name == "type" && value == "text"));
        assert!(matches!(kinds[1], AttributeKind::Constant { single_quote: true, .. }));
        assert!(matches!(kinds[2], AttributeKind::Bool { name } if name == "disabled"));
        assert!(matches!(kinds[3], AttributeKind::BoolExpression { expr, .. } if expr.text == "on"));
        assert!(matches!(kinds[4], AttributeKind::Expression { expr, .. } if expr.text == "n"));
        assert!(matches!(kinds[5], AttributeKind::Constant { value, .. } if value == "3"));
    }

    #[test]
    fn test_void_element_needs_no_end_tag() {
        let e = parse_element("<br>text");
        assert!(e.children.is_empty());
        let e = parse_element("<img src=\"a.png\"></img>");
        assert_eq!(e.range.to.offset, 23);
    }

    #[test]
    fn test_void_element_with_end_tag_keeps_children() {
        let e = parse_element("<br>x</br>");
        assert_eq!(e.children.len(), 1);
        assert_eq!(e.range.to.offset, 10);

        let mut cur = Cursor::new("<div><br>x</div>");
        let Outcome::Matched(Node::Element(div)) = element(&mut cur) else {
            panic!("expected element");
        };
        let Node::Element(br) = &div.children[0] else {
            panic!("expected br");
        };
        assert!(br.children.is_empty());
        assert_eq!(div.children.len(), 2);
    }

    #[test]
    fn test_spread_attributes() {
        let src = "<a { attrs... } href=\"/\"></a>";
        let e = parse_element(src);
        let AttributeKind::Spread { expr } = &e.attributes[0].kind else {
            panic!("expected spread");
        };
        assert_eq!(expr.text, "attrs");
        assert_eq!(expr.range.slice(src), Some("attrs"));
        assert_eq!(e.attributes[1].name(), Some("href"));

        let mut cur = Cursor::new("<a { attrs }>");
        let Outcome::Malformed(err) = element(&mut cur) else {
            panic!("expected error");
        };
        assert_eq!(err.message, "spread attributes: missing '...' (expected '{ attrs... }')");
    }

    #[test]
    fn test_conditional_attributes() {
        let src = "<div if p.Primary { class=\"primary\" data-x } else { class=\"plain\" } id=\"d\"></div>";
        let e = parse_element(src);
        assert_eq!(e.attributes.len(), 2);
        let AttributeKind::Conditional { cond, then, else_ } = &e.attributes[0].kind else {
            panic!("expected conditional");
        };
        assert_eq!(cond.text, "p.Primary");
        assert_eq!(cond.range.slice(src), Some("p.Primary"));
        assert_eq!(then.len(), 2);
        assert_eq!(else_.as_ref().map(Vec::len), Some(1));
        assert_eq!(e.attributes[0].name(), None);
        assert_eq!(e.attributes[1].name(), Some("id"));
    }

    #[test]
    fn test_conditional_attribute_errors() {
        let mut cur = Cursor::new("<div if ok { }>");
        let Outcome::Malformed(e) = element(&mut cur) else {
            panic!("expected error");
        };
        assert_eq!(e.message, "attribute if: empty block (expected attribute before '}')");
        assert_eq!(e.range.from.offset, 5);

        let mut cur = Cursor::new("<div if ok { class=\"a\"");
        let Outcome::Malformed(e) = element(&mut cur) else {
            panic!("expected error");
        };
        assert_eq!(e.message, "attribute if: missing end (expected '}')");
    }

    #[test]
    fn test_missing_end_tag() {
        let mut cur = Cursor::new("<div><span></span>");
        let Outcome::Malformed(e) = element(&mut cur) else {
            panic!("expected error");
        };
        assert_eq!(e.message, "<div>: missing end tag (expected '</div>')");
        assert_eq!(e.kind, ErrorKind::UnexpectedEof);
        assert_eq!(e.range.from.offset, 0);
    }

    #[test]
    fn test_malformed_open_element_names_terminator() {
        let mut cur = Cursor::new("<div \"x\">");
        let Outcome::Malformed(e) = element(&mut cur) else {
            panic!("expected error");
        };
        assert_eq!(e.message, "<div>: malformed open element (expected attribute, '>' or '/>')");
    }

    #[test]
    fn test_mismatched_end_tag() {
        let mut cur = Cursor::new("<div></span>");
        let Outcome::Malformed(e) = element(&mut cur) else {
            panic!("expected error");
        };
        assert!(e.message.contains("found '</span>'"));
    }

    #[test]
    fn test_raw_element_keeps_contents() {
        let mut cur = Cursor::new("<script type=\"module\">if (a < b) { go() }</script>");
        let Outcome::Matched(Node::RawElement(r)) = raw_element(&mut cur) else {
            panic!("expected raw element");
        };
        assert_eq!(r.contents, "if (a < b) { go() }");
        assert_eq!(r.attributes.len(), 1);
        assert!(cur.at_eof());
    }

    #[test]
    fn test_doctype_and_comment() {
        let mut cur = Cursor::new("<!doctype html>");
        let Outcome::Matched(Node::DocType(d)) = doctype(&mut cur) else {
            panic!("expected doctype");
        };
        assert_eq!(d.text, "html");

        let mut cur = Cursor::new("<!-- note -->");
        let Outcome::Matched(Node::Comment(c)) = comment(&mut cur) else {
            panic!("expected comment");
        };
        assert_eq!(c.text, " note ");

        let mut cur = Cursor::new("<!-- note");
        assert!(matches!(comment(&mut cur), Outcome::Malformed(_)));
    }
}
