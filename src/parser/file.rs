//! File-level rules: package, imports and top-level blocks.

use super::combinator::{Outcome, Rule, attempt, first_of, literal, zero_or_more};
use super::control::end_of_line;
use super::cursor::{Cursor, Dialect};
use super::expression::{self, identifier};
use super::legacy;
use super::nodes::{node_list, unfinished};
use super::positions::{Expression, Position};
use crate::ast::{
    Block, CssBlock, CssProperty, CssValue, Import, Package, ScriptBlock, TemplateBlock,
    TemplateFile,
};
use crate::error::{ErrorKind, ParseError};

type BlockRule = fn(&mut Cursor<'_>) -> Outcome<Block>;

/// The file-level rules of one dialect.
struct Grammar {
    package: fn(&mut Cursor<'_>) -> Outcome<Package>,
    imports: fn(&mut Cursor<'_>) -> Outcome<Vec<Import>>,
    blocks: &'static [BlockRule],
}

const BRACE: Grammar = Grammar {
    package,
    imports: import,
    blocks: &[template_block, css_block, script_block],
};

const LEGACY: Grammar = Grammar {
    package: legacy::package,
    imports: legacy_import,
    blocks: &[legacy::template],
};

/// Files whose first non-blank text is `{%` are in the legacy dialect.
pub fn detect_dialect(source: &str) -> Dialect {
    if source.trim_start().starts_with("{%") {
        Dialect::Legacy
    } else {
        Dialect::Brace
    }
}

/// Parse a whole file. `default_package` names the package when the file
/// does not declare one.
pub fn template_file(source: &str, default_package: &str) -> Result<TemplateFile, ParseError> {
    let dialect = detect_dialect(source);
    let mut cur = Cursor::with_dialect(source, dialect);
    let grammar = match dialect {
        Dialect::Brace => &BRACE,
        Dialect::Legacy => &LEGACY,
    };

    cur.skip_whitespace();
    let package = match (grammar.package)(&mut cur).into_result()? {
        Some(p) => p,
        None => Package { expr: Expression::synthetic(default_package) },
    };

    let mut imports = Vec::new();
    loop {
        cur.skip_whitespace();
        match (grammar.imports)(&mut cur).into_result()? {
            Some(group) => imports.extend(group),
            None => break,
        }
    }

    let mut parsed = Vec::new();
    loop {
        cur.skip_whitespace();
        if cur.at_eof() {
            break;
        }
        match first_of(grammar.blocks).parse(&mut cur) {
            Outcome::Matched(block) => parsed.push(block),
            Outcome::Malformed(e) => return Err(e),
            Outcome::NotApplicable => return Err(unexpected_content(&mut cur, dialect)),
        }
    }

    Ok(TemplateFile { package, imports, blocks: parsed })
}

fn unexpected_content(cur: &mut Cursor<'_>, dialect: Dialect) -> ParseError {
    let start = cur.position();
    cur.eat_while(|c| c != '\n');
    let expected = match dialect {
        Dialect::Brace => "'templ', 'css' or 'script'",
        Dialect::Legacy => "'{% templ %}'",
    };
    ParseError::new(
        ErrorKind::UnexpectedContent,
        format!("unexpected content (expected {expected})"),
        cur.range_from(start),
    )
}

/// `package name`
pub fn package(cur: &mut Cursor<'_>) -> Outcome<Package> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !cur.eat("package ") {
            return Ok(None);
        }
        cur.skip_blanks();
        let Some(expr) = identifier(cur) else {
            return Err(unfinished(
                cur,
                start,
                "package: missing name (expected identifier before end of line)",
            ));
        };
        if !cur.at_line_end() {
            return Err(unfinished(
                cur,
                start,
                "package: unexpected text after identifier (expected end of line)",
            ));
        }
        end_of_line(cur);
        Ok(Some(Package { expr }))
    })
}

/// One import path with an optional alias, trimmed, from the rest of the line.
fn import_spec(cur: &mut Cursor<'_>) -> Option<Expression> {
    cur.skip_blanks();
    let from = cur.position();
    let mut end = cur.mark();
    while let Some(c) = cur.peek() {
        if c == '\n' || (c == ')' && cur.dialect() == Dialect::Brace) {
            break;
        }
        cur.advance();
        if !c.is_whitespace() {
            end = cur.mark();
        }
    }
    cur.reset(end);
    let text = cur.slice_from(from);
    (!text.is_empty()).then(|| Expression::new(text, cur.range_from(from)))
}

/// `import "path"` or a parenthesised group of them
pub fn import(cur: &mut Cursor<'_>) -> Outcome<Vec<Import>> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !cur.eat("import") || !cur.peek().is_some_and(|c| c == ' ' || c == '(') {
            return Ok(None);
        }
        cur.skip_blanks();

        if !cur.eat("(") {
            let Some(expr) = import_spec(cur) else {
                return Err(unfinished(cur, start, "import: missing path (expected a quoted path)"));
            };
            end_of_line(cur);
            return Ok(Some(vec![Import { expr }]));
        }

        let mut imports = Vec::new();
        loop {
            cur.skip_whitespace();
            if cur.eat(")") {
                break;
            }
            if cur.at_eof() {
                return Err(unfinished(
                    cur,
                    start,
                    "import: unterminated (missing closing ')')",
                ));
            }
            if let Some(expr) = import_spec(cur) {
                imports.push(Import { expr });
            }
        }
        end_of_line(cur);
        Ok(Some(imports))
    })
}

fn legacy_import(cur: &mut Cursor<'_>) -> Outcome<Vec<Import>> {
    legacy::import(cur).map(|i| vec![i])
}

/// `Name(params) {` at the end of a line, shared by all brace blocks.
fn block_signature(
    cur: &mut Cursor<'_>,
    construct: &str,
    start: Position,
) -> Result<(Expression, Expression), ParseError> {
    cur.skip_blanks();
    let Some(name) = identifier(cur) else {
        return Err(unfinished(cur, start, format!("{construct}: expected name")));
    };
    let Some(params) = expression::parenthesised(cur) else {
        return Err(unfinished(
            cur,
            start,
            format!("{construct}: unterminated parameters (missing closing ')')"),
        ));
    };
    cur.skip_blanks();
    if !cur.eat("{") || !cur.at_line_end() {
        return Err(unfinished(
            cur,
            start,
            format!("{construct}: malformed header (expected '{construct} {}() {{')", name.text),
        ));
    }
    end_of_line(cur);
    Ok((name, params))
}

/// `templ Name(params) {` ... `}`
pub fn template_block(cur: &mut Cursor<'_>) -> Outcome<Block> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !cur.eat("templ ") {
            return Ok(None);
        }
        let (name, params) = block_signature(cur, "templ", start)?;
        let children = node_list(cur, &literal("}"))?;
        if !cur.eat("}") {
            return Err(unfinished(cur, start, "templ: missing end (expected '}')"));
        }
        Ok(Some(Block::Template(TemplateBlock {
            name,
            params,
            children,
            range: cur.range_from(start),
        })))
    })
}

/// `name: value;` or `name: { expr };`
fn css_property(cur: &mut Cursor<'_>) -> Outcome<CssProperty> {
    attempt(cur, |cur| {
        let start = cur.position();
        let name = cur.eat_while(|c| c != ':' && c != '\n' && c != '}' && c != ';').trim();
        if name.is_empty() || !cur.eat(":") {
            return Ok(None);
        }
        let name = name.to_string();
        cur.skip_blanks();

        let value = if cur.eat("{") {
            let Some(expr) = expression::until_closing_brace(cur) else {
                return Err(unfinished(
                    cur,
                    start,
                    format!("css property {name}: unterminated expression (missing closing '}}')"),
                ));
            };
            cur.eat("}");
            cur.skip_blanks();
            CssValue::Expression(expr)
        } else {
            let value = cur.eat_while(|c| c != ';' && c != '\n').trim();
            CssValue::Constant(value.to_string())
        };

        if !cur.eat(";") {
            return Err(unfinished(
                cur,
                start,
                format!("css property {name}: missing ';'"),
            ));
        }
        let range = cur.range_from(start);
        end_of_line(cur);
        Ok(Some(CssProperty { name, value, range }))
    })
}

fn css_properties(cur: &mut Cursor<'_>) -> Outcome<Vec<CssProperty>> {
    zero_or_more(|cur: &mut Cursor<'_>| {
        cur.skip_whitespace();
        css_property(cur)
    })
    .parse(cur)
}

/// `css Name(params) {` property lines `}`
pub fn css_block(cur: &mut Cursor<'_>) -> Outcome<Block> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !cur.eat("css ") {
            return Ok(None);
        }
        let (name, params) = block_signature(cur, "css", start)?;
        let properties = css_properties(cur).into_result()?.unwrap_or_default();
        cur.skip_whitespace();
        if !cur.eat("}") {
            return Err(unfinished(cur, start, "css: missing end (expected '}')"));
        }
        Ok(Some(Block::Css(CssBlock {
            name,
            params,
            properties,
            range: cur.range_from(start),
        })))
    })
}

/// `script Name(params) {` JavaScript `}`
pub fn script_block(cur: &mut Cursor<'_>) -> Outcome<Block> {
    attempt(cur, |cur| {
        let start = cur.position();
        if !cur.eat("script ") {
            return Ok(None);
        }
        let (name, params) = block_signature(cur, "script", start)?;
        let Some(body) = expression::until_closing_brace(cur) else {
            return Err(unfinished(cur, start, "script: missing end (expected '}')"));
        };
        cur.eat("}");
        Ok(Some(Block::Script(ScriptBlock {
            name,
            params,
            body,
            range: cur.range_from(start),
        })))
    })
}
