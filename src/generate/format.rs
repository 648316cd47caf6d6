//! Canonical re-serialisation of a parsed file.
//!
//! Output always uses the brace syntax with tab indentation, so formatting a
//! `{% %}` file migrates it. Formatting is idempotent: parsing the output and
//! formatting again yields the same text.
//!
//! Layout rules for children:
//! - An element with only whitespace children is written as `<p></p>`.
//! - A void element without children is written self-closing, `<br/>`.
//! - An element with a block-level child writes its children on their own
//!   indented lines. Otherwise everything stays on one line and runs of
//!   whitespace become a single space.
//! - Template and control-flow bodies are always laid out line by line.
//!   Inline siblings that shared a source line stay on one line.
//!
//! Text that the brace grammar would read as syntax is written as a string
//! expression, e.g. `{ "{" }` or `{ "if" }`. Legacy text may hold braces or
//! start with a keyword or a comment opener; brace text can only start with
//! `case` or `default`.

use super::{GenerateResult, Generator, RangeWriter};
use crate::ast::*;
use crate::html;
use crate::parser::expression::{is_ident_continue, is_ident_start};

/// Words that open a construct when a node starts with them.
const KEYWORDS: [&str; 5] = ["if", "for", "switch", "case", "default"];

/// The prefix of `rest` that would parse as syntax at the start of a node.
fn reserved_prefix(rest: &str) -> Option<&'static str> {
    if let Some(opener) = ["//", "/*"].into_iter().find(|o| rest.starts_with(o)) {
        return Some(opener);
    }
    if let Some(after) = rest.strip_prefix('@') {
        return after.starts_with(is_ident_start).then_some("@");
    }
    KEYWORDS.into_iter().find(|word| {
        rest.strip_prefix(word).is_some_and(|after| match *word {
            "default" => !after.starts_with(is_ident_continue),
            _ => after.is_empty() || after.starts_with([' ', '\t']),
        })
    })
}

/// Range of `text[from..to]` inside a single-line text node at `range`.
fn sub_range(text: &str, range: Range, from: usize, to: usize) -> Range {
    let at = |i: usize| {
        Position::new(
            range.from.offset + i,
            range.from.line,
            range.from.column + text[..i].chars().count(),
        )
    };
    Range::new(at(from), at(to))
}

pub struct Formatter;

impl Formatter {
    pub fn new() -> Self {
        Self
    }

    fn indent(&self, output: &mut RangeWriter, indent: usize) {
        for _ in 0..indent {
            output.write("\t");
        }
    }

    /// Write an expression, mapping it unless it has no place in the source
    fn emit_expression(&self, expr: &Expression, output: &mut RangeWriter) {
        if expr.range.is_empty() {
            output.write(&expr.text);
        } else {
            output.write_expression(expr);
        }
    }

    fn emit_file(&self, file: &TemplateFile, output: &mut RangeWriter) {
        output.write("package ");
        self.emit_expression(&file.package.expr, output);
        output.newline();

        match file.imports.as_slice() {
            [] => {}
            [single] => {
                output.newline();
                output.write("import ");
                self.emit_expression(&single.expr, output);
                output.newline();
            }
            group => {
                output.newline();
                output.write("import (\n");
                for import in group {
                    output.write("\t");
                    self.emit_expression(&import.expr, output);
                    output.newline();
                }
                output.write(")\n");
            }
        }

        for block in &file.blocks {
            output.newline();
            match block {
                Block::Template(t) => self.emit_template(t, output),
                Block::Css(c) => self.emit_css(c, output),
                Block::Script(s) => self.emit_script(s, output),
            }
            output.newline();
        }
    }

    fn emit_signature(&self, keyword: &str, name: &Expression, params: &Expression, output: &mut RangeWriter) {
        output.write(keyword);
        output.write(" ");
        self.emit_expression(name, output);
        output.write("(");
        self.emit_expression(params, output);
        output.write(") {\n");
    }

    fn emit_template(&self, block: &TemplateBlock, output: &mut RangeWriter) {
        self.emit_signature("templ", &block.name, &block.params, output);
        self.emit_lines(&block.children, output, 1);
        output.write("}");
    }

    fn emit_css(&self, block: &CssBlock, output: &mut RangeWriter) {
        self.emit_signature("css", &block.name, &block.params, output);
        for property in &block.properties {
            output.write("\t");
            output.write(&property.name);
            output.write(": ");
            match &property.value {
                CssValue::Constant(value) => output.write(value),
                CssValue::Expression(expr) => {
                    output.write("{ ");
                    let range = output.write_expression(expr);
                    output.write(" }");
                    range
                }
            };
            output.write(";\n");
        }
        output.write("}");
    }

    fn emit_script(&self, block: &ScriptBlock, output: &mut RangeWriter) {
        self.emit_signature("script", &block.name, &block.params, output);
        if !block.body.text.is_empty() {
            output.write("\t");
            self.emit_expression(&block.body, output);
            output.newline();
        }
        output.write("}");
    }

    /// Write a body line by line at `indent`. Each block-level node gets a
    /// line of its own; inline nodes are grouped by the source lines they
    /// came from.
    fn emit_lines(&self, nodes: &[Node], output: &mut RangeWriter, indent: usize) {
        let mut line: Vec<&Node> = Vec::new();
        for node in nodes {
            match node {
                Node::Whitespace(ws) if ws.text.contains('\n') => {
                    self.emit_line(&line, output, indent);
                    line.clear();
                }
                Node::Whitespace(_) => {
                    if !line.is_empty() {
                        line.push(node);
                    }
                }
                _ if self.is_block(node) => {
                    self.emit_line(&line, output, indent);
                    line.clear();
                    self.indent(output, indent);
                    self.emit_node(node, output, indent);
                    output.newline();
                }
                _ => line.push(node),
            }
        }
        self.emit_line(&line, output, indent);
    }

    fn emit_line(&self, nodes: &[&Node], output: &mut RangeWriter, indent: usize) {
        let end = nodes.iter().rposition(|n| !n.is_whitespace());
        let Some(end) = end else {
            return;
        };
        self.indent(output, indent);
        self.emit_inline(&nodes[..=end], output);
        output.newline();
    }

    /// Write nodes on the current line. Leading and trailing whitespace is
    /// dropped and the rest collapses to single spaces.
    fn emit_inline(&self, nodes: &[&Node], output: &mut RangeWriter) {
        let mut pending_space = false;
        let mut started = false;
        for node in nodes {
            if node.is_whitespace() {
                pending_space = started;
                continue;
            }
            if pending_space {
                output.write(" ");
                pending_space = false;
            }
            self.emit_node(node, output, 0);
            started = true;
        }
    }

    /// Nodes that never share a line with their siblings
    fn is_block(&self, node: &Node) -> bool {
        match node {
            Node::Element(el) => html::is_block_element(&el.name) || self.has_block_children(&el.children),
            Node::GoComment(comment) => !comment.multiline,
            Node::RawElement(_)
            | Node::DocType(_)
            | Node::Comment(_)
            | Node::If(_)
            | Node::For(_)
            | Node::Switch(_) => true,
            Node::Whitespace(_)
            | Node::Text(_)
            | Node::StringExpression(_)
            | Node::Children(_)
            | Node::Call(_) => false,
        }
    }

    fn has_block_children(&self, children: &[Node]) -> bool {
        children.iter().any(|child| self.is_block(child))
    }

    /// Write one node starting at the current position. Lines after the
    /// first are indented by `indent`.
    fn emit_node(&self, node: &Node, output: &mut RangeWriter, indent: usize) {
        match node {
            Node::Whitespace(_) => {}
            Node::Text(text) => self.emit_text(text, output),
            Node::DocType(doctype) => {
                output.write("<!DOCTYPE ");
                output.write(&doctype.text);
                output.write(">");
            }
            Node::Comment(comment) => {
                output.write("<!--");
                output.write(&comment.text);
                output.write("-->");
            }
            Node::GoComment(comment) if comment.multiline => {
                output.write("/*");
                output.write(&comment.text);
                output.write("*/");
            }
            Node::GoComment(comment) => {
                output.write("//");
                output.write(&comment.text);
            }
            Node::StringExpression(expr) => {
                output.write("{ ");
                self.emit_expression(&expr.expr, output);
                output.write(" }");
            }
            Node::Children(_) => {
                output.write("{ children... }");
            }
            Node::Element(el) => self.emit_element(el, output, indent),
            Node::RawElement(raw) => {
                output.write("<");
                output.write(&raw.name);
                self.emit_attributes(&raw.attributes, output);
                output.write(">");
                output.write(&raw.contents);
                output.write("</");
                output.write(&raw.name);
                output.write(">");
            }
            Node::If(expr) => self.emit_if(expr, output, indent),
            Node::For(expr) => {
                output.write("for ");
                self.emit_expression(&expr.header, output);
                output.write(" {\n");
                self.emit_lines(&expr.children, output, indent + 1);
                self.indent(output, indent);
                output.write("}");
            }
            Node::Switch(expr) => self.emit_switch(expr, output, indent),
            Node::Call(call) => {
                output.write("@");
                self.emit_expression(&call.expr, output);
            }
        }
    }

    /// Copy text through, escaping what would not read back as text.
    fn emit_text(&self, node: &TextNode, output: &mut RangeWriter) {
        let text = node.text.as_str();
        let mut plain = 0;
        let mut i = 0;
        let mut node_start = true;
        while let Some(c) = text[i..].chars().next() {
            if node_start && (c == ' ' || c == '\t') {
                i += 1;
                continue;
            }
            let escaped = match c {
                '{' | '}' => Some(&text[i..i + 1]),
                _ if node_start => reserved_prefix(&text[i..]),
                _ => None,
            };
            node_start = false;
            let Some(escaped) = escaped else {
                i += c.len_utf8();
                continue;
            };
            if plain < i {
                output.write_mapped(&text[plain..i], sub_range(text, node.range, plain, i));
            }
            output.write("{ \"");
            output.write(escaped);
            output.write("\" }");
            i += escaped.len();
            plain = i;
            node_start = true;
        }
        if plain < text.len() {
            output.write_mapped(&text[plain..], sub_range(text, node.range, plain, text.len()));
        }
    }

    fn emit_element(&self, el: &Element, output: &mut RangeWriter, indent: usize) {
        output.write("<");
        output.write_mapped(&el.name, el.name_range);
        self.emit_attributes(&el.attributes, output);

        let only_whitespace = el.children.iter().all(Node::is_whitespace);
        if only_whitespace && html::is_void_element(&el.name) {
            output.write("/>");
            return;
        }
        output.write(">");

        if !only_whitespace {
            if self.has_block_children(&el.children) {
                output.newline();
                self.emit_lines(&el.children, output, indent + 1);
                self.indent(output, indent);
            } else {
                let children: Vec<&Node> = el.children.iter().collect();
                self.emit_inline(&children, output);
            }
        }

        output.write("</");
        output.write(&el.name);
        output.write(">");
    }

    fn emit_attributes(&self, attributes: &[Attribute], output: &mut RangeWriter) {
        for attr in attributes {
            output.write(" ");
            self.emit_attribute(attr, output);
        }
    }

    fn emit_attribute(&self, attr: &Attribute, output: &mut RangeWriter) {
        match &attr.kind {
            AttributeKind::Constant { name, value, single_quote } => {
                let quote = if *single_quote { "'" } else { "\"" };
                output.write(name);
                output.write("=");
                output.write(quote);
                output.write(value);
                output.write(quote);
            }
            AttributeKind::Bool { name } => {
                output.write(name);
            }
            AttributeKind::Expression { name, expr } => {
                output.write(name);
                output.write("={ ");
                self.emit_expression(expr, output);
                output.write(" }");
            }
            AttributeKind::BoolExpression { name, expr } => {
                output.write(name);
                output.write("?={ ");
                self.emit_expression(expr, output);
                output.write(" }");
            }
            AttributeKind::Spread { expr } => {
                output.write("{ ");
                self.emit_expression(expr, output);
                output.write("... }");
            }
            AttributeKind::Conditional { cond, then, else_ } => {
                output.write("if ");
                self.emit_expression(cond, output);
                output.write(" {");
                self.emit_attributes(then, output);
                output.write(" }");
                if let Some(attributes) = else_ {
                    output.write(" else {");
                    self.emit_attributes(attributes, output);
                    output.write(" }");
                }
            }
        }
    }

    fn emit_if(&self, expr: &IfExpression, output: &mut RangeWriter, indent: usize) {
        output.write("if ");
        self.emit_expression(&expr.cond, output);
        output.write(" {\n");
        self.emit_lines(&expr.then, output, indent + 1);

        for branch in &expr.else_ifs {
            self.indent(output, indent);
            output.write("} else if ");
            self.emit_expression(&branch.cond, output);
            output.write(" {\n");
            self.emit_lines(&branch.then, output, indent + 1);
        }

        if let Some(children) = &expr.else_ {
            self.indent(output, indent);
            output.write("} else {\n");
            self.emit_lines(children, output, indent + 1);
        }

        self.indent(output, indent);
        output.write("}");
    }

    fn emit_switch(&self, expr: &SwitchExpression, output: &mut RangeWriter, indent: usize) {
        output.write("switch ");
        self.emit_expression(&expr.selector, output);
        output.write(" {\n");
        for case in &expr.cases {
            self.indent(output, indent + 1);
            match case.kind {
                CaseKind::Case => {
                    output.write("case ");
                    self.emit_expression(&case.expr, output);
                    output.write(":\n");
                }
                CaseKind::Default => {
                    output.write("default:\n");
                }
            }
            self.emit_lines(&case.children, output, indent + 2);
        }
        self.indent(output, indent);
        output.write("}");
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for Formatter {
    fn generate(&self, file: &TemplateFile) -> GenerateResult {
        let mut output = RangeWriter::new();
        self.emit_file(file, &mut output);
        let (code, source_map) = output.finish();
        GenerateResult { code, source_map }
    }
}
