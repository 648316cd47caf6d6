//! Parsing scenarios through the public API
//!
//! Run with: cargo test --test parser_tests

use templ_parser::ast::*;
use templ_parser::parser::combinator::{Outcome, Rule, first_of};
use templ_parser::parser::{Cursor, control, nodes};
use templ_parser::{ErrorKind, Options, ParseError, parse_string};

type NodeRule = fn(&mut Cursor<'_>) -> Outcome<Node>;

fn parse(src: &str) -> TemplateFile {
    parse_string(src, &Options::default()).unwrap()
}

fn parse_err(src: &str) -> ParseError {
    parse_string(src, &Options::default()).unwrap_err()
}

fn significant(nodes: &[Node]) -> Vec<&Node> {
    nodes.iter().filter(|n| !n.is_whitespace()).collect()
}

fn first_significant(nodes: &[Node]) -> &Node {
    nodes.iter().find(|n| !n.is_whitespace()).expect("a non-whitespace node")
}

fn template_children(file: &TemplateFile) -> &[Node] {
    &file.templates().next().expect("a template").children
}

#[test]
fn test_for_loop_with_element_child() {
    let src = "for _, item := range p.Items {\n<div>{ item }</div>\n}";
    let mut cur = Cursor::new(src);
    let Outcome::Matched(Node::For(f)) = control::for_expression(&mut cur) else {
        panic!("expected a for expression");
    };
    assert_eq!(f.header.text, "_, item := range p.Items");
    assert_eq!(f.header.range.slice(src), Some("_, item := range p.Items"));

    let children = significant(&f.children);
    assert_eq!(children.len(), 1);
    let Node::Element(div) = children[0] else {
        panic!("expected an element");
    };
    assert_eq!(div.name, "div");
    assert!(matches!(&div.children[..], [Node::StringExpression(s)] if s.expr.text == "item"));
}

#[test]
fn test_unterminated_for_header() {
    let mut cur = Cursor::new("for _, item := range p.Items");
    let Outcome::Malformed(err) = control::for_expression(&mut cur) else {
        panic!("expected a malformed for");
    };
    assert!(err.message.contains("for"));
    assert!(err.message.contains("missing closing"));
    assert!(err.help.is_some());
}

#[test]
fn test_unterminated_for_in_file() {
    let err = parse_err("package main\n\ntempl A() {\nfor x := range xs\n<p></p>\n}\n");
    assert_eq!(err.kind, ErrorKind::Malformed);
    assert_eq!(err.message, "for: unterminated (missing closing '{')");
    assert_eq!(err.range.from.line, 4);
    assert!(err.to_string().starts_with("for: unterminated (missing closing '{') at line 4, col 1"));
}

#[test]
fn test_not_applicable_falls_through_to_next_rule() {
    // "iffy" does not start an if block, so the text rule gets a turn.
    let mut cur = Cursor::new("iffy words");
    let rules: [NodeRule; 2] = [control::if_expression, nodes::text];
    let Outcome::Matched(Node::Text(t)) = first_of(&rules).parse(&mut cur) else {
        panic!("expected text");
    };
    assert_eq!(t.text, "iffy words");
}

#[test]
fn test_malformed_stops_alternatives() {
    let mut cur = Cursor::new("if ready\nmore");
    let rules: [NodeRule; 2] = [control::if_expression, nodes::text];
    let Outcome::Malformed(err) = first_of(&rules).parse(&mut cur) else {
        panic!("expected the if error, not text");
    };
    assert!(err.message.starts_with("if:"));
}

#[test]
fn test_expression_ranges_slice_source() {
    let src = "package main\n\nimport \"fmt\"\n\ntempl Card(title string, n int) {\n\t<div class={ cls(n) } hidden?={ n == 0 }>\n\t\tif n > 1 {\n\t\t\t{ fmt.Sprint(n) } items\n\t\t} else if n == 1 {\n\t\t\tone\n\t\t}\n\t\t@Footer(title)\n\t</div>\n}\n";
    let file = parse(src);
    assert_eq!(file.package.expr.range.slice(src), Some("main"));
    assert_eq!(file.imports[0].expr.range.slice(src), Some("\"fmt\""));

    let t = file.templates().next().unwrap();
    assert_eq!(t.name.range.slice(src), Some("Card"));
    assert_eq!(t.params.range.slice(src), Some("title string, n int"));

    let Node::Element(div) = first_significant(&t.children) else {
        panic!("expected div");
    };
    let exprs: Vec<&str> = div
        .attributes
        .iter()
        .filter_map(|a| match &a.kind {
            AttributeKind::Expression { expr, .. } | AttributeKind::BoolExpression { expr, .. } => {
                expr.range.slice(src)
            }
            _ => None,
        })
        .collect();
    assert_eq!(exprs, vec!["cls(n)", "n == 0"]);

    let inner = significant(&div.children);
    let Node::If(if_expr) = inner[0] else {
        panic!("expected if");
    };
    assert_eq!(if_expr.cond.range.slice(src), Some("n > 1"));
    assert_eq!(if_expr.else_ifs[0].cond.range.slice(src), Some("n == 1"));
    assert!(if_expr.else_.is_none());

    let Node::Call(call) = inner[1] else {
        panic!("expected call");
    };
    assert_eq!(call.expr.text, "Footer(title)");
    assert_eq!(call.expr.range.slice(src), Some("Footer(title)"));
    assert!(!call.legacy);
}

#[test]
fn test_positions_count_characters() {
    let src = "package main\n\ntempl A() {\n\t<p>héllo { x }</p>\n}\n";
    let file = parse(src);
    let Node::Element(p) = first_significant(template_children(&file)) else {
        panic!("expected p");
    };
    let Node::StringExpression(s) = &p.children[2] else {
        panic!("expected expression, got {:?}", p.children);
    };
    assert_eq!(s.expr.range.from.line, 4);
    assert_eq!(s.expr.range.from.column, 13);
    assert_eq!(s.expr.range.slice(src), Some("x"));
}

#[test]
fn test_switch_cases() {
    let src = "package main\n\ntempl A(s string) {\n\tswitch s {\n\t\tcase \"a\":\n\t\t\tA\n\t\tdefault:\n\t\t\tother\n\t}\n}\n";
    let file = parse(src);
    let Node::Switch(sw) = first_significant(template_children(&file)) else {
        panic!("expected switch");
    };
    assert_eq!(sw.selector.text, "s");
    assert_eq!(sw.cases.len(), 2);
    assert_eq!(sw.cases[0].kind, CaseKind::Case);
    assert_eq!(sw.cases[0].expr.text, "\"a\"");
    assert_eq!(sw.cases[1].kind, CaseKind::Default);
    assert!(sw.cases[1].expr.text.is_empty());
    assert!(matches!(significant(&sw.cases[1].children)[..], [Node::Text(t)] if t.text == "other"));
}

#[test]
fn test_legacy_file_matches_brace_file() {
    let legacy = parse("{% package main %}\n\n{% templ A(ok bool) %}\n{% if ok %}<b>{%= name %}</b>{% endif %}\n{% endtempl %}\n");
    let brace = parse("package main\n\ntempl A(ok bool) {\nif ok {\n<b>{ name }</b>\n}\n}\n");

    let shape = |file: &TemplateFile| -> (String, String, String) {
        let Node::If(i) = first_significant(template_children(file)) else {
            panic!("expected if");
        };
        let Node::Element(b) = first_significant(&i.then) else {
            panic!("expected b");
        };
        let Node::StringExpression(s) = &b.children[0] else {
            panic!("expected expression");
        };
        (file.package.expr.text.clone(), i.cond.text.clone(), s.expr.text.clone())
    };
    assert_eq!(shape(&legacy), shape(&brace));
}

#[test]
fn test_legacy_css_is_rejected() {
    let err = parse_err("{% package main %}\n\n{% css red() %}\n");
    assert_eq!(err.kind, ErrorKind::LegacyUnsupported);
}

#[test]
fn test_missing_end_tag() {
    let err = parse_err("package main\n\ntempl A() {\n\t<div><span></div>\n}\n");
    assert!(err.message.contains("<span>"));
    assert!(err.message.contains("'</span>'"));
}

#[test]
fn test_unexpected_top_level_content() {
    let err = parse_err("package main\n\nfunc main() {}\n");
    assert_eq!(err.kind, ErrorKind::UnexpectedContent);
    assert_eq!(err.range.from.line, 3);
    assert_eq!(err.range.to.column, 15);
}

#[test]
fn test_render_points_at_error() {
    let src = "package main\n\ntempl A() {\n\t<div>\n}\n";
    let err = parse_err(src);
    let rendered = err.render(src, "a.templ");
    assert!(rendered.contains("a.templ:4:2"));
    assert!(rendered.contains('^'));
}

#[test]
fn test_css_and_script_blocks() {
    let src = "package main\n\ncss red() {\n\tcolor: red;\n\tbackground: { bg };\n}\n\nscript hello(name string) {\n\talert(name);\n}\n";
    let file = parse(src);
    assert_eq!(file.blocks.len(), 2);
    let Block::Css(css) = &file.blocks[0] else {
        panic!("expected css");
    };
    assert_eq!(css.properties[0].name, "color");
    assert_eq!(css.properties[0].value, CssValue::Constant("red".to_string()));
    assert!(matches!(&css.properties[1].value, CssValue::Expression(e) if e.text == "bg"));

    let Block::Script(script) = &file.blocks[1] else {
        panic!("expected script");
    };
    assert_eq!(script.body.text, "alert(name);");
    assert_eq!(script.body.range.slice(src), Some("alert(name);"));
}
