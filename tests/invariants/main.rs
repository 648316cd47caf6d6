//! Data-driven checks over every template in tests/testdata.
//!
//! For each `<name>.templ` input:
//! - every expression's range slices back to its text
//! - formatting matches `<name>.expected.templ`
//! - formatting the formatted text changes nothing
//! - every formatter mapping round-trips through the source map
//!
//! Run with: cargo test --test invariants

use libtest_mimic::{Arguments, Failed, Trial};
use std::fs;
use std::path::{Path, PathBuf};
use templ_parser::ast::*;
use templ_parser::visit::{self, Visitor};
use templ_parser::{Formatter, Generator, Options, format_source, parse_string};

fn main() {
    let args = Arguments::from_args();
    let pattern = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/testdata/*.templ");

    let mut inputs: Vec<PathBuf> = glob::glob(pattern)
        .expect("valid glob pattern")
        .filter_map(Result::ok)
        .filter(|p| !p.to_string_lossy().ends_with(".expected.templ"))
        .collect();
    inputs.sort();

    let mut trials = Vec::new();
    for path in inputs {
        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("?").to_string();
        for (check, run) in CHECKS {
            let (path, run) = (path.clone(), *run);
            trials.push(Trial::test(format!("{check}::{name}"), move || run(&path)));
        }
    }

    libtest_mimic::run(&args, trials).exit();
}

type Check = fn(&Path) -> Result<(), Failed>;

const CHECKS: &[(&str, Check)] = &[
    ("positions", check_positions),
    ("expected", check_expected),
    ("idempotent", check_idempotent),
    ("source_map", check_source_map),
];

fn read(path: &Path) -> Result<String, Failed> {
    fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()).into())
}

fn parse(source: &str) -> Result<TemplateFile, Failed> {
    parse_string(source, &Options::default()).map_err(|e| e.to_string().into())
}

/// Every expression that has a place in the source
#[derive(Default)]
struct Expressions(Vec<Expression>);

impl Visitor for Expressions {
    fn enter(&mut self, node: &Node) -> bool {
        match node {
            Node::StringExpression(s) => self.0.push(s.expr.clone()),
            Node::Call(c) => self.0.push(c.expr.clone()),
            Node::If(i) => {
                self.0.push(i.cond.clone());
                self.0.extend(i.else_ifs.iter().map(|b| b.cond.clone()));
            }
            Node::For(f) => self.0.push(f.header.clone()),
            Node::Switch(s) => {
                self.0.push(s.selector.clone());
                self.0.extend(s.cases.iter().map(|c| c.expr.clone()));
            }
            Node::Element(el) => attribute_expressions(&el.attributes, &mut self.0),
            _ => {}
        }
        true
    }
}

fn attribute_expressions(attributes: &[Attribute], found: &mut Vec<Expression>) {
    for attr in attributes {
        match &attr.kind {
            AttributeKind::Expression { expr, .. }
            | AttributeKind::BoolExpression { expr, .. }
            | AttributeKind::Spread { expr } => found.push(expr.clone()),
            AttributeKind::Conditional { cond, then, else_ } => {
                found.push(cond.clone());
                attribute_expressions(then, found);
                attribute_expressions(else_.as_deref().unwrap_or_default(), found);
            }
            AttributeKind::Constant { .. } | AttributeKind::Bool { .. } => {}
        }
    }
}

fn collect_expressions(file: &TemplateFile) -> Vec<Expression> {
    let mut found = Expressions::default();
    found.0.push(file.package.expr.clone());
    found.0.extend(file.imports.iter().map(|i| i.expr.clone()));
    for block in &file.blocks {
        found.0.push(block.name().clone());
        match block {
            Block::Template(t) => found.0.push(t.params.clone()),
            Block::Css(c) => {
                found.0.push(c.params.clone());
                for property in &c.properties {
                    if let CssValue::Expression(expr) = &property.value {
                        found.0.push(expr.clone());
                    }
                }
            }
            Block::Script(s) => {
                found.0.push(s.params.clone());
                found.0.push(s.body.clone());
            }
        }
    }
    visit::walk(file, &mut found);
    found.0
}

fn check_positions(path: &Path) -> Result<(), Failed> {
    let source = read(path)?;
    let file = parse(&source)?;
    for expr in collect_expressions(&file) {
        let sliced = &source[expr.range.from.offset..expr.range.to.offset];
        if sliced != expr.text {
            return Err(format!("{:?} at {} slices to {:?}", expr.text, expr.range, sliced).into());
        }
    }
    Ok(())
}

fn check_expected(path: &Path) -> Result<(), Failed> {
    let source = read(path)?;
    let expected = read(&path.with_extension("expected.templ"))?;
    let actual = format_source(&source, &Options::default()).map_err(|e| e.to_string())?;
    if actual != expected {
        return Err(format!("--- expected ---\n{expected}\n--- actual ---\n{actual}").into());
    }
    Ok(())
}

fn check_idempotent(path: &Path) -> Result<(), Failed> {
    let source = read(path)?;
    let once = format_source(&source, &Options::default()).map_err(|e| e.to_string())?;
    let twice = format_source(&once, &Options::default()).map_err(|e| e.to_string())?;
    if once != twice {
        return Err(format!("--- first ---\n{once}\n--- second ---\n{twice}").into());
    }
    Ok(())
}

fn check_source_map(path: &Path) -> Result<(), Failed> {
    let source = read(path)?;
    let file = parse(&source)?;
    let result = Formatter::new().generate(&file);

    for entry in result.source_map.entries() {
        let from = entry.source.from;
        let Some((target, _)) = result.source_map.target_from_source(from.line, from.column) else {
            return Err(format!("no target for {}", entry.source).into());
        };
        let Some((back, _)) = result.source_map.source_from_target(target.line, target.column) else {
            return Err(format!("no source for {} (from {})", target, entry.source).into());
        };
        if !entry.source.contains(back.line, back.column) {
            return Err(format!("{} came back as {}", entry.source, back).into());
        }
    }
    Ok(())
}
