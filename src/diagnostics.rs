//! Non-fatal findings about a parsed file.
//!
//! Each check is a [`Visitor`]; [`diagnose`] runs all of them and returns
//! the findings in document order.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::ast::{Node, Range, TemplateFile};
use crate::html::is_void_element;
use crate::visit::{self, Visitor};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub range: Range,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.range, self.message)
    }
}

/// Flags `{! Call() }`, which the formatter rewrites to `@Call()`
#[derive(Default)]
struct LegacyCallCheck {
    found: Vec<Diagnostic>,
}

impl Visitor for LegacyCallCheck {
    fn enter(&mut self, node: &Node) -> bool {
        match node {
            Node::Call(call) if call.legacy => {
                self.found.push(Diagnostic {
                    message: format!(
                        "legacy call syntax '{{! {} }}' is deprecated, use '@{}'",
                        call.expr.text, call.expr.text
                    ),
                    range: node.range(),
                });
            }
            _ => {}
        }
        true
    }
}

/// Flags an attribute name given twice on one element
#[derive(Default)]
struct DuplicateAttributeCheck {
    found: Vec<Diagnostic>,
}

impl Visitor for DuplicateAttributeCheck {
    fn enter(&mut self, node: &Node) -> bool {
        let (tag, attributes) = match node {
            Node::Element(el) => (&el.name, &el.attributes),
            Node::RawElement(el) => (&el.name, &el.attributes),
            _ => return true,
        };
        let mut seen = HashSet::new();
        for attr in attributes {
            let Some(name) = attr.name() else {
                continue;
            };
            if !seen.insert(name.to_ascii_lowercase()) {
                self.found.push(Diagnostic {
                    message: format!("<{tag}>: duplicate attribute '{name}'"),
                    range: attr.range,
                });
            }
        }
        true
    }
}

/// Flags content inside a void element such as `<br>text</br>`
#[derive(Default)]
struct VoidElementCheck {
    found: Vec<Diagnostic>,
}

impl Visitor for VoidElementCheck {
    fn enter(&mut self, node: &Node) -> bool {
        match node {
            Node::Element(el) if is_void_element(&el.name) && !el.children.iter().all(Node::is_whitespace) => {
                self.found.push(Diagnostic {
                    message: format!("<{}>: void element should not have child content", el.name),
                    range: el.name_range,
                });
            }
            _ => {}
        }
        true
    }
}

/// Run every check over `file`.
pub fn diagnose(file: &TemplateFile) -> Vec<Diagnostic> {
    let mut legacy = LegacyCallCheck::default();
    let mut duplicates = DuplicateAttributeCheck::default();
    let mut void = VoidElementCheck::default();
    visit::walk(file, &mut legacy);
    visit::walk(file, &mut duplicates);
    visit::walk(file, &mut void);

    let mut found = legacy.found;
    found.extend(duplicates.found);
    found.extend(void.found);
    found.sort_by_key(|d| d.range.from.offset);
    log::debug!("diagnostics: {} finding(s)", found.len());
    found
}
