use crate::ast::{Block, Node, TemplateFile};

/// Visitor over template nodes
pub trait Visitor {
    /// Called before visiting children. Return `false` to skip children.
    fn enter(&mut self, _node: &Node) -> bool {
        true
    }

    /// Called after visiting children.
    fn exit(&mut self, _node: &Node) {}
}

/// Visit every node of every template in `file`, depth first, in document
/// order. CSS and script blocks have no nodes and are skipped.
pub fn walk(file: &TemplateFile, visitor: &mut dyn Visitor) {
    for block in &file.blocks {
        if let Block::Template(t) = block {
            walk_nodes(&t.children, visitor);
        }
    }
}

pub fn walk_nodes(nodes: &[Node], visitor: &mut dyn Visitor) {
    for node in nodes {
        if visitor.enter(node) {
            match node {
                Node::Element(el) => walk_nodes(&el.children, visitor),
                Node::If(expr) => {
                    walk_nodes(&expr.then, visitor);
                    for branch in &expr.else_ifs {
                        walk_nodes(&branch.then, visitor);
                    }
                    if let Some(children) = &expr.else_ {
                        walk_nodes(children, visitor);
                    }
                }
                Node::For(expr) => walk_nodes(&expr.children, visitor),
                Node::Switch(expr) => {
                    for case in &expr.cases {
                        walk_nodes(&case.children, visitor);
                    }
                }
                Node::Whitespace(_)
                | Node::Text(_)
                | Node::DocType(_)
                | Node::Comment(_)
                | Node::GoComment(_)
                | Node::StringExpression(_)
                | Node::Children(_)
                | Node::RawElement(_)
                | Node::Call(_) => {}
            }
        }
        visitor.exit(node);
    }
}
