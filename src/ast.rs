use serde::Serialize;

pub use crate::parser::positions::{Expression, Position, Range};

/// A parsed `.templ` file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateFile {
    pub package: Package,
    pub imports: Vec<Import>,
    pub blocks: Vec<Block>,
}

impl TemplateFile {
    /// Template blocks only, in document order.
    pub fn templates(&self) -> impl Iterator<Item = &TemplateBlock> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Template(t) => Some(t),
            _ => None,
        })
    }
}

/// `package name`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Package {
    pub expr: Expression,
}

/// `import "path"`, one per path even when written as a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Import {
    pub expr: Expression,
}

/// Top-level block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Template(TemplateBlock),
    Css(CssBlock),
    Script(ScriptBlock),
}

impl Block {
    pub fn name(&self) -> &Expression {
        match self {
            Block::Template(b) => &b.name,
            Block::Css(b) => &b.name,
            Block::Script(b) => &b.name,
        }
    }
}

/// `templ Name(params) { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateBlock {
    pub name: Expression,
    pub params: Expression,
    pub children: Vec<Node>,
    pub range: Range,
}

/// `css Name(params) { prop: value; }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CssBlock {
    pub name: Expression,
    pub params: Expression,
    pub properties: Vec<CssProperty>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CssProperty {
    pub name: String,
    pub value: CssValue,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CssValue {
    Constant(String),
    Expression(Expression),
}

/// `script Name(params) { ... }`. The body is kept as written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptBlock {
    pub name: Expression,
    pub params: Expression,
    pub body: Expression,
    pub range: Range,
}

/// Template node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    // Content
    Whitespace(WhitespaceNode),
    Text(TextNode),
    DocType(DocTypeNode),
    Comment(CommentNode),
    GoComment(GoCommentNode),
    StringExpression(StringExpression),
    Children(ChildrenExpression),

    // Markup
    Element(Element),
    RawElement(RawElement),

    // Control flow
    If(IfExpression),
    For(ForExpression),
    Switch(SwitchExpression),

    Call(CallExpression),
}

impl Node {
    pub fn range(&self) -> Range {
        match self {
            Node::Whitespace(n) => n.range,
            Node::Text(n) => n.range,
            Node::DocType(n) => n.range,
            Node::Comment(n) => n.range,
            Node::GoComment(n) => n.range,
            Node::StringExpression(n) => n.range,
            Node::Children(n) => n.range,
            Node::Element(n) => n.range,
            Node::RawElement(n) => n.range,
            Node::If(n) => n.range,
            Node::For(n) => n.range,
            Node::Switch(n) => n.range,
            Node::Call(n) => n.range,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, Node::Whitespace(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhitespaceNode {
    pub text: String,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextNode {
    pub text: String,
    pub range: Range,
}

/// `<!DOCTYPE html>`; `text` is what follows the keyword
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocTypeNode {
    pub text: String,
    pub range: Range,
}

/// `<!-- text -->`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentNode {
    pub text: String,
    pub range: Range,
}

/// `// text` up to the end of the line, or `/* text */`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoCommentNode {
    pub text: String,
    pub multiline: bool,
    pub range: Range,
}

/// `{ expr }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StringExpression {
    pub expr: Expression,
    pub range: Range,
}

/// `{ children... }`: where the caller's child content goes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildrenExpression {
    pub range: Range,
}

/// HTML element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub name: String,
    pub name_range: Range,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    pub range: Range,
}

/// `<script>` or `<style>`, whose contents are not template syntax
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawElement {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub contents: String,
    pub range: Range,
}

/// Attribute on an element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub range: Range,
}

impl Attribute {
    /// The attribute name. Spread and conditional attributes have none.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            AttributeKind::Constant { name, .. }
            | AttributeKind::Bool { name }
            | AttributeKind::Expression { name, .. }
            | AttributeKind::BoolExpression { name, .. } => Some(name),
            AttributeKind::Spread { .. } | AttributeKind::Conditional { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeKind {
    /// `class="foo"`, `class='foo'` or `class=foo`
    Constant {
        name: String,
        value: String,
        single_quote: bool,
    },

    /// `disabled`
    Bool { name: String },

    /// `href={ expr }`
    Expression { name: String, expr: Expression },

    /// `checked?={ expr }`
    BoolExpression { name: String, expr: Expression },

    /// `{ attrs... }`; `expr` excludes the dots
    Spread { expr: Expression },

    /// `if cond { class="a" } else { class="b" }`
    Conditional {
        cond: Expression,
        then: Vec<Attribute>,
        else_: Option<Vec<Attribute>>,
    },
}

/// `if cond { } else if cond { } else { }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfExpression {
    pub cond: Expression,
    pub then: Vec<Node>,
    pub else_ifs: Vec<ElseIf>,
    /// `None` when there is no `else` clause at all
    pub else_: Option<Vec<Node>>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElseIf {
    pub cond: Expression,
    pub then: Vec<Node>,
    pub range: Range,
}

/// `for header { }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForExpression {
    pub header: Expression,
    pub children: Vec<Node>,
    pub range: Range,
}

/// `switch selector { case x: ... default: ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwitchExpression {
    pub selector: Expression,
    pub cases: Vec<CaseExpression>,
    pub range: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseKind {
    Case,
    Default,
}

/// One clause of a switch. For `default` the expression is empty and sits
/// just after the keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseExpression {
    pub kind: CaseKind,
    pub expr: Expression,
    pub children: Vec<Node>,
    pub range: Range,
}

/// `@Component(args)`, or the older `{! Component(args) }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallExpression {
    pub expr: Expression,
    pub legacy: bool,
    pub range: Range,
}
