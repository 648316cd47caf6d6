//! HTML element classification used by the parser and the formatter.

/// Void elements: cannot have children or a closing tag.
/// https://html.spec.whatwg.org/multipage/syntax.html#void-elements
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements the formatter always lays out with their children indented.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "body", "blockquote", "details", "dialog",
    "dd", "div", "dl", "dt", "fieldset", "figcaption", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "head",
    "header", "hgroup", "hr", "html", "li", "main", "nav", "ol",
    "section", "table", "tbody", "thead", "tfoot", "tr", "ul",
];

/// Elements whose contents are copied through without template parsing.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

pub fn is_block_element(tag: &str) -> bool {
    BLOCK_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}
