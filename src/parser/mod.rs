pub mod combinator;
pub mod control;
pub mod cursor;
pub mod element;
pub mod expression;
pub mod file;
pub mod legacy;
pub mod nodes;
pub mod positions;

pub use combinator::{Outcome, Rule};
pub use cursor::{Cursor, Dialect};
pub use positions::{Expression, Position, Range};

use crate::ast::TemplateFile;
use crate::error::ParseError;

/// Parser trait - converts source text to a template file
pub trait Parser {
    fn parse(&self, source: &str) -> Result<TemplateFile, ParseError>;
}

/// Parser for `.templ` sources in either dialect
pub struct TemplateParser {
    default_package: String,
}

impl TemplateParser {
    /// The package of files without a declaration is `main`.
    pub fn new() -> Self {
        Self::with_default_package("main")
    }

    pub fn with_default_package(name: impl Into<String>) -> Self {
        Self { default_package: name.into() }
    }
}

impl Default for TemplateParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for TemplateParser {
    fn parse(&self, source: &str) -> Result<TemplateFile, ParseError> {
        file::template_file(source, &self.default_package)
    }
}
