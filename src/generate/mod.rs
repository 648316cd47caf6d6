mod format;
mod output;

pub use format::Formatter;
pub use output::RangeWriter;

use crate::ast::TemplateFile;
use crate::sourcemap::SourceMap;

/// Generation result
#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub code: String,
    /// Template ranges mapped to where they landed in `code`
    pub source_map: SourceMap,
}

/// Generator trait - converts a parsed file to text
pub trait Generator {
    fn generate(&self, file: &TemplateFile) -> GenerateResult;
}
