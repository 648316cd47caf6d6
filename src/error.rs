use crate::parser::positions::Range;
use serde::Serialize;
use std::path::PathBuf;

/// Kind of parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// A construct's prefix matched but its body or terminator is invalid
    Malformed,
    /// Input ran out while a construct was still open
    UnexpectedEof,
    /// Syntax that only the `{% %}` dialect accepts, or the reverse
    LegacyUnsupported,
    /// Text at file level that no rule accepts
    UnexpectedContent,
}

/// A located parse failure.
///
/// Displays as `"<message> at <from>"`. The range starts where the failing
/// construct began and ends where parsing gave up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message} at {}", .range.from)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub range: Range,
    pub help: Option<String>,
}

impl ParseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, range: Range) -> Self {
        Self {
            kind,
            message: message.into(),
            range,
            help: None,
        }
    }

    /// Shorthand for the most common kind.
    pub fn malformed(message: impl Into<String>, range: Range) -> Self {
        Self::new(ErrorKind::Malformed, message, range)
    }

    /// Add help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render the error with the offending source line and carets under the range.
    pub fn render(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, false)
    }

    /// Same as [`render`](Self::render) with ANSI color codes
    pub fn render_color(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, true)
    }

    fn render_inner(&self, source: &str, filename: &str, color: bool) -> String {
        let red = if color { "\x1b[1;31m" } else { "" };
        let dim = if color { "\x1b[2m" } else { "" };
        let cyan = if color { "\x1b[1;38;5;73m" } else { "" };
        let reset = if color { "\x1b[0m" } else { "" };

        let from = self.range.from;
        let to = self.range.to;
        let mut output = String::new();

        output.push_str(&format!(
            " {}file:{} {}:{}:{}\n",
            dim, reset, filename, from.line, from.column
        ));
        output.push_str(&format!("{}error:{} {}\n", red, reset, self.message));

        if let Some(source_line) = source.lines().nth(from.line.saturating_sub(1)) {
            let width = from.line.to_string().len().max(2);
            output.push_str(&format!("{}{:>width$} |{}\n", dim, "", reset, width = width));
            output.push_str(&format!(
                "{}{:>width$} |{} {}\n",
                dim, from.line, reset, source_line, width = width
            ));

            // Columns count characters, so do the carets.
            let line_len = source_line.chars().count();
            let start = from.column.saturating_sub(1);
            let len = if to.line == from.line {
                to.column.saturating_sub(from.column)
            } else {
                line_len.saturating_sub(start)
            }
            .max(1);

            output.push_str(&format!(
                "{}{:>width$} |{} {}{}{}{}\n",
                dim,
                "",
                reset,
                " ".repeat(start),
                red,
                "^".repeat(len),
                reset,
                width = width
            ));
        }

        if let Some(ref help) = self.help {
            output.push('\n');
            for (i, line) in help.lines().enumerate() {
                if i == 0 {
                    output.push_str(&format!(" {}help:{} {}\n", cyan, reset, line));
                } else {
                    output.push_str(&format!("       {}\n", line));
                }
            }
        }

        output
    }
}

/// Anything that can go wrong between a path on disk and a parsed file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{} is {size} bytes, larger than the {limit} byte limit", .path.display())]
    InputTooLarge { path: PathBuf, size: u64, limit: usize },
}

impl Error {
    /// Render for a terminal. Only parse errors carry a location.
    pub fn render(&self, source: &str, filename: &str) -> String {
        match self {
            Error::Parse(err) => err.render(source, filename),
            other => format!("error: {}\n", other),
        }
    }

    pub fn render_color(&self, source: &str, filename: &str) -> String {
        match self {
            Error::Parse(err) => err.render_color(source, filename),
            other => format!("\x1b[1;31merror:\x1b[0m {}\n", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::positions::Position;

    fn range(line: usize, from_col: usize, to_col: usize) -> Range {
        Range::new(
            Position::new(0, line, from_col),
            Position::new(0, line, to_col),
        )
    }

    #[test]
    fn test_display_includes_start_position() {
        let err = ParseError::malformed("for: unterminated (missing closing '{')", range(2, 1, 10));
        assert_eq!(
            err.to_string(),
            "for: unterminated (missing closing '{') at line 2, col 1 (offset 0)"
        );
    }

    #[test]
    fn test_render_underlines_range() {
        let source = "package x\n\tfor i := range xs\n";
        let err = ParseError::malformed("for: unterminated", range(2, 2, 19));
        let rendered = err.render(source, "a.templ");
        assert!(rendered.contains("a.templ:2:2"));
        assert!(rendered.contains("for i := range xs"));
        assert!(rendered.contains(&format!(" {}{}", " ", "^".repeat(17))));
    }

    #[test]
    fn test_render_with_help() {
        let err = ParseError::malformed("bad", range(1, 1, 1)).with_help("try this");
        let rendered = err.render("x", "f.templ");
        assert!(rendered.contains("help: try this"));
    }

    #[test]
    fn test_error_from_parse_error() {
        let err: Error = ParseError::malformed("bad", range(1, 1, 2)).into();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().starts_with("bad at"));
    }
}
