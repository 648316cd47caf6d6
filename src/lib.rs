//! Front end for `.templ` files.
//!
//! Parses template sources into a [`TemplateFile`] whose every node and
//! embedded expression carries an exact source [`Range`], re-serialises
//! parsed files in canonical form, and maps positions between a template
//! and text generated from it through a [`SourceMap`].
//!
//! ```
//! use templ_parser::{Options, format_source, parse_string};
//!
//! let src = "package main\n\ntempl Hello(name string) {\n<p>Hello { name }</p>\n}\n";
//! let file = parse_string(src, &Options::default()).unwrap();
//! assert_eq!(file.templates().count(), 1);
//!
//! let formatted = format_source(src, &Options::default()).unwrap();
//! assert!(formatted.contains("\t<p>Hello { name }</p>"));
//! ```

pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod generate;
pub mod html;
pub mod parser;
pub mod sourcemap;
pub mod visit;

pub use ast::{Expression, Position, Range, TemplateFile};
pub use diagnostics::{Diagnostic, diagnose};
pub use error::{Error, ErrorKind, ParseError};
pub use generate::{Formatter, GenerateResult, Generator, RangeWriter};
pub use parser::{Parser, TemplateParser};
pub use sourcemap::{SourceMap, SourceMapEntry};

use std::fs;
use std::path::Path;

/// Package used when a file declares none and no better name is known.
pub const FALLBACK_PACKAGE: &str = "main";

/// Configuration for parsing.
#[derive(Debug, Clone)]
pub struct Options {
    /// Package for files without a `package` declaration (default: "main")
    pub default_package: String,
    /// Largest file `parse_file` will read, in bytes (default: 10 MiB)
    pub max_buffer_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            default_package: FALLBACK_PACKAGE.to_string(),
            max_buffer_size: 10 * 1024 * 1024,
        }
    }
}

impl Options {
    /// Options for the file at `path`: the default package is the name of the
    /// directory holding it, if that name is a valid identifier.
    pub fn for_path(path: &Path) -> Self {
        let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let dir_name = absolute
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .filter(|n| parser::expression::is_identifier(n));

        Self {
            default_package: dir_name.unwrap_or(FALLBACK_PACKAGE).to_string(),
            ..Self::default()
        }
    }
}

/// Parse template source held in memory.
pub fn parse_string(source: &str, options: &Options) -> Result<TemplateFile, ParseError> {
    TemplateParser::with_default_package(options.default_package.as_str()).parse(source)
}

/// Read a template from disk, refusing files over `max_buffer_size`.
pub fn read_source(path: &Path, options: &Options) -> Result<String, Error> {
    let io_error = |source| Error::Io { path: path.to_path_buf(), source };
    let size = fs::metadata(path).map_err(io_error)?.len();
    if size > options.max_buffer_size as u64 {
        log::warn!("{}: {} bytes exceeds the buffer limit", path.display(), size);
        return Err(Error::InputTooLarge {
            path: path.to_path_buf(),
            size,
            limit: options.max_buffer_size,
        });
    }
    fs::read_to_string(path).map_err(io_error)
}

/// Read and parse a file. The default package comes from its directory.
pub fn parse_file(path: &Path) -> Result<TemplateFile, Error> {
    let options = Options::for_path(path);
    log::debug!("parsing {} (default package {})", path.display(), options.default_package);
    let source = read_source(path, &options)?;
    Ok(parse_string(&source, &options)?)
}

/// Canonical text of a parsed file.
pub fn format(file: &TemplateFile) -> String {
    Formatter::new().generate(file).code
}

/// Parse then format.
pub fn format_source(source: &str, options: &Options) -> Result<String, ParseError> {
    let file = parse_string(source, options)?;
    let formatted = format(&file);
    log::debug!("formatted {} bytes into {} bytes", source.len(), formatted.len());
    Ok(formatted)
}
