//! File-level entry points: package defaults, size limits, diagnostics
//!
//! Run with: cargo test --test api_tests

use std::fs;
use std::path::Path;
use templ_parser::{Error, Options, diagnose, parse_file, read_source};

const NO_PACKAGE: &str = "templ Hello() {\n\t<p>hi</p>\n}\n";

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_package_defaults_to_directory_name() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write(&tmp.path().join("widgets"), "hello.templ", NO_PACKAGE);
    let file = parse_file(&path).unwrap();
    assert_eq!(file.package.expr.text, "widgets");
}

#[test]
fn test_invalid_directory_name_falls_back() {
    let tmp = tempfile::tempdir().unwrap();
    for dir in ["2fa", "my-views"] {
        let path = write(&tmp.path().join(dir), "hello.templ", NO_PACKAGE);
        let file = parse_file(&path).unwrap();
        assert_eq!(file.package.expr.text, "main", "directory {dir}");
    }
}

#[test]
fn test_declared_package_wins() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write(&tmp.path().join("widgets"), "hello.templ", &format!("package views\n\n{NO_PACKAGE}"));
    let file = parse_file(&path).unwrap();
    assert_eq!(file.package.expr.text, "views");
}

#[test]
fn test_oversized_input_is_refused() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write(tmp.path(), "big.templ", NO_PACKAGE);
    let options = Options {
        max_buffer_size: 8,
        ..Options::default()
    };
    let err = read_source(&path, &options).unwrap_err();
    assert!(matches!(err, Error::InputTooLarge { limit: 8, .. }));
}

#[test]
fn test_missing_file_is_io_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = parse_file(&tmp.path().join("absent.templ")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    assert!(err.to_string().contains("absent.templ"));
}

#[test]
fn test_parse_errors_carry_location() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write(tmp.path(), "bad.templ", "package main\n\ntempl A() {\n\t<div>\n");
    let Err(Error::Parse(err)) = parse_file(&path) else {
        panic!("expected a parse error");
    };
    assert_eq!(err.range.from.line, 4);
}

#[test]
fn test_diagnostics_from_file() {
    let tmp = tempfile::tempdir().unwrap();
    let src = "package main\n\ntempl A() {\n\t<a href=\"/\" href=\"/home\">{! Icon() }</a>\n}\n";
    let path = write(tmp.path(), "diag.templ", src);
    let found = diagnose(&parse_file(&path).unwrap());
    let messages: Vec<&str> = found.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "<a>: duplicate attribute 'href'",
            "legacy call syntax '{! Icon() }' is deprecated, use '@Icon()'",
        ]
    );
}
