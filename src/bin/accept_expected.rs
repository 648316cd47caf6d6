//! Binary to generate/update the .expected.templ files next to test inputs
//!
//! Usage:
//!   cargo run --bin accept_expected            # Update all
//!   cargo run --bin accept_expected -- legacy  # Update only tests matching "legacy"

use std::fs;
use std::path::Path;
use templ_parser::{Options, format_source};
use walkdir::WalkDir;

fn is_input(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    name.ends_with(".templ") && !name.ends_with(".expected.templ")
}

fn main() {
    let filter: Option<String> = std::env::args().nth(1);
    let test_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("testdata");

    let mut updated = 0;
    let mut skipped = 0;

    for entry in WalkDir::new(&test_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| is_input(e.path()))
    {
        let path = entry.path();
        let path_str = path.to_string_lossy();

        if let Some(ref f) = filter {
            if !path_str.contains(f.as_str()) {
                skipped += 1;
                continue;
            }
        }

        let source = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("✗ {}: {}", path.display(), e);
                continue;
            }
        };

        match format_source(&source, &Options::default()) {
            Ok(formatted) => {
                let expected = path.with_extension("expected.templ");
                if let Err(e) = fs::write(&expected, formatted) {
                    eprintln!("✗ {}: {}", expected.display(), e);
                    continue;
                }
                println!("✓ {}", expected.display());
                updated += 1;
            }
            Err(e) => {
                eprintln!("✗ {}: {}", path.display(), e);
            }
        }
    }

    println!("\nUpdated {} file(s), skipped {}", updated, skipped);
}
