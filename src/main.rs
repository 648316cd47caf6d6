use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use templ_parser::{Error, Options, diagnose, format_source, parse_string, read_source};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "templ")]
#[command(about = "templ - parse, check and format .templ files")]
struct Cli {
    #[command(flatten)]
    verbosity: Verbosity,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Verbosity {
    /// Log parser activity
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

impl Verbosity {
    fn level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Error
        } else {
            LevelFilter::Warn
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Format .templ files in place
    Fmt {
        /// Path to .templ file or directory
        #[arg(required_unless_present = "stdin")]
        path: Option<PathBuf>,

        /// Format stdin to stdout
        #[arg(long)]
        stdin: bool,

        /// List files that would change and leave them untouched
        #[arg(long)]
        check: bool,
    },
    /// Print the syntax tree of a file
    Parse {
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report deprecated syntax and duplicate attributes
    Diagnose { file: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(cli.verbosity.level())
        .init()
    {
        eprintln!("Error: could not install logger: {e}");
    }

    let ok = match cli.command {
        Commands::Fmt { stdin: true, .. } => fmt_stdin(),
        Commands::Fmt { path: Some(path), check, .. } => fmt_path(&path, check, cli.verbosity.quiet),
        Commands::Fmt { path: None, .. } => {
            eprintln!("Error: provide a file/directory or use --stdin");
            false
        }
        Commands::Parse { file, json } => parse_command(&file, json),
        Commands::Diagnose { file } => diagnose_command(&file),
    };

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn fmt_stdin() -> bool {
    let mut source = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut source) {
        eprintln!("Error: failed to read stdin: {e}");
        return false;
    }
    match format_source(&source, &Options::default()) {
        Ok(formatted) => {
            print!("{formatted}");
            true
        }
        Err(e) => {
            print_error(&Error::Parse(e), &source, "<stdin>");
            false
        }
    }
}

fn fmt_path(path: &Path, check: bool, quiet: bool) -> bool {
    let start = Instant::now();
    let files: Vec<PathBuf> = if path.is_file() {
        vec![path.to_path_buf()]
    } else if path.is_dir() {
        WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "templ"))
            .map(|e| e.into_path())
            .collect()
    } else {
        eprintln!("Error: {} does not exist", path.display());
        return false;
    };

    if files.is_empty() {
        eprintln!("No .templ files found in {}", path.display());
        return false;
    }

    let mut failed = false;
    let mut changed = 0;
    for file in &files {
        match fmt_file(file, check) {
            Ok(true) => {
                changed += 1;
                if check {
                    println!("{}", file.display());
                } else if !quiet {
                    print_formatted(file);
                }
            }
            Ok(false) => {}
            Err(()) => failed = true,
        }
    }

    if !quiet && !check {
        print_summary(files.len(), changed, start.elapsed());
    }
    !failed && !(check && changed > 0)
}

/// Format one file. `Ok(true)` when its text changes.
fn fmt_file(path: &Path, check: bool) -> Result<bool, ()> {
    let options = Options::for_path(path);
    let source = read_source(path, &options).map_err(|e| print_error(&e, "", &path.display().to_string()))?;
    let formatted = format_source(&source, &options)
        .map_err(|e| print_error(&Error::Parse(e), &source, &path.display().to_string()))?;

    if formatted == source {
        return Ok(false);
    }
    if !check {
        fs::write(path, &formatted).map_err(|e| {
            print_error(&Error::Io { path: path.to_path_buf(), source: e }, "", &path.display().to_string())
        })?;
    }
    Ok(true)
}

fn parse_command(path: &Path, json: bool) -> bool {
    let options = Options::for_path(path);
    let filename = path.display().to_string();
    let source = match read_source(path, &options) {
        Ok(s) => s,
        Err(e) => {
            print_error(&e, "", &filename);
            return false;
        }
    };
    let file = match parse_string(&source, &options) {
        Ok(f) => f,
        Err(e) => {
            print_error(&Error::Parse(e), &source, &filename);
            return false;
        }
    };

    if json {
        match serde_json::to_string_pretty(&file) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return false;
            }
        }
    } else {
        println!("{file:#?}");
    }
    true
}

fn diagnose_command(path: &Path) -> bool {
    let options = Options::for_path(path);
    let filename = path.display().to_string();
    let source = match read_source(path, &options) {
        Ok(s) => s,
        Err(e) => {
            print_error(&e, "", &filename);
            return false;
        }
    };
    match parse_string(&source, &options) {
        Ok(file) => {
            for diagnostic in diagnose(&file) {
                println!("{filename}:{diagnostic}");
            }
            true
        }
        Err(e) => {
            print_error(&Error::Parse(e), &source, &filename);
            false
        }
    }
}

fn print_error(error: &Error, source: &str, filename: &str) {
    if io::stderr().is_terminal() {
        eprint!("{}", error.render_color(source, filename));
    } else {
        eprint!("{}", error.render(source, filename));
    }
}

fn print_formatted(path: &Path) {
    if io::stderr().is_terminal() {
        eprintln!("  \x1b[32m✓\x1b[0m {}", path.display());
    } else {
        eprintln!("  ✓ {}", path.display());
    }
}

fn print_summary(count: usize, changed: usize, elapsed: std::time::Duration) {
    let files_word = if count == 1 { "file" } else { "files" };
    let time_str = format_duration(elapsed);

    if io::stderr().is_terminal() {
        eprintln!("\n\x1b[1mFormatted {changed} of {count} {files_word} in {time_str}\x1b[0m");
    } else {
        eprintln!("\nFormatted {changed} of {count} {files_word} in {time_str}");
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
