//! Command-line front end for the XML sorter.
//!
//! Sorts each input and writes the canonical form to stdout, to a file, back
//! over the input, or to a `<name>-sorted.xml` attachment next to it.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use log::{debug, info, LevelFilter};

use xmlsorter::encoding::decode_to_utf8;
use xmlsorter::parser::ParseOptions;
use xmlsorter::serial::RenderOptions;
use xmlsorter::{SortError, XmlSorter};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// xmlsort -- put XML documents into a canonical, diff-friendly order.
///
/// Attributes and sibling elements are sorted; comments and processing
/// instructions move with the element that follows them.
#[derive(Parser, Debug)]
#[command(name = "xmlsort", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// XML files to sort (use `-` or nothing for stdin).
    files: Vec<String>,

    /// Save the result to a file instead of stdout (single input only).
    #[arg(long, short, value_name = "FILE", conflicts_with_all = ["in_place", "attachment", "check"])]
    output: Option<PathBuf>,

    /// Overwrite each input file with its sorted form.
    #[arg(long, short = 'i', conflicts_with_all = ["attachment", "check"])]
    in_place: bool,

    /// Write each result to `<name>-sorted.xml` next to its input.
    #[arg(long, short, conflicts_with = "check")]
    attachment: bool,

    /// Only report inputs that are not already sorted.
    #[arg(long)]
    check: bool,

    /// Spaces per indentation level.
    #[arg(long, value_name = "N", default_value_t = 4)]
    indent: usize,

    /// Maximum element nesting depth.
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Log progress to stderr.
    #[arg(long, short)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_SORT_ERROR: u8 = 1;
const EXIT_IO_ERROR: u8 = 2;

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let files = if cli.files.is_empty() {
        vec!["-".to_string()]
    } else {
        cli.files.clone()
    };
    if cli.output.is_some() && files.len() > 1 {
        Cli::command()
            .error(
                clap::error::ErrorKind::ArgumentConflict,
                "--output accepts a single input",
            )
            .exit();
    }

    let sorter = build_sorter(&cli);
    let mut worst_exit = EXIT_SUCCESS;
    for file in &files {
        let exit = process_file(&cli, &sorter, file);
        worst_exit = worst_exit.max(exit);
    }

    ExitCode::from(worst_exit)
}

/// Installs `env_logger`. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn build_sorter(cli: &Cli) -> XmlSorter {
    let mut parse_options = ParseOptions::default();
    if let Some(depth) = cli.max_depth {
        parse_options = parse_options.max_depth(depth);
    }
    let render_options = RenderOptions::default().indent_str(&" ".repeat(cli.indent));
    XmlSorter::with_options(parse_options, render_options)
}

/// Sorts a single input and returns an exit code.
fn process_file(cli: &Cli, sorter: &XmlSorter, filename: &str) -> u8 {
    let input = match read_input(filename) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{filename}: failed to read: {e}");
            return EXIT_IO_ERROR;
        }
    };

    let sorted = match sorter.sort_bytes(&input) {
        Ok(sorted) => sorted,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return match e {
                SortError::Io(_) => EXIT_IO_ERROR,
                SortError::Parse(_) | SortError::Render { .. } => EXIT_SORT_ERROR,
            };
        }
    };

    if cli.check {
        if is_canonical(&input, &sorted) {
            info!("{filename}: already sorted");
            return EXIT_SUCCESS;
        }
        eprintln!("{filename}: not sorted");
        return EXIT_SORT_ERROR;
    }

    let result = if cli.in_place {
        if filename == "-" {
            eprintln!("-: --in-place needs a file, not stdin");
            return EXIT_IO_ERROR;
        }
        write_file(Path::new(filename), &sorted)
    } else if cli.attachment {
        write_file(&attachment_path(filename), &sorted)
    } else if let Some(path) = &cli.output {
        write_file(path, &sorted)
    } else {
        write_stdout(&sorted)
    };

    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("{filename}: failed to write: {e}");
            EXIT_IO_ERROR
        }
    }
}

// ---------------------------------------------------------------------------
// Input / output
// ---------------------------------------------------------------------------

/// Reads input from a file or stdin (when filename is `-`).
fn read_input(filename: &str) -> io::Result<Vec<u8>> {
    if filename == "-" {
        let mut buf = Vec::new();
        io::Read::read_to_end(&mut io::stdin(), &mut buf)?;
        Ok(buf)
    } else {
        fs::read(filename)
    }
}

fn write_file(path: &Path, content: &str) -> io::Result<()> {
    debug!("writing {}", path.display());
    fs::write(path, content)
}

fn write_stdout(content: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    stdout.flush()
}

/// Compares an input with its sorted form as text.
///
/// The input is decoded the way the sorter decodes it (byte order mark
/// dropped, declared encoding honored) and its line ends are normalized to
/// `\n`, so a canonical file saved with CRLF or in Latin-1 still passes.
fn is_canonical(input: &[u8], sorted: &str) -> bool {
    let Ok(decoded) = decode_to_utf8(input) else {
        return false;
    };
    decoded.replace("\r\n", "\n").replace('\r', "\n") == sorted
}

/// `dir/report.v2.xml` becomes `dir/report-sorted.xml` and `.xml` becomes
/// `-sorted.xml`. Only stdin, which has no file name, uses `file-sorted.xml`.
fn attachment_path(filename: &str) -> PathBuf {
    let path = Path::new(filename);
    let stem = path
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|_| filename != "-")
        .map_or("file", |name| name.split('.').next().unwrap_or_default());
    path.with_file_name(format!("{stem}-sorted.xml"))
}
