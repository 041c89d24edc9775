//! CLI for the conformance harness.
//!
//! ## Usage
//!
//! `elcl-conformance [OPTIONS] <TEST_ADAPTER>` runs the full conformance
//! suite against the adapter executable and reports the results.
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros. Command
//! functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits:
//!
//! - exit 0: all cases passed (exactly or with an accepted deviation)
//! - exit 1: at least one case failed
//! - exit 2: setup or corpus integrity error; no report was produced

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::env;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use crate::adapter::AdapterRunner;
use crate::compare::ComparisonStatus;
use crate::corpus::{self, DEFAULT_CORPUS_ROOT, Tier};
use crate::report::{self, ReportFormat};
use crate::runner;
use crate::version::{HARNESS_VERSION, SUPPORTED_LANG_VERSION};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    pub const SETUP: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a setup error (exit code 2).
    pub fn setup(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::SETUP,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Test the conformance of an ELCL configuration parser.
#[derive(Parser, Debug)]
#[command(name = "elcl-conformance")]
#[command(version = HARNESS_VERSION)]
#[command(about = "Test the conformance of a configuration parser", long_about = None)]
pub struct Cli {
    /// Path to the test adapter executable.
    #[arg(value_name = "TEST_ADAPTER")]
    pub test_adapter: PathBuf,

    /// Disable all progress output.
    #[arg(short, long)]
    pub silent: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    pub format: ReportFormat,

    /// Write all output to this path.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Select the parser tier.
    #[arg(short, long, value_enum, default_value_t)]
    pub tier: Tier,

    /// Select the language version to test.
    #[arg(short = 'l', long, default_value = SUPPORTED_LANG_VERSION)]
    pub lang_version: String,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();
    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(error) => {
            eprintln!("ERROR: {}", error.message);
            process::exit(error.exit_code.0);
        }
    }
}

/// Execute a full conformance run and return the exit code.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    if cli.lang_version != SUPPORTED_LANG_VERSION {
        return Err(CliError::setup(format!(
            "Unsupported language version: {}",
            cli.lang_version
        )));
    }
    let adapter = AdapterRunner::new(&cli.test_adapter, &cli.lang_version)
        .map_err(|error| CliError::setup(error.to_string()))?;
    let corpus_root = corpus_root();

    if !cli.silent {
        println!("Erbsland Configuration Language - Conformance Test");
        println!("{}", "-".repeat(78));
        println!("Scanning all test cases for tier '{}'...", cli.tier);
    }
    let cases = corpus::scan(&corpus_root, cli.tier)
        .map_err(|error| CliError::setup(error.to_string()))?;

    if !cli.silent {
        println!("Running all tests...");
    }
    let summary = runner::execute(&adapter, cases);

    let mut out = open_output(cli.output.as_deref())?;
    report::render(cli.format, &summary, cli.tier, &corpus_root, out.as_mut())
        .map_err(|error| CliError::setup(format!("Failed to write the report: {error}")))?;

    if summary.overall == ComparisonStatus::Fail {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Corpus location: `ELCL_CONFORMANCE_TESTS` when set, the default tree
/// under the working directory otherwise.
fn corpus_root() -> PathBuf {
    env::var_os("ELCL_CONFORMANCE_TESTS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CORPUS_ROOT))
}

fn open_output(path: Option<&Path>) -> CliResult<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = fs::File::create(path).map_err(|error| {
                CliError::setup(format!(
                    "Failed to open the output file {}: {error}",
                    path.display()
                ))
            })?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

// ============================================================================
// Tests
// ============================================================================
