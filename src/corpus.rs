//! Test-corpus discovery and tier selection.
//!
//! The corpus root is partitioned into feature-category directories; a
//! [`Tier`] names the fixed subset of categories included in a run. The
//! scanner finds every input file under the included categories, requires a
//! same-stem expected-outcome file for each, and returns the cases sorted
//! by path with stable increasing identifiers. A missing outcome file or an
//! empty corpus is an integrity error that aborts the run before any
//! adapter is invoked.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;

use crate::compare::ComparisonResult;

/// File extension of corpus input documents.
pub const INPUT_EXTENSION: &str = "elcl";
/// File extension of expected-outcome documents.
pub const OUTCOME_EXTENSION: &str = "out";

/// Default corpus location, relative to the working directory. May be
/// overridden with the `ELCL_CONFORMANCE_TESTS` environment variable.
pub const DEFAULT_CORPUS_ROOT: &str = "tests/V1_0";

/// Conformance tier: which feature categories a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Minimal,
    Standard,
    #[default]
    Full,
}

impl Tier {
    /// The feature-category directories included in this tier.
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            Tier::Minimal => &["byte-count", "core", "float"],
            Tier::Standard => &[
                "byte-count",
                "byte-data",
                "code",
                "core",
                "date-time",
                "float",
                "multiline-byte-data",
                "multiline-code",
                "multiline-text",
                "section-list",
                "text-names",
                "value-list",
            ],
            Tier::Full => &[
                "byte-count",
                "byte-data",
                "code",
                "core",
                "date-time",
                "float",
                "multiline-byte-data",
                "multiline-code",
                "multiline-regex",
                "multiline-text",
                "regex",
                "section-list",
                "text-names",
                "time-delta",
                "value-list",
            ],
        }
    }

    /// Lowercase name as used on the CLI and in reports.
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Minimal => "minimal",
            Tier::Standard => "standard",
            Tier::Full => "full",
        }
    }

    /// Capitalized name for the score line of the text report.
    pub fn title(&self) -> &'static str {
        match self {
            Tier::Minimal => "Minimal",
            Tier::Standard => "Standard",
            Tier::Full => "Full",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One conformance check: an input document paired with its expected
/// outcome. The comparison result is attached exactly once by the worker
/// that executed the case.
#[derive(Debug, Clone)]
pub struct TestCase {
    /// Stable ordinal, assigned after sorting by path.
    pub identifier: usize,
    /// Path of the input document.
    pub input_path: PathBuf,
    /// Path of the expected-outcome document (same stem, `.out`).
    pub outcome_path: PathBuf,
    /// Attached by the orchestrator once the case has run.
    pub result: Option<ComparisonResult>,
}

/// Corpus integrity errors; all of them abort the run before execution.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("the test corpus directory does not exist: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("the outcome file for a test case is missing: {}", .0.display())]
    MissingOutcome(PathBuf),

    #[error("no test files found")]
    Empty,

    #[error("failed to read the test corpus: {0}")]
    Io(#[from] io::Error),
}

/// Scan the corpus under `root` for the test cases of `tier`.
#[tracing::instrument(skip_all, fields(root = %root.display(), tier = %tier))]
pub fn scan(root: &Path, tier: Tier) -> Result<Vec<TestCase>, CorpusError> {
    if !root.is_dir() {
        return Err(CorpusError::MissingRoot(root.to_path_buf()));
    }
    let mut input_files = Vec::new();
    collect_input_files(root, &mut input_files)?;
    input_files.retain(|path| in_tier(root, path, tier));
    input_files.sort();

    let mut cases = Vec::with_capacity(input_files.len());
    for (identifier, input_path) in input_files.into_iter().enumerate() {
        let outcome_path = input_path.with_extension(OUTCOME_EXTENSION);
        if !outcome_path.is_file() {
            let shown = outcome_path
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| outcome_path.clone());
            return Err(CorpusError::MissingOutcome(shown));
        }
        cases.push(TestCase {
            identifier,
            input_path,
            outcome_path,
            result: None,
        });
    }
    if cases.is_empty() {
        return Err(CorpusError::Empty);
    }
    Ok(cases)
}

/// Recursively collect all input files below `dir`.
fn collect_input_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), CorpusError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !name.starts_with('.') {
                collect_input_files(&path, files)?;
            }
        } else if path
            .extension()
            .is_some_and(|extension| extension == INPUT_EXTENSION)
        {
            files.push(path);
        }
    }
    Ok(())
}

/// Whether the first path segment below the root is one of the tier's
/// feature categories. Inputs directly in the root have no category and
/// are never included.
fn in_tier(root: &Path, path: &Path, tier: Tier) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    let mut components = relative.components();
    let Some(first) = components.next() else {
        return false;
    };
    if components.next().is_none() {
        return false;
    }
    first
        .as_os_str()
        .to_str()
        .is_some_and(|category| tier.categories().contains(&category))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_case(root: &Path, relative: &str, with_outcome: bool) {
        let input = root.join(relative);
        fs::create_dir_all(input.parent().unwrap()).unwrap();
        fs::write(&input, "[main]\nvalue: 123\n").unwrap();
        if with_outcome {
            let outcome = input.with_extension(OUTCOME_EXTENSION);
            fs::write(&outcome, "main.value = Integer(123)\n").unwrap();
        }
    }

    #[test]
    fn test_tier_category_tables_are_nested() {
        let minimal = Tier::Minimal.categories();
        let standard = Tier::Standard.categories();
        let full = Tier::Full.categories();
        assert!(minimal.iter().all(|c| standard.contains(c)));
        assert!(standard.iter().all(|c| full.contains(c)));
        assert_eq!(minimal.len(), 3);
        assert_eq!(standard.len(), 12);
        assert_eq!(full.len(), 15);
    }

    #[test]
    fn test_scan_orders_and_numbers_cases() {
        let dir = tempfile::tempdir().unwrap();
        write_case(dir.path(), "float/0002-PASS-b.elcl", true);
        write_case(dir.path(), "core/0001-PASS-a.elcl", true);
        write_case(dir.path(), "core/sub/0003-PASS-c.elcl", true);

        let cases = scan(dir.path(), Tier::Minimal).unwrap();
        assert_eq!(cases.len(), 3);
        assert_eq!(cases[0].identifier, 0);
        assert!(cases[0].input_path.ends_with("core/0001-PASS-a.elcl"));
        assert!(cases[1].input_path.ends_with("core/sub/0003-PASS-c.elcl"));
        assert!(cases[2].input_path.ends_with("float/0002-PASS-b.elcl"));
        assert!(
            cases
                .iter()
                .all(|case| case.outcome_path.extension().unwrap() == "out")
        );
    }

    #[test]
    fn test_scan_filters_by_tier() {
        let dir = tempfile::tempdir().unwrap();
        write_case(dir.path(), "core/0001-PASS-a.elcl", true);
        write_case(dir.path(), "regex/0002-PASS-b.elcl", true);

        let minimal = scan(dir.path(), Tier::Minimal).unwrap();
        assert_eq!(minimal.len(), 1);

        let full = scan(dir.path(), Tier::Full).unwrap();
        assert_eq!(full.len(), 2);
    }

    #[test]
    fn test_scan_ignores_uncategorized_root_files() {
        let dir = tempfile::tempdir().unwrap();
        write_case(dir.path(), "stray.elcl", true);
        write_case(dir.path(), "core/0001-PASS-a.elcl", true);

        let cases = scan(dir.path(), Tier::Full).unwrap();
        assert_eq!(cases.len(), 1);
    }

    #[test]
    fn test_missing_outcome_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_case(dir.path(), "core/0001-PASS-a.elcl", true);
        write_case(dir.path(), "core/0002-FAIL-b.elcl", false);

        let error = scan(dir.path(), Tier::Full).unwrap_err();
        assert!(matches!(error, CorpusError::MissingOutcome(_)));
    }

    #[test]
    fn test_empty_corpus_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("core")).unwrap();
        assert!(matches!(
            scan(dir.path(), Tier::Full).unwrap_err(),
            CorpusError::Empty
        ));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let error = scan(Path::new("/nonexistent/corpus"), Tier::Full).unwrap_err();
        assert!(matches!(error, CorpusError::MissingRoot(_)));
    }
}
