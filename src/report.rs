//! Rendering of run results: human-readable text and machine-readable JSON.

use std::io::{self, Write};
use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

use crate::compare::ComparisonStatus;
use crate::corpus::{TestCase, Tier};
use crate::runner::RunSummary;

/// How many failing or deviating cases the text report details per status.
const DETAIL_LIMIT: usize = 10;

/// Output format of the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
        })
    }
}

/// Render the report in the requested format.
pub fn render(
    format: ReportFormat,
    summary: &RunSummary,
    tier: Tier,
    corpus_root: &Path,
    out: &mut dyn Write,
) -> io::Result<()> {
    match format {
        ReportFormat::Text => render_text(summary, tier, corpus_root, out),
        ReportFormat::Json => render_json(summary, tier, corpus_root, out),
    }
}

/// The human-readable summary, banner block first, then details for every
/// failed case and every accepted deviation (capped per status).
pub fn render_text(
    summary: &RunSummary,
    tier: Tier,
    corpus_root: &Path,
    out: &mut dyn Write,
) -> io::Result<()> {
    let frame = format!("-*{}*-", "=".repeat(74));
    writeln!(out, "{frame}")?;
    writeln!(out)?;
    if summary.overall == ComparisonStatus::Pass {
        writeln!(out, "{:20}+*+    Conformance test PASSED    +*+", "")?;
    } else {
        writeln!(out, "{:20}XXX    Conformance test FAILED    XXX", "")?;
    }
    writeln!(out)?;

    let total = summary.total();
    writeln!(
        out,
        "    {:.2}% tests passed ({}/{})",
        percentage(summary.passed, total),
        summary.passed,
        total
    )?;
    if summary.passed_with_deviation > 0 {
        writeln!(
            out,
            "    {:.2}% tests passed with acceptable deviation ({}/{})",
            percentage(summary.passed_with_deviation, total),
            summary.passed_with_deviation,
            total
        )?;
    }
    if summary.failed > 0 {
        writeln!(
            out,
            "    {:.2}% tests failed ({}/{})",
            percentage(summary.failed, total),
            summary.failed,
            total
        )?;
    }
    writeln!(out)?;
    writeln!(out, "    {}-Tier Parser Score: {}", tier.title(), summary.score)?;
    writeln!(out)?;
    writeln!(out, "{frame}")?;
    writeln!(out)?;

    if summary.failed > 0 {
        writeln!(out, "{} Failed Tests:", summary.failed)?;
        writeln!(out)?;
        write_case_details(summary, ComparisonStatus::Fail, corpus_root, out)?;
    }
    if summary.passed_with_deviation > 0 {
        writeln!(
            out,
            "{} Passed Tests with Acceptable Deviation:",
            summary.passed_with_deviation
        )?;
        writeln!(out)?;
        write_case_details(
            summary,
            ComparisonStatus::PassWithAcceptedDeviation,
            corpus_root,
            out,
        )?;
    }
    Ok(())
}

fn write_case_details(
    summary: &RunSummary,
    status: ComparisonStatus,
    corpus_root: &Path,
    out: &mut dyn Write,
) -> io::Result<()> {
    let cases: Vec<&TestCase> = summary
        .cases
        .iter()
        .filter(|case| {
            case.result
                .as_ref()
                .is_some_and(|result| result.status == status)
        })
        .collect();
    for (shown, case) in cases.iter().enumerate() {
        writeln!(out, "  Test {}:", relative_path(case, corpus_root))?;
        if let Some(result) = &case.result {
            for difference in &result.differences {
                writeln!(out, "    - {difference}")?;
            }
        }
        if shown + 1 >= DETAIL_LIMIT && cases.len() > shown + 1 {
            writeln!(out, "  ... +{} more", cases.len() - (shown + 1))?;
            break;
        }
    }
    writeln!(out)?;
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    result: ComparisonStatus,
    total_test_count: usize,
    passed_test_count: usize,
    passed_with_deviation_test_count: usize,
    failed_test_count: usize,
    score: i64,
    tier: Tier,
    differences: Vec<JsonCaseDifferences<'a>>,
}

#[derive(Serialize)]
struct JsonCaseDifferences<'a> {
    status: ComparisonStatus,
    test_path: String,
    differences: &'a [String],
}

/// The machine-readable report; `differences` lists only cases that were
/// not an exact pass, in identifier order.
pub fn render_json(
    summary: &RunSummary,
    tier: Tier,
    corpus_root: &Path,
    out: &mut dyn Write,
) -> io::Result<()> {
    let differences: Vec<JsonCaseDifferences<'_>> = summary
        .cases
        .iter()
        .filter_map(|case| {
            let result = case.result.as_ref()?;
            if result.status == ComparisonStatus::Pass {
                return None;
            }
            Some(JsonCaseDifferences {
                status: result.status,
                test_path: relative_path(case, corpus_root),
                differences: &result.differences,
            })
        })
        .collect();
    let report = JsonReport {
        result: summary.overall,
        total_test_count: summary.total(),
        passed_test_count: summary.passed,
        passed_with_deviation_test_count: summary.passed_with_deviation,
        failed_test_count: summary.failed,
        score: summary.score,
        tier,
        differences,
    };
    serde_json::to_writer_pretty(&mut *out, &report).map_err(io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

fn relative_path(case: &TestCase, corpus_root: &Path) -> String {
    case.input_path
        .strip_prefix(corpus_root)
        .unwrap_or(&case.input_path)
        .display()
        .to_string()
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}
