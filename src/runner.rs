//! Parallel execution of test cases and result aggregation.
//!
//! A fixed-size pool of worker threads pulls case indices from a shared
//! atomic counter; each worker invokes the adapter, loads the expected
//! outcome and compares the two. Workers share no mutable state beyond the
//! result sink, and every per-case error - protocol violation, timeout,
//! decode failure - is converted into a failed comparison so a single bad
//! case can never abort the batch. Results are merged and ordered by
//! identifier only after all workers return.

use std::cmp;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crate::adapter::AdapterRunner;
use crate::compare::{self, ComparisonResult, ComparisonStatus};
use crate::corpus::TestCase;
use crate::error::HarnessError;
use crate::outcome::codec;

/// Aggregated outcome of one conformance run.
#[derive(Debug)]
pub struct RunSummary {
    /// `Fail` if any case failed, `Pass` otherwise.
    pub overall: ComparisonStatus,
    pub passed: usize,
    pub passed_with_deviation: usize,
    pub failed: usize,
    /// Sum of all per-case scores.
    pub score: i64,
    /// All cases in identifier order, each with its result attached.
    pub cases: Vec<TestCase>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.cases.len()
    }
}

/// Run all `cases` against the adapter and aggregate the results.
#[tracing::instrument(skip_all, fields(case_count = cases.len()))]
pub fn execute(adapter: &AdapterRunner, mut cases: Vec<TestCase>) -> RunSummary {
    let next = AtomicUsize::new(0);
    let results: Mutex<Vec<(usize, ComparisonResult)>> = Mutex::new(Vec::with_capacity(cases.len()));

    thread::scope(|scope| {
        for _ in 0..worker_count(cases.len()) {
            scope.spawn(|| {
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    if index >= cases.len() {
                        return;
                    }
                    let case = &cases[index];
                    let result = run_case(adapter, case);
                    if let Ok(mut guard) = results.lock() {
                        guard.push((case.identifier, result));
                    }
                }
            });
        }
    });

    let results = results
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    for (identifier, result) in results {
        if let Some(case) = cases.get_mut(identifier) {
            case.result = Some(result);
        }
    }

    aggregate(cases)
}

/// Fold the attached results into the run summary. The fold is commutative
/// over cases, so worker completion order never matters.
fn aggregate(cases: Vec<TestCase>) -> RunSummary {
    let mut summary = RunSummary {
        overall: ComparisonStatus::Pass,
        passed: 0,
        passed_with_deviation: 0,
        failed: 0,
        score: 0,
        cases: Vec::new(),
    };
    for mut case in cases {
        if case.result.is_none() {
            case.result = Some(ComparisonResult::failure(vec![
                "ERROR: no result was recorded for this test case".to_string(),
            ]));
        }
        if let Some(result) = &case.result {
            match result.status {
                ComparisonStatus::Pass => summary.passed += 1,
                ComparisonStatus::PassWithAcceptedDeviation => summary.passed_with_deviation += 1,
                ComparisonStatus::Fail => {
                    summary.failed += 1;
                    summary.overall = ComparisonStatus::Fail;
                }
            }
            summary.score += result.score;
        }
        summary.cases.push(case);
    }
    summary.cases.sort_by_key(|case| case.identifier);
    summary
}

fn run_case(adapter: &AdapterRunner, case: &TestCase) -> ComparisonResult {
    match evaluate_case(adapter, case) {
        Ok(result) => result,
        Err(error) => {
            tracing::warn!(
                test = %case.input_path.display(),
                %error,
                "test case could not be evaluated"
            );
            ComparisonResult::failure(vec![format!("ERROR: {error}")])
        }
    }
}

fn evaluate_case(adapter: &AdapterRunner, case: &TestCase) -> Result<ComparisonResult, HarnessError> {
    let actual = adapter.run(&case.input_path)?;
    let expected = codec::decode_outcome_file(&case.outcome_path)?;
    Ok(compare::compare(&actual, &expected))
}

/// Pool size: `max(4, available parallelism - 1)`, never more workers than
/// cases.
fn worker_count(case_count: usize) -> usize {
    let available = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    cmp::max(4, available.saturating_sub(1)).min(case_count.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn case_with_result(identifier: usize, result: ComparisonResult) -> TestCase {
        TestCase {
            identifier,
            input_path: PathBuf::from(format!("core/{identifier:04}-PASS-case.elcl")),
            outcome_path: PathBuf::from(format!("core/{identifier:04}-PASS-case.out")),
            result: Some(result),
        }
    }

    #[test]
    fn test_worker_count_has_a_floor_of_four() {
        assert_eq!(worker_count(100).max(4), worker_count(100));
        assert_eq!(worker_count(2), 2);
        assert_eq!(worker_count(0), 1);
    }

    #[test]
    fn test_aggregate_tallies_and_orders() {
        let cases = vec![
            case_with_result(2, ComparisonResult::failure(vec!["difference".into()])),
            case_with_result(0, ComparisonResult::exact_pass()),
            case_with_result(1, ComparisonResult::accepted_deviation("accepted".into())),
        ];
        let summary = aggregate(cases);
        assert_eq!(summary.overall, ComparisonStatus::Fail);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.passed_with_deviation, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.score, 18);
        let identifiers: Vec<usize> = summary.cases.iter().map(|c| c.identifier).collect();
        assert_eq!(identifiers, [0, 1, 2]);
    }

    #[test]
    fn test_aggregate_all_passed() {
        let cases = vec![
            case_with_result(0, ComparisonResult::exact_pass()),
            case_with_result(1, ComparisonResult::exact_pass()),
        ];
        let summary = aggregate(cases);
        assert_eq!(summary.overall, ComparisonStatus::Pass);
        assert_eq!(summary.score, 20);
        assert_eq!(summary.failed, 0);
    }

    #[test]
    fn test_missing_result_counts_as_failure() {
        let mut case = case_with_result(0, ComparisonResult::exact_pass());
        case.result = None;
        let summary = aggregate(vec![case]);
        assert_eq!(summary.overall, ComparisonStatus::Fail);
        assert_eq!(summary.failed, 1);
    }
}
