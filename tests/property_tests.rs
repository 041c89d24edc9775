//! Property-based tests for the comparison rules
//!
//! These tests use proptest to verify invariants across many randomly
//! generated inputs, catching edge cases that hand-written tests might miss.

use std::collections::BTreeMap;

use proptest::prelude::*;

use elcl_conformance::compare::{self, ComparisonStatus};
use elcl_conformance::outcome::value::floats_equivalent;
use elcl_conformance::outcome::{ACCEPTED_SYNTAX_DEVIATIONS, ErrorClass, Outcome, Value};

// =============================================================================
// Float equivalence properties
// =============================================================================

proptest! {
    /// Property: the relation is reflexive for every non-NaN value.
    #[test]
    fn float_relation_is_reflexive(a in proptest::num::f64::NORMAL) {
        prop_assert!(floats_equivalent(a, a));
    }

    /// Property: the relation is symmetric.
    #[test]
    fn float_relation_is_symmetric(a in -1e12f64..1e12, b in -1e12f64..1e12) {
        prop_assert_eq!(floats_equivalent(a, b), floats_equivalent(b, a));
    }

    /// Property: a difference within the absolute tolerance is accepted,
    /// regardless of its sign.
    #[test]
    fn float_differences_within_tolerance_match(
        a in -1e6f64..1e6,
        delta in -1e-10f64..1e-10,
    ) {
        prop_assert!(floats_equivalent(a, a + delta));
    }

    /// Property: NaN never matches a number.
    #[test]
    fn float_nan_never_matches_a_number(a in -1e12f64..1e12) {
        prop_assert!(!floats_equivalent(a, f64::NAN));
        prop_assert!(!floats_equivalent(f64::NAN, a));
    }

    /// Property: values above the overflow threshold match only the
    /// same-signed infinity.
    #[test]
    fn float_overflow_matches_same_signed_infinity(v in 1.1e307f64..1.7e308) {
        prop_assert!(floats_equivalent(v, f64::INFINITY));
        prop_assert!(floats_equivalent(-v, f64::NEG_INFINITY));
        prop_assert!(!floats_equivalent(v, f64::NEG_INFINITY));
        prop_assert!(!floats_equivalent(-v, f64::INFINITY));
    }
}

// =============================================================================
// Comparison properties
// =============================================================================

fn arbitrary_pass_outcome() -> impl Strategy<Value = Outcome> {
    proptest::collection::btree_map(
        "[a-z]{1,6}\\.[a-z]{1,6}",
        (any::<i64>(), "[a-zA-Z0-9 ]{0,12}"),
        0..8,
    )
    .prop_map(|entries| {
        let values: BTreeMap<String, Value> = entries
            .into_iter()
            .map(|(name_path, (number, text))| {
                let value = if number % 2 == 0 {
                    Value::new("Integer", number.to_string())
                } else {
                    Value::new("Text", format!("\"{text}\""))
                };
                (name_path, value)
            })
            .collect();
        Outcome::Pass { values }
    })
}

fn accepted_deviation_class() -> impl Strategy<Value = ErrorClass> {
    proptest::sample::select(ACCEPTED_SYNTAX_DEVIATIONS.to_vec())
}

proptest! {
    /// Property: an outcome compared with itself is always an exact pass
    /// with score 10 and no differences.
    #[test]
    fn identical_pass_outcomes_match_exactly(outcome in arbitrary_pass_outcome()) {
        let result = compare::compare(&outcome, &outcome);
        prop_assert_eq!(result.status, ComparisonStatus::Pass);
        prop_assert_eq!(result.score, 10);
        prop_assert!(result.differences.is_empty());
    }

    /// Property: a coarse Syntax report against any expected class from the
    /// deviation set scores exactly 8.
    #[test]
    fn syntax_deviation_scores_eight(expected_class in accepted_deviation_class()) {
        let actual = Outcome::Fail {
            classes: vec![ErrorClass::Syntax],
            message: None,
        };
        let expected = Outcome::Fail {
            classes: vec![expected_class],
            message: None,
        };
        let result = compare::compare(&actual, &expected);
        prop_assert_eq!(result.status, ComparisonStatus::PassWithAcceptedDeviation);
        prop_assert_eq!(result.score, 8);
    }

    /// Property: the reverse substitution - a finer actual class against an
    /// expected Syntax - always fails.
    #[test]
    fn reverse_deviation_always_fails(actual_class in accepted_deviation_class()) {
        let actual = Outcome::Fail {
            classes: vec![actual_class],
            message: None,
        };
        let expected = Outcome::Fail {
            classes: vec![ErrorClass::Syntax],
            message: None,
        };
        let result = compare::compare(&actual, &expected);
        prop_assert_eq!(result.status, ComparisonStatus::Fail);
        prop_assert_eq!(result.score, 0);
    }

    /// Property: dropping one name-path from the actual side reports it as
    /// missing and fails with score 0.
    #[test]
    fn missing_name_path_fails(outcome in arbitrary_pass_outcome()) {
        let Outcome::Pass { values } = &outcome else {
            unreachable!();
        };
        prop_assume!(!values.is_empty());
        let mut reduced = values.clone();
        let removed = reduced.keys().next().cloned();
        if let Some(key) = removed {
            reduced.remove(&key);
        }
        let actual = Outcome::Pass { values: reduced };
        let result = compare::compare(&actual, &outcome);
        prop_assert_eq!(result.status, ComparisonStatus::Fail);
        prop_assert_eq!(result.score, 0);
        prop_assert_eq!(result.differences.len(), 1);
        prop_assert!(result.differences[0].contains("Missing name-path"));
    }
}
