//! Typed leaf values of a passed parse.

use std::fmt;

/// Relative tolerance for float equivalence.
const FLOAT_REL_TOLERANCE: f64 = 1e-9;
/// Absolute tolerance for float equivalence near zero.
const FLOAT_ABS_TOLERANCE: f64 = 1e-10;
/// Magnitude above which a finite value matches a same-signed infinity.
const FLOAT_OVERFLOW_THRESHOLD: f64 = 1e307;

/// A single typed value from a Pass outcome.
///
/// The type tag is an open string (`Integer`, `Float`, `Text`, `Boolean`,
/// `Date`, ...); only `Float` gets special comparison treatment, everything
/// else compares by its exact textual representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    /// Type tag as written in the outcome document.
    pub value_type: String,
    /// Raw textual representation of the value.
    pub text: String,
}

impl Value {
    pub fn new(value_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value_type: value_type.into(),
            text: text.into(),
        }
    }

    /// Render the value in outcome-document form: `Type(raw)`.
    pub fn to_outcome_text(&self) -> String {
        format!("{}({})", self.value_type, self.text)
    }

    /// Compare an actual value against the expected one.
    ///
    /// Returns `None` on a match, or a human-readable description of the
    /// difference. Types must match exactly; a type mismatch suppresses any
    /// value comparison.
    pub fn compare_with_expected(&self, expected: &Value) -> Option<String> {
        if self.value_type != expected.value_type {
            return Some(format!(
                "Expected type {}, got {}",
                expected.value_type, self.value_type
            ));
        }
        let matches = if self.value_type == "Float" {
            match (self.text.parse::<f64>(), expected.text.parse::<f64>()) {
                (Ok(actual), Ok(expected)) => floats_equivalent(actual, expected),
                _ => false,
            }
        } else {
            self.text == expected.text
        };
        if matches {
            None
        } else {
            Some(format!("Expected value {}, got {}", expected.text, self.text))
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.value_type, self.text)
    }
}

/// The float equivalence relation used by the comparator.
///
/// NaN matches only NaN. Infinities must agree in sign. A finite value with
/// magnitude above [`FLOAT_OVERFLOW_THRESHOLD`] matches a same-signed
/// infinity, so a parser that overflows to infinity agrees with one that
/// saturates near the representable range. Finite pairs compare with a
/// combined relative/absolute tolerance.
pub fn floats_equivalent(a: f64, b: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return a.is_nan() && b.is_nan();
    }
    match (a.is_infinite(), b.is_infinite()) {
        (true, true) => a.is_sign_positive() == b.is_sign_positive(),
        (true, false) => saturates_to_infinity(b, a),
        (false, true) => saturates_to_infinity(a, b),
        (false, false) => {
            let scale = a.abs().max(b.abs());
            (a - b).abs() <= (FLOAT_REL_TOLERANCE * scale).max(FLOAT_ABS_TOLERANCE)
        }
    }
}

fn saturates_to_infinity(finite: f64, infinite: f64) -> bool {
    finite.abs() > FLOAT_OVERFLOW_THRESHOLD
        && finite.is_sign_positive() == infinite.is_sign_positive()
}
