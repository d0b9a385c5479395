//! Structural comparison of response entities
//!
//! Any `Serialize` value can be compared: it is serialized to a
//! `serde_json::Value` tree and walked field by field. Objects recurse with
//! a dotted path, floating-point numbers are compared with an absolute
//! tolerance, and everything else must be exactly equal. A missing field
//! and a `null` field are both "absent".
//!
//! The walk never stops at the first difference; the caller gets every
//! [`FieldMismatch`] at once and decides whether that is a failure.

mod report;

pub use report::MismatchReport;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::common::{Error, Result};

/// Default tolerance for floating-point fields
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// One difference between expected and actual
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMismatch {
    /// Dot-separated path to the field, empty for the root value
    pub path: String,
    /// `None` when the field is absent on the expected side
    pub expected: Option<Value>,
    /// `None` when the field is absent on the actual side
    pub actual: Option<Value>,
}

impl FieldMismatch {
    fn new(path: &str, expected: Option<&Value>, actual: Option<&Value>) -> Self {
        Self {
            path: path.to_string(),
            expected: expected.cloned(),
            actual: actual.cloned(),
        }
    }
}

impl std::fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.path.is_empty() {
            "<root>"
        } else {
            &self.path
        };
        write!(
            f,
            "{}: expected {}, got {}",
            path,
            render(self.expected.as_ref()),
            render(self.actual.as_ref())
        )
    }
}

fn render(value: Option<&Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "<absent>".to_string(),
    }
}

/// Field-by-field comparator
#[derive(Debug, Clone)]
pub struct Comparator {
    epsilon: f64,
    subset: bool,
    ignored: Vec<String>,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new()
    }
}

impl Comparator {
    pub fn new() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            subset: false,
            ignored: Vec::new(),
        }
    }

    /// Absolute tolerance for floating-point fields
    ///
    /// Must be finite and non-negative; a NaN tolerance would make a value
    /// differ from itself.
    pub fn epsilon(mut self, epsilon: f64) -> Result<Self> {
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(Error::Config(format!(
                "epsilon must be a finite, non-negative number (got {})",
                epsilon
            )));
        }
        self.epsilon = epsilon;
        Ok(self)
    }

    /// When set, fields that only `actual` has are not mismatches
    pub fn subset(mut self, subset: bool) -> Self {
        self.subset = subset;
        self
    }

    /// Skip a field path (and everything under it), e.g. `"bookingid"`
    pub fn ignore(mut self, path: impl Into<String>) -> Self {
        self.ignored.push(path.into());
        self
    }

    /// Compare two serializable values
    ///
    /// Fails only if either side cannot be serialized.
    pub fn compare<E, A>(&self, expected: &E, actual: &A) -> Result<Vec<FieldMismatch>>
    where
        E: Serialize + ?Sized,
        A: Serialize + ?Sized,
    {
        let expected = serde_json::to_value(expected)?;
        let actual = serde_json::to_value(actual)?;
        Ok(self.compare_values(&expected, &actual, ""))
    }

    /// Compare two JSON trees starting at `path`
    pub fn compare_values(
        &self,
        expected: &Value,
        actual: &Value,
        path: &str,
    ) -> Vec<FieldMismatch> {
        let mut mismatches = Vec::new();
        self.walk(present(expected), present(actual), path, &mut mismatches);
        mismatches
    }

    /// Whether `compare` would report nothing
    pub fn matches<E, A>(&self, expected: &E, actual: &A) -> Result<bool>
    where
        E: Serialize + ?Sized,
        A: Serialize + ?Sized,
    {
        Ok(self.compare(expected, actual)?.is_empty())
    }

    /// Compare and turn any difference into [`crate::Error::Mismatch`]
    pub fn ensure_match<E, A>(&self, expected: &E, actual: &A) -> Result<()>
    where
        E: Serialize + ?Sized,
        A: Serialize + ?Sized,
    {
        MismatchReport::new(self.compare(expected, actual)?).into_result()
    }

    fn walk(
        &self,
        expected: Option<&Value>,
        actual: Option<&Value>,
        path: &str,
        out: &mut Vec<FieldMismatch>,
    ) {
        if self.is_ignored(path) {
            return;
        }

        match (expected, actual) {
            (None, None) => {}
            (Some(Value::Object(e)), Some(Value::Object(a))) => self.walk_object(e, a, path, out),
            (Some(Value::Array(e)), Some(Value::Array(a))) => self.walk_array(e, a, path, out),
            (Some(Value::Number(e)), Some(Value::Number(a))) => {
                if !self.numbers_match(e, a) {
                    out.push(FieldMismatch::new(path, expected, actual));
                }
            }
            (Some(e), Some(a)) if e == a => {}
            _ => out.push(FieldMismatch::new(path, expected, actual)),
        }
    }

    fn walk_object(
        &self,
        expected: &Map<String, Value>,
        actual: &Map<String, Value>,
        path: &str,
        out: &mut Vec<FieldMismatch>,
    ) {
        for (key, value) in expected {
            let child = join(path, key);
            self.walk(present(value), actual.get(key).and_then(present), &child, out);
        }

        if self.subset {
            return;
        }

        for (key, value) in actual {
            if expected.contains_key(key) {
                continue;
            }
            let child = join(path, key);
            self.walk(None, present(value), &child, out);
        }
    }

    fn walk_array(
        &self,
        expected: &[Value],
        actual: &[Value],
        path: &str,
        out: &mut Vec<FieldMismatch>,
    ) {
        let len = expected.len().max(actual.len());
        for i in 0..len {
            let child = format!("{}[{}]", path, i);
            self.walk(
                expected.get(i).and_then(present),
                actual.get(i).and_then(present),
                &child,
                out,
            );
        }
    }

    fn numbers_match(&self, expected: &Number, actual: &Number) -> bool {
        if expected.is_f64() || actual.is_f64() {
            match (expected.as_f64(), actual.as_f64()) {
                (Some(e), Some(a)) => (e - a).abs() <= self.epsilon,
                _ => false,
            }
        } else {
            expected == actual
        }
    }

    fn is_ignored(&self, path: &str) -> bool {
        self.ignored.iter().any(|ignored| {
            path == ignored
                || path
                    .strip_prefix(ignored.as_str())
                    .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
        })
    }
}

/// Compare with the default comparator
pub fn compare<E, A>(expected: &E, actual: &A) -> Result<Vec<FieldMismatch>>
where
    E: Serialize + ?Sized,
    A: Serialize + ?Sized,
{
    Comparator::new().compare(expected, actual)
}

fn present(value: &Value) -> Option<&Value> {
    if value.is_null() {
        None
    } else {
        Some(value)
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identical_values() {
        let value = json!({
            "name": "Shady Meadows",
            "map": { "latitude": 52.6351204, "longitude": 1.2733774 },
            "rooms": [1, 2, 3],
            "open": true,
            "note": null
        });
        assert!(Comparator::new().compare_values(&value, &value, "").is_empty());
    }

    #[test]
    fn test_float_within_tolerance() {
        let a = json!({ "lat": 52.6351204 });
        let b = json!({ "lat": 52.6351205 });
        assert!(Comparator::new().compare_values(&a, &b, "").is_empty());
    }

    #[test]
    fn test_float_outside_tolerance() {
        let a = json!({ "lat": 52.635 });
        let b = json!({ "lat": 52.636 });
        let mismatches = Comparator::new().compare_values(&a, &b, "");
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path, "lat");
    }

    #[test]
    fn test_integer_against_float_uses_tolerance() {
        let a = json!({ "price": 100 });
        let b = json!({ "price": 100.0000001 });
        assert!(Comparator::new().compare_values(&a, &b, "").is_empty());
    }

    #[test]
    fn test_integers_compared_exactly() {
        let mismatches =
            Comparator::new().compare_values(&json!({ "roomid": 1 }), &json!({ "roomid": 2 }), "");
        assert_eq!(mismatches.len(), 1);
    }

    #[test]
    fn test_null_and_missing_are_both_absent() {
        let a = json!({ "line2": null });
        let b = json!({});
        assert!(Comparator::new().compare_values(&a, &b, "").is_empty());
    }

    #[test]
    fn test_presence_asymmetry_reported_both_ways() {
        let a = json!({ "email": "a@b.c" });
        let b = json!({});
        let forward = Comparator::new().compare_values(&a, &b, "");
        let backward = Comparator::new().compare_values(&b, &a, "");
        assert_eq!(forward.len(), 1);
        assert_eq!(backward.len(), 1);
        assert_eq!(forward[0].actual, None);
        assert_eq!(backward[0].expected, None);
    }

    #[test]
    fn test_accumulates_across_levels() {
        let a = json!({
            "firstname": "Mark",
            "bookingdates": { "checkin": "2025-01-01", "checkout": "2025-01-02" }
        });
        let b = json!({
            "firstname": "Changed",
            "bookingdates": { "checkin": "2025-01-03", "checkout": "2025-01-04" }
        });
        let paths: Vec<String> = Comparator::new()
            .compare_values(&a, &b, "")
            .into_iter()
            .map(|m| m.path)
            .collect();
        assert_eq!(
            paths,
            vec!["firstname", "bookingdates.checkin", "bookingdates.checkout"]
        );
    }

    #[test]
    fn test_type_disagreement_single_mismatch() {
        let a = json!({ "contact": { "name": "x" } });
        let b = json!({ "contact": "x" });
        let mismatches = Comparator::new().compare_values(&a, &b, "");
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path, "contact");
    }

    #[test]
    fn test_array_length_difference() {
        let a = json!({ "messages": [{ "id": 1 }, { "id": 2 }] });
        let b = json!({ "messages": [{ "id": 1 }] });
        let mismatches = Comparator::new().compare_values(&a, &b, "");
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path, "messages[1]");
        assert_eq!(mismatches[0].actual, None);
    }

    #[test]
    fn test_subset_ignores_extra_actual_fields() {
        let a = json!({ "description": "Changed" });
        let b = json!({ "description": "Changed", "name": "Shady Meadows" });
        assert_eq!(Comparator::new().compare_values(&a, &b, "").len(), 1);
        assert!(Comparator::new().subset(true).compare_values(&a, &b, "").is_empty());
    }

    #[test]
    fn test_ignored_paths() {
        let a = json!({ "bookingid": 1, "dates": { "checkin": "a", "checkout": "b" } });
        let b = json!({ "bookingid": 2, "dates": { "checkin": "x", "checkout": "b" } });
        let comparator = Comparator::new().ignore("bookingid").ignore("dates.checkin");
        assert!(comparator.compare_values(&a, &b, "").is_empty());
    }

    #[test]
    fn test_ignore_is_not_a_prefix_match() {
        let a = json!({ "room": 1, "roomid": 1 });
        let b = json!({ "room": 2, "roomid": 2 });
        let mismatches = Comparator::new().ignore("room").compare_values(&a, &b, "");
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path, "roomid");
    }

    #[test]
    fn test_display_format() {
        let mismatches = Comparator::new().compare_values(
            &json!({ "contact": { "phone": "012345678901" } }),
            &json!({ "contact": {} }),
            "",
        );
        assert_eq!(
            mismatches[0].to_string(),
            "contact.phone: expected \"012345678901\", got <absent>"
        );
    }

    #[test]
    fn test_root_scalar_mismatch() {
        let mismatches = Comparator::new().compare_values(&json!(1), &json!("1"), "");
        assert_eq!(mismatches[0].to_string(), "<root>: expected 1, got \"1\"");
    }

    #[test]
    fn test_epsilon_rejects_nan_and_negative() {
        for bad in [f64::NAN, f64::INFINITY, -1.0] {
            let err = Comparator::new().epsilon(bad).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "accepted {}", bad);
        }
    }

    #[test]
    fn test_zero_epsilon_compares_floats_exactly() {
        let comparator = Comparator::new().epsilon(0.0).unwrap();
        let value = json!({ "map": { "latitude": 52.6351204 } });
        assert!(comparator.compare_values(&value, &value, "").is_empty());
        assert_eq!(
            comparator
                .compare_values(&json!(1.0), &json!(1.0000001), "")
                .len(),
            1
        );
    }

    #[test]
    fn test_custom_start_path() {
        let mismatches =
            Comparator::new().compare_values(&json!({ "a": 1 }), &json!({ "a": 2 }), "booking");
        assert_eq!(mismatches[0].path, "booking.a");
    }
}
