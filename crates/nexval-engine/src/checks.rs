//! # Primitive Checkers
//!
//! Single-concern checks on one node. Each appends at most one finding to
//! the report and never fails operationally: unreadable lazy data becomes
//! an [`Unreadable`](FindingKind::Unreadable) finding.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use nexval_core::{Attribute, ElementType, Field, NodePath, Value};
use nexval_schema::{NexusType, Requirement, UnitCategory, UnitRejection};

use crate::report::{FindingKind, ValidationReport};

/// Record a `MissingRequired` finding when a required node is absent.
/// Returns whether the node is present, so callers can skip dependent
/// checks.
pub fn check_presence(
    report: &mut ValidationReport,
    path: &NodePath,
    present: bool,
    requirement: Requirement,
    what: &str,
) -> bool {
    if present {
        return true;
    }
    match requirement {
        Requirement::Required => {
            report.record(path.clone(), FindingKind::MissingRequired, format!("required {what} is missing"));
        }
        Requirement::Recommended => {
            tracing::debug!(path = %path, "recommended {what} is absent");
        }
        Requirement::Optional => {}
    }
    false
}

/// Field values, or an `Unreadable` finding when lazy data fails to load.
pub fn load_values<'f>(report: &mut ValidationReport, path: &NodePath, field: &'f Field) -> Option<Cow<'f, Value>> {
    match field.values() {
        Ok(values) => Some(values),
        Err(e) => {
            report.record(path.clone(), FindingKind::Unreadable, e.to_string());
            None
        }
    }
}

// ─── Types ───────────────────────────────────────────────────────────

/// What the element type alone says about conformance.
enum Verdict {
    Accept,
    Reject,
    /// Depends on the values, e.g. an `int` field is `NX_UINT` only if
    /// no value is negative.
    Inspect,
}

fn verdict(expected: NexusType, dtype: ElementType) -> Verdict {
    use ElementType as E;

    let accept_if = |ok: bool| if ok { Verdict::Accept } else { Verdict::Reject };
    match expected {
        NexusType::Binary => Verdict::Accept,
        NexusType::Char => accept_if(dtype == E::String),
        NexusType::CharOrNumber => accept_if(dtype == E::String || dtype.is_numeric()),
        NexusType::Number => accept_if(dtype.is_numeric()),
        NexusType::Int => accept_if(matches!(dtype, E::Int | E::Uint)),
        NexusType::Float => accept_if(dtype == E::Float),
        NexusType::Complex => accept_if(dtype == E::Complex),
        NexusType::DateTime => match dtype {
            E::String => Verdict::Inspect,
            _ => Verdict::Reject,
        },
        NexusType::PosInt => match dtype {
            E::Int | E::Uint => Verdict::Inspect,
            _ => Verdict::Reject,
        },
        NexusType::UInt => match dtype {
            E::Uint => Verdict::Accept,
            E::Int => Verdict::Inspect,
            _ => Verdict::Reject,
        },
        NexusType::Boolean => match dtype {
            E::Bool => Verdict::Accept,
            E::Int | E::Uint => Verdict::Inspect,
            _ => Verdict::Reject,
        },
    }
}

/// Value-level check for types that need one. `Err` names the first
/// offending value.
fn inspect(expected: NexusType, values: &Value) -> Result<(), String> {
    match expected {
        NexusType::DateTime => match values {
            Value::Str(items) => match items.iter().find(|s| !is_iso8601(s)) {
                Some(bad) => Err(format!("'{bad}' is not an ISO 8601 date-time")),
                None => Ok(()),
            },
            _ => Err("expected string values".to_string()),
        },
        NexusType::PosInt => first_integer_failing(values, |x| x > 0, "not positive"),
        NexusType::UInt => first_integer_failing(values, |x| x >= 0, "negative"),
        NexusType::Boolean => first_integer_failing(values, |x| x == 0 || x == 1, "not 0 or 1"),
        _ => Ok(()),
    }
}

fn first_integer_failing(values: &Value, ok: impl Fn(i128) -> bool, what: &str) -> Result<(), String> {
    let Some(ints) = values.as_integers() else {
        return Err("expected integer values".to_string());
    };
    match ints.into_iter().find(|&x| !ok(x)) {
        Some(bad) => Err(format!("value {bad} is {what}")),
        None => Ok(()),
    }
}

/// Accepts RFC 3339, offset-less date-times (`T` or space separated) and
/// plain dates.
pub fn is_iso8601(s: &str) -> bool {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s).is_ok()
        || DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Record a `TypeMismatch` unless the field's data conforms to `expected`.
///
/// Returns `false` only when a `TypeMismatch` was recorded. Data that
/// cannot be loaded is reported as `Unreadable` and does not count as a
/// type failure.
pub fn check_type(report: &mut ValidationReport, path: &NodePath, field: &Field, expected: NexusType) -> bool {
    let outcome = match verdict(expected, field.dtype()) {
        Verdict::Accept => Ok(()),
        Verdict::Reject => Err(format!("{} data", field.dtype())),
        Verdict::Inspect => match load_values(report, path, field) {
            Some(values) => inspect(expected, &values),
            None => return true,
        },
    };
    record_type_outcome(report, path, expected, outcome)
}

/// [`check_type`] for an attribute of a field or group.
pub fn check_attribute_type(report: &mut ValidationReport, path: &NodePath, attribute: &Attribute, expected: NexusType) -> bool {
    let dtype = attribute.value.element_type();
    let outcome = match verdict(expected, dtype) {
        Verdict::Accept => Ok(()),
        Verdict::Reject => Err(format!("{dtype} data")),
        Verdict::Inspect => inspect(expected, &attribute.value),
    };
    record_type_outcome(report, path, expected, outcome)
}

fn record_type_outcome(
    report: &mut ValidationReport,
    path: &NodePath,
    expected: NexusType,
    outcome: Result<(), String>,
) -> bool {
    match outcome {
        Ok(()) => true,
        Err(reason) => {
            report.record(path.clone(), FindingKind::TypeMismatch, format!("expected {expected}, found {reason}"));
            false
        }
    }
}

// ─── Units ───────────────────────────────────────────────────────────

/// Record a `UnitMismatch` unless the field's `units` attribute belongs to
/// `category`.
pub fn check_units(report: &mut ValidationReport, path: &NodePath, field: &Field, category: UnitCategory) {
    let units = field.units();
    let Err(rejection) = category.admits(units) else {
        return;
    };
    let message = match rejection {
        UnitRejection::Missing => format!("no units attribute, expected {category}"),
        UnitRejection::Unparseable(e) => format!("{e} (expected {category})"),
        UnitRejection::WrongDimension(dim) => {
            format!("units '{}' have dimension {dim}, expected {category}", units.unwrap_or_default())
        }
        UnitRejection::NotUnitless => {
            format!("units '{}' given for a unitless quantity", units.unwrap_or_default())
        }
    };
    report.record(path.clone(), FindingKind::UnitMismatch, message);
}

// ─── Enumerations ────────────────────────────────────────────────────

/// Values not in `allowed`, compared case-sensitively by rendering.
fn outside<'v>(values: &'v [String], allowed: &[String]) -> Vec<&'v str> {
    values
        .iter()
        .filter(|v| !allowed.iter().any(|a| a == *v))
        .map(String::as_str)
        .collect()
}

fn enumeration_message(bad: &[&str], allowed: &[String]) -> String {
    let shown: Vec<String> = bad.iter().take(3).map(|v| format!("'{v}'")).collect();
    let more = if bad.len() > 3 { format!(" and {} more", bad.len() - 3) } else { String::new() };
    format!("{}{more} not in [{}]", shown.join(", "), allowed.join(", "))
}

/// Record an `EnumerationViolation` unless every value of the field is a
/// member of `allowed`.
pub fn check_enumeration(report: &mut ValidationReport, path: &NodePath, field: &Field, allowed: &[String]) {
    let Some(values) = load_values(report, path, field) else {
        return;
    };
    let rendered = values.render_elements();
    let bad = outside(&rendered, allowed);
    if !bad.is_empty() {
        report.record(path.clone(), FindingKind::EnumerationViolation, enumeration_message(&bad, allowed));
    }
}

/// [`check_enumeration`] for an attribute.
pub fn check_attribute_enumeration(
    report: &mut ValidationReport,
    path: &NodePath,
    attribute: &Attribute,
    allowed: &[String],
) {
    let rendered = attribute.value.render_elements();
    let bad = outside(&rendered, allowed);
    if !bad.is_empty() {
        report.record(path.clone(), FindingKind::EnumerationViolation, enumeration_message(&bad, allowed));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use nexval_core::{LazyData, TreeError};

    fn path() -> NodePath {
        NodePath::parse("/entry/x")
    }

    fn report() -> ValidationReport {
        ValidationReport::new("NXtest")
    }

    fn kinds(report: &ValidationReport) -> Vec<FindingKind> {
        report.findings().iter().map(|f| f.kind).collect()
    }

    #[derive(Debug)]
    struct Broken;

    impl LazyData for Broken {
        fn load(&self) -> Result<Value, TreeError> {
            Err(TreeError::LoadFailed {
                path: "/entry/x".to_string(),
                reason: "disk on fire".to_string(),
            })
        }
    }

    #[test]
    fn presence_signals_and_records() {
        let mut r = report();
        assert!(check_presence(&mut r, &path(), true, Requirement::Required, "field"));
        assert!(!check_presence(&mut r, &path(), false, Requirement::Recommended, "field"));
        assert!(!check_presence(&mut r, &path(), false, Requirement::Optional, "field"));
        assert!(r.is_empty());
        assert!(!check_presence(&mut r, &path(), false, Requirement::Required, "field"));
        assert_eq!(kinds(&r), vec![FindingKind::MissingRequired]);
    }

    #[test]
    fn storage_types_map_to_nexus_types() {
        let cases = [
            (Field::scalar("x", Value::string("a")), NexusType::Char, true),
            (Field::scalar("x", Value::Int(vec![1])), NexusType::Char, false),
            (Field::scalar("x", Value::Uint(vec![1])), NexusType::Int, true),
            (Field::scalar("x", Value::Float(vec![1.0])), NexusType::Int, false),
            (Field::scalar("x", Value::Complex(vec![[1.0, 0.0]])), NexusType::Number, true),
            (Field::scalar("x", Value::Bool(vec![true])), NexusType::Number, false),
            (Field::scalar("x", Value::Binary(vec![1, 2])), NexusType::Binary, true),
            (Field::scalar("x", Value::Float(vec![2.0])), NexusType::CharOrNumber, true),
        ];
        for (field, ty, ok) in cases {
            let mut r = report();
            assert_eq!(check_type(&mut r, &path(), &field, ty), ok, "{ty} vs {}", field.dtype());
            assert_eq!(r.is_empty(), ok, "{ty} vs {}", field.dtype());
        }
    }

    #[test]
    fn signed_values_are_inspected() {
        let mut r = report();
        check_type(&mut r, &path(), &Field::scalar("x", Value::Int(vec![0, 3])), NexusType::UInt);
        assert!(r.is_empty());
        check_type(&mut r, &path(), &Field::scalar("x", Value::Int(vec![0, 3])), NexusType::PosInt);
        check_type(&mut r, &path(), &Field::scalar("x", Value::Int(vec![-1])), NexusType::UInt);
        assert_eq!(r.count(FindingKind::TypeMismatch), 2);
        assert!(r.findings()[0].message.contains("value 0"));
    }

    #[test]
    fn integer_flags_count_as_boolean() {
        let mut r = report();
        check_type(&mut r, &path(), &Field::scalar("x", Value::Uint(vec![0, 1, 1])), NexusType::Boolean);
        assert!(r.is_empty());
        check_type(&mut r, &path(), &Field::scalar("x", Value::Uint(vec![2])), NexusType::Boolean);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn date_times_must_parse() {
        for good in ["2024-03-01T12:00:00Z", "2024-03-01T12:00:00.5+01:00", "2024-03-01 12:00:00", "2024-03-01"] {
            assert!(is_iso8601(good), "{good}");
        }
        let mut r = report();
        check_type(&mut r, &path(), &Field::scalar("x", Value::string("yesterday")), NexusType::DateTime);
        assert_eq!(kinds(&r), vec![FindingKind::TypeMismatch]);
        assert!(r.findings()[0].message.contains("yesterday"));
    }

    #[test]
    fn unreadable_data_is_a_finding() {
        let field = Field::lazy("x", ElementType::Int, vec![2], Arc::new(Broken));
        let mut r = report();
        check_type(&mut r, &path(), &field, NexusType::PosInt);
        check_enumeration(&mut r, &path(), &field, &["1".to_string()]);
        assert_eq!(kinds(&r), vec![FindingKind::Unreadable, FindingKind::Unreadable]);
        // Dtype-only checks never touch the data.
        let mut r = report();
        assert!(check_type(&mut r, &path(), &field, NexusType::Int));
        assert!(r.is_empty());
    }

    #[derive(Debug)]
    struct Short;

    impl LazyData for Short {
        fn load(&self) -> Result<Value, TreeError> {
            Ok(Value::string("monitor"))
        }
    }

    #[test]
    fn short_lazy_load_is_unreadable() {
        let field = Field::lazy("mode", ElementType::String, vec![3], Arc::new(Short));
        let mut r = report();
        check_enumeration(&mut r, &path(), &field, &["monitor".to_string()]);
        assert_eq!(kinds(&r), vec![FindingKind::Unreadable]);
        assert!(r.findings()[0].message.contains("3 elements"), "{}", r.findings()[0].message);
    }

    #[test]
    fn units_follow_category() {
        let with_units = |u: &str| Field::scalar("x", Value::Float(vec![1.0])).with_attribute("units", Value::string(u));
        let mut r = report();
        check_units(&mut r, &path(), &with_units("K"), UnitCategory::Temperature);
        check_units(&mut r, &path(), &with_units("mm"), UnitCategory::Length);
        check_units(&mut r, &path(), &Field::scalar("x", Value::Float(vec![1.0])), UnitCategory::Any);
        check_units(&mut r, &path(), &Field::scalar("x", Value::Float(vec![1.0])), UnitCategory::Dimensionless);
        assert!(r.is_empty());

        check_units(&mut r, &path(), &with_units("s"), UnitCategory::Length);
        check_units(&mut r, &path(), &Field::scalar("x", Value::Float(vec![1.0])), UnitCategory::Length);
        check_units(&mut r, &path(), &with_units("furlongs"), UnitCategory::Length);
        assert_eq!(r.count(FindingKind::UnitMismatch), 3);
        assert!(r.findings()[1].message.contains("no units"));
    }

    #[test]
    fn enumeration_is_exact_and_case_sensitive() {
        let allowed = vec!["monitor".to_string(), "timer".to_string()];
        let mut r = report();
        check_enumeration(&mut r, &path(), &Field::scalar("mode", Value::string("timer")), &allowed);
        assert!(r.is_empty());
        check_enumeration(&mut r, &path(), &Field::scalar("mode", Value::string("Timer")), &allowed);
        check_enumeration(&mut r, &path(), &Field::scalar("mode", Value::string("counter")), &allowed);
        assert_eq!(r.count(FindingKind::EnumerationViolation), 2);
        assert!(r.findings()[1].message.contains("'counter'"));
    }

    #[test]
    fn numeric_enumerations_compare_rendered_values() {
        let allowed = vec!["1".to_string(), "2".to_string()];
        let mut r = report();
        check_enumeration(&mut r, &path(), &Field::scalar("x", Value::Int(vec![1, 2, 2])), &allowed);
        assert!(r.is_empty());
        check_enumeration(&mut r, &path(), &Field::scalar("x", Value::Int(vec![1, 3])), &allowed);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn attribute_checks_share_semantics() {
        let attr = Attribute::new("transformation_type", Value::string("rotation"));
        let mut r = report();
        check_attribute_type(&mut r, &path().attribute("transformation_type"), &attr, NexusType::Char);
        check_attribute_enumeration(
            &mut r,
            &path().attribute("transformation_type"),
            &attr,
            &["translation".to_string(), "rotation".to_string()],
        );
        assert!(r.is_empty());
        check_attribute_type(&mut r, &path().attribute("vector"), &Attribute::new("vector", Value::string("x")), NexusType::Number);
        assert_eq!(r.findings()[0].path.to_string(), "/entry/x@vector");
    }
}
