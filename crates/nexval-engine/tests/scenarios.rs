//! Integration test: validate JSON tree documents against the bundled
//! definitions under `definitions/`.

use nexval_core::{NexusTree, NodePath};
use nexval_engine::{FailurePolicy, FindingKind, LinkResolution, ValidationOptions, ValidationReport, Validator};
use nexval_schema::DefinitionRegistry;
use serde_json::{json, Value};
use std::path::PathBuf;

/// Find the repository root.
fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

fn registry() -> DefinitionRegistry {
    DefinitionRegistry::from_dir(repo_root().join("definitions")).expect("bundled definitions load")
}

fn validate(definition: &str, tree: Value, options: ValidationOptions) -> ValidationReport {
    let registry = registry();
    let definition = registry.require(definition).unwrap();
    let tree = NexusTree::from_json_value(tree).unwrap();
    Validator::new(definition, options).validate_tree(&tree)
}

fn field(name: &str, dtype: &str, value: Value) -> Value {
    json!({ "kind": "field", "name": name, "dtype": dtype, "value": value })
}

fn with_units(name: &str, dtype: &str, value: Value, units: &str) -> Value {
    json!({ "kind": "field", "name": name, "dtype": dtype, "value": value, "attributes": { "units": units } })
}

// ─── NXmonitored ─────────────────────────────────────────────────────

fn monitored(pressure_len: usize, mode: &str) -> Value {
    json!({
        "children": [{
            "kind": "group", "name": "entry", "nx_class": "NXentry",
            "children": [
                field("definition", "string", json!("NXmonitored")),
                field("start_time", "string", json!("2024-05-01T10:00:00Z")),
                {
                    "kind": "group", "name": "sample", "nx_class": "NXsample",
                    "children": [
                        field("name", "string", json!("Si")),
                        with_units("temperature", "float", json!([290.0, 291.0, 292.0, 293.0, 294.0]), "K"),
                        with_units("pressure", "float", json!(vec![1.0; pressure_len]), "kPa")
                    ]
                },
                {
                    "kind": "group", "name": "monitor", "nx_class": "NXmonitor",
                    "children": [
                        field("mode", "string", json!(mode)),
                        with_units("preset", "float", json!(10.0), "s"),
                        with_units("data", "uint", json!([5, 6, 7]), "counts")
                    ]
                }
            ]
        }]
    })
}

#[test]
fn test_monitored_conformant() {
    let report = validate("NXmonitored", monitored(5, "timer"), ValidationOptions::default());
    assert!(report.is_conformant(), "{:#?}", report.findings());
    assert_eq!(report.entries(), &[NodePath::parse("/entry")]);
}

#[test]
fn test_shared_symbol_disagreement_names_bound_value() {
    let report = validate("NXmonitored", monitored(3, "timer"), ValidationOptions::default());
    assert_eq!(report.len(), 1, "{:#?}", report.findings());
    let finding = &report.findings()[0];
    assert_eq!(finding.kind, FindingKind::DimensionMismatch);
    assert_eq!(finding.path.to_string(), "/entry/sample/pressure");
    assert!(finding.message.contains('5'), "{}", finding.message);
}

#[test]
fn test_monitor_mode_enumeration() {
    let report = validate("NXmonitored", monitored(5, "counter"), ValidationOptions::default());
    assert_eq!(report.len(), 1);
    assert_eq!(report.findings()[0].kind, FindingKind::EnumerationViolation);
    assert_eq!(report.findings()[0].path.to_string(), "/entry/monitor/mode");
}

#[test]
fn test_missing_required_field_is_single_finding() {
    let mut tree = monitored(5, "timer");
    let sample = &mut tree["children"][0]["children"][2]["children"];
    sample.as_array_mut().unwrap().retain(|c| c["name"] != "temperature");

    let report = validate("NXmonitored", tree, ValidationOptions::default());
    assert_eq!(report.len(), 1, "{:#?}", report.findings());
    assert_eq!(report.findings()[0].kind, FindingKind::MissingRequired);
    assert_eq!(report.findings()[0].path.to_string(), "/entry/sample/temperature");
}

#[test]
fn test_wrong_units_and_type() {
    let mut tree = monitored(5, "timer");
    tree["children"][0]["children"][2]["children"][1] = with_units("temperature", "int", json!([1, 2, 3, 4, 5]), "mm");
    let report = validate("NXmonitored", tree, ValidationOptions::default());
    assert_eq!(report.count(FindingKind::TypeMismatch), 1);
    assert_eq!(report.count(FindingKind::UnitMismatch), 1);
    assert_eq!(report.len(), 2);
}

#[test]
fn test_second_monitor_exceeds_max_occurs() {
    let mut tree = monitored(5, "timer");
    let mut second = tree["children"][0]["children"][3].clone();
    second["name"] = json!("monitor2");
    tree["children"][0]["children"].as_array_mut().unwrap().push(second);

    let report = validate("NXmonitored", tree, ValidationOptions::default());
    assert_eq!(report.count(FindingKind::MultiplicityViolation), 1);
    assert_eq!(report.len(), 1);
}

#[test]
fn test_strict_surfacing() {
    let ok = validate("NXmonitored", monitored(5, "timer"), ValidationOptions::default());
    assert!(ok.into_result().is_ok());

    let bad = validate("NXmonitored", monitored(5, "counter"), ValidationOptions::default());
    let err = bad.into_result().unwrap_err();
    assert!(err.to_string().contains("counter"), "{err}");
}

#[test]
fn test_validation_is_idempotent() {
    let registry = registry();
    let definition = registry.require("NXmonitored").unwrap();
    let tree = NexusTree::from_json_value(monitored(3, "counter")).unwrap();
    let validator = Validator::new(definition, ValidationOptions::default());
    let first = validator.validate_tree(&tree);
    assert_eq!(first.len(), 2);
    assert_eq!(first, validator.validate_tree(&tree));
}

#[test]
fn test_fail_fast_keeps_sibling_branches() {
    let mut tree = monitored(3, "counter");
    // A mistyped required field on the entry stops descent into its subgroups.
    tree["children"][0]["children"][1] = field("start_time", "string", json!("not a date"));

    let accumulate = validate("NXmonitored", tree.clone(), ValidationOptions::default());
    assert_eq!(accumulate.len(), 3);

    let fail_fast = ValidationOptions {
        failure_policy: FailurePolicy::FailFastPerBranch,
        ..ValidationOptions::default()
    };
    let report = validate("NXmonitored", tree, fail_fast.clone());
    assert_eq!(report.len(), 1);
    assert_eq!(report.findings()[0].kind, FindingKind::TypeMismatch);

    // With a clean entry both failing siblings are still visited.
    let report = validate("NXmonitored", monitored(3, "counter"), fail_fast);
    assert_eq!(report.len(), 2);
}

#[test]
fn test_entry_without_matching_definition() {
    let mut tree = monitored(5, "timer");
    tree["children"][0]["children"][0] = field("definition", "string", json!("NXother"));
    let report = validate("NXmonitored", tree, ValidationOptions::default());
    assert_eq!(report.len(), 1);
    assert!(report.findings()[0].path.is_root());
    assert!(report.entries().is_empty());
}

// ─── NXmx: transformation chains ─────────────────────────────────────

fn axis(name: &str, kind: &str, units: &str, depends_on: &str) -> Value {
    json!({
        "kind": "field", "name": name, "dtype": "float", "value": 0.0,
        "attributes": {
            "transformation_type": kind,
            "vector": [0.0, 0.0, 1.0],
            "units": units,
            "depends_on": depends_on
        }
    })
}

fn mx(sample_depends_on: &str, axes: Vec<Value>) -> Value {
    let pixel = |name: &str| {
        json!({
            "kind": "field", "name": name, "dtype": "float", "value": 0.075,
            "attributes": {
                "units": "mm",
                "transformation_type": "translation",
                "depends_on": ".",
                "vector": [1.0, 0.0, 0.0]
            }
        })
    };
    json!({
        "children": [{
            "kind": "group", "name": "entry", "nx_class": "NXentry",
            "children": [
                field("definition", "string", json!("NXmx")),
                field("start_time", "string", json!("2024-05-01T10:00:00")),
                field("end_time", "string", json!("2024-05-01T10:05:00")),
                {
                    "kind": "group", "name": "sample", "nx_class": "NXsample",
                    "children": [
                        field("name", "string", json!("lysozyme")),
                        field("depends_on", "string", json!(sample_depends_on)),
                        { "kind": "group", "name": "transformations", "nx_class": "NXtransformations", "children": axes }
                    ]
                },
                {
                    "kind": "group", "name": "instrument", "nx_class": "NXinstrument",
                    "children": [
                        field("name", "string", json!("I04")),
                        {
                            "kind": "group", "name": "detector", "nx_class": "NXdetector",
                            "children": [
                                field("depends_on", "string", json!(".")),
                                { "kind": "field", "name": "data", "dtype": "uint", "shape": [2, 2, 2], "value": [0, 1, 2, 3, 4, 5, 6, 7] },
                                field("sensor_material", "string", json!("Si")),
                                with_units("sensor_thickness", "float", json!(0.45), "mm"),
                                {
                                    "kind": "group", "name": "module", "nx_class": "NXdetector_module",
                                    "children": [
                                        field("data_origin", "int", json!([0, 0])),
                                        field("data_size", "int", json!([2, 2])),
                                        pixel("fast_pixel_direction"),
                                        pixel("slow_pixel_direction")
                                    ]
                                }
                            ]
                        },
                        {
                            "kind": "group", "name": "beam", "nx_class": "NXbeam",
                            "children": [with_units("incident_wavelength", "float", json!(0.9795), "Angstrom")]
                        }
                    ]
                },
                {
                    "kind": "group", "name": "data", "nx_class": "NXdata",
                    "children": [{ "kind": "link", "name": "data", "target": "/entry/instrument/detector/data" }]
                }
            ]
        }]
    })
}

#[test]
fn test_mx_chain_terminates() {
    let tree = mx(
        "transformations/omega",
        vec![
            axis("omega", "rotation", "deg", "phi"),
            axis("phi", "rotation", "deg", "x"),
            axis("x", "translation", "mm", "."),
        ],
    );
    let report = validate("NXmx", tree, ValidationOptions::default());
    assert!(report.is_conformant(), "{:#?}", report.findings());
}

#[test]
fn test_mx_chain_cycle() {
    let tree = mx(
        "/entry/sample/transformations/A",
        vec![axis("A", "rotation", "deg", "B"), axis("B", "rotation", "deg", "A")],
    );
    let report = validate("NXmx", tree, ValidationOptions::default());
    assert_eq!(report.len(), 1, "{:#?}", report.findings());
    assert_eq!(report.findings()[0].kind, FindingKind::TransformationCycle);
}

#[test]
fn test_mx_broken_chain() {
    let tree = mx("transformations/omega", vec![axis("omega", "rotation", "deg", "kappa")]);
    let report = validate("NXmx", tree, ValidationOptions::default());
    assert_eq!(report.len(), 1);
    assert_eq!(report.findings()[0].kind, FindingKind::BrokenTransformationChain);
}

#[test]
fn test_mx_full_link_resolution() {
    let full = ValidationOptions {
        link_resolution: LinkResolution::Full,
        ..ValidationOptions::default()
    };
    let tree = mx(".", vec![]);
    assert!(validate("NXmx", tree, full.clone()).is_conformant());

    let mut misdirected = mx(".", vec![]);
    misdirected["children"][0]["children"][5]["children"][0]["target"] = json!("/entry/sample/name");
    let report = validate("NXmx", misdirected.clone(), full);
    assert_eq!(report.count(FindingKind::UnresolvedLink), 1);
    assert!(validate("NXmx", misdirected, ValidationOptions::default()).is_conformant());
}
