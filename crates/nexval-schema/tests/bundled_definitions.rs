//! Integration test: every definition under `definitions/` passes the
//! meta-schema and consistency checks, and the registry indexes them.

use nexval_schema::{DefinitionRegistry, DimensionSpec, NexusType, UnitCategory};
use std::path::PathBuf;

/// Find the repository root.
fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

#[test]
fn test_load_bundled_definitions() {
    let registry = DefinitionRegistry::from_dir(repo_root().join("definitions"))
        .unwrap_or_else(|e| panic!("bundled definitions must load:\n{e}"));
    assert_eq!(registry.names(), vec!["NXmonitored", "NXmx", "NXtomo"]);
}

#[test]
fn test_nxmx_detector_rules() {
    let registry = DefinitionRegistry::from_dir(repo_root().join("definitions")).unwrap();
    let mx = registry.require("NXmx").unwrap();
    assert_eq!(mx.symbols, vec!["nP".to_string()]);

    let instrument = mx.entry.groups.iter().find(|g| g.nx_class == "NXinstrument").unwrap();
    let detector = instrument.groups.iter().find(|g| g.nx_class == "NXdetector").unwrap();
    assert!(detector.resets_dimension_scope);
    assert!(detector.validate_transformations);

    let data = detector.fields.iter().find(|f| f.name == "data").unwrap();
    assert_eq!(data.nx_type, Some(NexusType::Number));
    assert_eq!(data.rank, Some(3));
    assert_eq!(data.dimensions[0], DimensionSpec::Symbol("nP".to_string()));

    let thickness = detector.fields.iter().find(|f| f.name == "sensor_thickness").unwrap();
    assert_eq!(thickness.units, Some(UnitCategory::Length));
}

#[test]
fn test_broken_file_does_not_register() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(
        repo_root().join("definitions/NXmonitored.yaml"),
        dir.path().join("NXmonitored.yaml"),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("zz_broken.yaml"),
        "name: NXbroken\nentry:\n  nx_class: NXentry\n  fields:\n    - { name: x, rank: -1 }\n",
    )
    .unwrap();

    let mut registry = DefinitionRegistry::new().unwrap();
    let err = registry.load_dir(dir.path()).unwrap_err();
    assert!(err.to_string().contains("zz_broken.yaml"), "{err}");
    assert!(registry.get("NXbroken").is_none());
}
