//! # Definitions Subcommand
//!
//! Lists the application definitions a directory provides. Loading runs
//! the same schema and consistency checks as `nexval validate`, so this
//! doubles as a lint for definition files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use nexval_schema::{ApplicationDefinition, DefinitionRegistry};

/// Arguments for the `nexval definitions` subcommand.
#[derive(Args, Debug)]
pub struct DefinitionsArgs {
    /// Directory of application definitions (YAML or JSON).
    #[arg(long, value_name = "DIR", default_value = "definitions")]
    pub definitions: PathBuf,
}

pub fn run_definitions(args: &DefinitionsArgs) -> Result<u8> {
    let registry = DefinitionRegistry::from_dir(&args.definitions)
        .with_context(|| format!("failed to load definitions from {}", args.definitions.display()))?;

    if registry.is_empty() {
        println!("No definitions found in {}", args.definitions.display());
        return Ok(1);
    }
    for definition in registry.iter() {
        println!("{}", describe(definition));
    }
    Ok(0)
}

/// One listing line: name, version, and description when present.
pub fn describe(definition: &ApplicationDefinition) -> String {
    let mut line = definition.name.clone();
    if let Some(version) = &definition.version {
        line.push_str(&format!(" (v{version})"));
    }
    if let Some(description) = &definition.description {
        line.push_str(&format!(": {}", description.trim()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definitions_dir() -> PathBuf {
        let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        dir.pop(); // crates
        dir.pop(); // repo root
        dir.join("definitions")
    }

    #[test]
    fn lists_bundled_definitions() {
        let args = DefinitionsArgs {
            definitions: definitions_dir(),
        };
        assert_eq!(run_definitions(&args).unwrap(), 0);
    }

    #[test]
    fn empty_directory_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let args = DefinitionsArgs {
            definitions: dir.path().to_path_buf(),
        };
        assert_eq!(run_definitions(&args).unwrap(), 1);
    }

    #[test]
    fn describe_includes_version_and_description() {
        let registry = DefinitionRegistry::from_dir(definitions_dir()).unwrap();
        let line = describe(registry.require("NXmonitored").unwrap());
        assert_eq!(line, "NXmonitored (v1.0): Sample environment log with an incident-beam monitor.");
    }
}
