//! # nexval-cli — Command-Line Front End
//!
//! Subcommand handlers for the `nexval` binary. Each handler returns the
//! process exit code, or an error that `main` logs and maps to exit code 1.
//!
//! - `nexval validate`: check a JSON tree document against a definition.
//! - `nexval definitions`: list the definitions in a directory.

pub mod definitions;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

use nexval_engine::ValidationOptions;

/// Read validation options from a YAML config file, or the defaults when
/// no file is given. Keys left out of the file keep their defaults.
pub fn load_options(config: Option<&Path>) -> Result<ValidationOptions> {
    let Some(path) = config else {
        return Ok(ValidationOptions::default());
    };
    let content = std::fs::read_to_string(path).with_context(|| format!("cannot read config {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(ValidationOptions::default());
    }
    let options: ValidationOptions =
        serde_yaml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))?;
    tracing::debug!(config = %path.display(), ?options, "loaded validation options");
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexval_engine::{FailurePolicy, LinkResolution, DEFAULT_MAX_LINK_HOPS};

    #[test]
    fn no_config_gives_defaults() {
        assert_eq!(load_options(None).unwrap(), ValidationOptions::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nexval.yaml");
        std::fs::write(&path, "link_resolution: full\n").unwrap();

        let options = load_options(Some(&path)).unwrap();
        assert_eq!(options.link_resolution, LinkResolution::Full);
        assert_eq!(options.failure_policy, FailurePolicy::Accumulate);
        assert_eq!(options.max_link_hops, DEFAULT_MAX_LINK_HOPS);
    }

    #[test]
    fn empty_config_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nexval.yaml");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(load_options(Some(&path)).unwrap(), ValidationOptions::default());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nexval.yaml");
        std::fs::write(&path, "fail_fast: true\n").unwrap();
        let err = load_options(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("invalid config"));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = load_options(Some(Path::new("/nonexistent/nexval.yaml"))).unwrap_err();
        assert!(err.to_string().contains("cannot read config"));
    }
}
