//! # Definition Registry
//!
//! Loads application definitions from YAML or JSON files, checks each one
//! against the embedded `definition.schema.json` (Draft 2020-12) and the
//! cross-field consistency rules, and indexes them by name.
//!
//! Loading is a trust boundary: a definition that fails either check is
//! rejected with every violation listed, never partially registered.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use jsonschema::Validator;
use serde_json::Value;
use thiserror::Error;

use crate::definition::ApplicationDefinition;

/// The meta-schema every definition file must satisfy.
pub const DEFINITION_SCHEMA: &str = include_str!("../schema/definition.schema.json");

/// File extensions picked up by [`DefinitionRegistry::load_dir`].
const DEFINITION_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Error while loading or registering a definition.
#[derive(Error, Debug)]
pub enum DefinitionError {
    /// The document did not conform to the definition schema.
    #[error("definition '{source_name}' is invalid:\n{violations}")]
    Invalid {
        /// File path or caller-supplied label.
        source_name: String,
        violations: Violations,
    },

    /// The document could not be parsed as YAML/JSON.
    #[error("cannot parse definition '{source_name}': {reason}")]
    Parse { source_name: String, reason: String },

    /// A definition with this name is already registered.
    #[error("definition '{name}' is already registered (from {existing})")]
    Duplicate { name: String, existing: String },

    /// No definition with this name is registered.
    #[error("unknown definition '{name}' (loaded: {available})")]
    Unknown { name: String, available: String },

    /// The embedded meta-schema could not be compiled.
    #[error("definition schema does not compile: {0}")]
    SchemaBuild(String),

    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single problem found in a definition document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer (schema violations) or dotted rule location
    /// (consistency violations) within the document.
    pub instance_path: String,
    /// JSON Pointer into the meta-schema; empty for consistency violations.
    pub schema_path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Non-empty collection of violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Violation] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.0
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

struct Registered {
    definition: ApplicationDefinition,
    source_name: String,
}

/// Name-indexed set of validated application definitions.
///
/// The compiled meta-schema validator is built once in [`new`](Self::new)
/// and reused for every document.
pub struct DefinitionRegistry {
    validator: Validator,
    definitions: BTreeMap<String, Registered>,
}

impl fmt::Debug for DefinitionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionRegistry")
            .field("definitions", &self.names())
            .finish()
    }
}

impl DefinitionRegistry {
    /// Empty registry with the meta-schema compiled.
    pub fn new() -> Result<Self, DefinitionError> {
        let schema: Value = serde_json::from_str(DEFINITION_SCHEMA)
            .map_err(|e| DefinitionError::SchemaBuild(e.to_string()))?;
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .build(&schema)
            .map_err(|e| DefinitionError::SchemaBuild(e.to_string()))?;
        Ok(Self {
            validator,
            definitions: BTreeMap::new(),
        })
    }

    /// Registry populated from every definition file in `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, DefinitionError> {
        let mut registry = Self::new()?;
        registry.load_dir(dir)?;
        Ok(registry)
    }

    /// Load every `*.yaml`, `*.yml` and `*.json` file in `dir` (not
    /// recursive), in file-name order. Returns how many were registered.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, DefinitionError> {
        let dir = dir.as_ref();
        let io_err = |source| DefinitionError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_definition = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| DEFINITION_EXTENSIONS.contains(&e));
            if is_definition && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            self.load_file(path)?;
        }
        tracing::info!(dir = %dir.display(), count = paths.len(), "loaded application definitions");
        Ok(paths.len())
    }

    /// Load, validate and register a single definition file.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&ApplicationDefinition, DefinitionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source_name = path.display().to_string();
        let definition = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            let value: Value = serde_json::from_str(&content).map_err(|e| DefinitionError::Parse {
                source_name: source_name.clone(),
                reason: e.to_string(),
            })?;
            self.check_value(value, &source_name)?
        } else {
            self.parse_str(&content, &source_name)?
        };
        self.insert_from(definition, source_name)
    }

    /// Validate a YAML (or JSON) document without registering it.
    pub fn parse_str(&self, content: &str, source_name: &str) -> Result<ApplicationDefinition, DefinitionError> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| DefinitionError::Parse {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?;
        self.check_value(value, source_name)
    }

    fn check_value(&self, value: Value, source_name: &str) -> Result<ApplicationDefinition, DefinitionError> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(&value)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();
        if !violations.is_empty() {
            return Err(DefinitionError::Invalid {
                source_name: source_name.to_string(),
                violations: Violations(violations),
            });
        }

        let definition: ApplicationDefinition =
            serde_json::from_value(value).map_err(|e| DefinitionError::Parse {
                source_name: source_name.to_string(),
                reason: e.to_string(),
            })?;

        check_consistency(&definition, source_name)?;
        Ok(definition)
    }

    /// Register an already-built definition.
    pub fn insert(&mut self, definition: ApplicationDefinition) -> Result<&ApplicationDefinition, DefinitionError> {
        check_consistency(&definition, &definition.name)?;
        self.insert_from(definition, "<memory>".to_string())
    }

    fn insert_from(
        &mut self,
        definition: ApplicationDefinition,
        source_name: String,
    ) -> Result<&ApplicationDefinition, DefinitionError> {
        use std::collections::btree_map::Entry;

        match self.definitions.entry(definition.name.clone()) {
            Entry::Occupied(existing) => Err(DefinitionError::Duplicate {
                name: definition.name,
                existing: existing.get().source_name.clone(),
            }),
            Entry::Vacant(slot) => {
                tracing::debug!(definition = %definition.name, source = %source_name, "registered definition");
                let registered = slot.insert(Registered {
                    definition,
                    source_name,
                });
                Ok(&registered.definition)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ApplicationDefinition> {
        self.definitions.get(name).map(|r| &r.definition)
    }

    /// Like [`get`](Self::get), but an unknown name is an error listing
    /// what is available.
    pub fn require(&self, name: &str) -> Result<&ApplicationDefinition, DefinitionError> {
        self.get(name).ok_or_else(|| DefinitionError::Unknown {
            name: name.to_string(),
            available: self.names().join(", "),
        })
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.definitions.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ApplicationDefinition> {
        self.definitions.values().map(|r| &r.definition)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn check_consistency(definition: &ApplicationDefinition, source_name: &str) -> Result<(), DefinitionError> {
    let issues = definition.consistency_issues();
    if issues.is_empty() {
        return Ok(());
    }
    Err(DefinitionError::Invalid {
        source_name: source_name.to_string(),
        violations: Violations(
            issues
                .into_iter()
                .map(|issue| Violation {
                    instance_path: issue.location,
                    schema_path: String::new(),
                    message: issue.message,
                })
                .collect(),
        ),
    })
}
