//! # nexval-schema — Application Definitions as Data
//!
//! One YAML/JSON document per NeXus application definition, interpreted by
//! the generic engine in `nexval-engine`. This crate owns the rule types,
//! the closed type and unit vocabularies, and the loader.
//!
//! ## Rule Tables (`definition`)
//!
//! [`ApplicationDefinition`] is a tree of [`GroupRule`]s rooted at the
//! `NXentry` rule, with [`FieldRule`], [`AttributeRule`] and [`LinkRule`]
//! leaves. Field shapes are described by [`DimensionSpec`] lists.
//!
//! ## Units (`units`)
//!
//! Unit strings are parsed into a [`Dimension`] exponent vector and
//! compared against the dimensions a [`UnitCategory`] admits.
//!
//! ## Loading (`registry`)
//!
//! [`DefinitionRegistry`] validates each document against the embedded
//! `definition.schema.json` (Draft 2020-12), deserializes it, and runs the
//! cross-field consistency checks before indexing it by name.
//!
//! ## Crate Policy
//!
//! - Depends only on `nexval-core` internally.
//! - Definition loading is a trust boundary: invalid documents are rejected
//!   with structured violations, never partially registered.

pub mod definition;
pub mod registry;
pub mod types;
pub mod units;

pub use definition::{ApplicationDefinition, AttributeRule, DefinitionIssue, DimensionSpec, FieldRule, GroupRule, LinkRule};
pub use registry::{DefinitionError, DefinitionRegistry, Violation, Violations, DEFINITION_SCHEMA};
pub use types::{NexusType, Requirement, UnitCategory};
pub use units::{parse_unit, Dimension, UnitParseError, UnitRejection};
