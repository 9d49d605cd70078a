//! # nexval-engine — Conformance Engine
//!
//! Checks an in-memory NeXus tree against an application definition and
//! produces a [`ValidationReport`].
//!
//! ## Architecture
//!
//! - [`checks`]: presence, type, unit, and enumeration checks on one node.
//! - [`dimensions`] and [`scope`]: rank checks and symbolic dimension
//!   binding with stack-scoped symbol tables.
//! - [`links`]: the entry context and link resolution.
//! - [`transformations`]: `depends_on` chain walking with a termination
//!   bound.
//! - [`validator`]: the generic traversal tying these together.
//!
//! ## Usage
//!
//! ```ignore
//! let registry = DefinitionRegistry::from_dir("definitions")?;
//! let definition = registry.require("NXmx")?;
//! let report = Validator::new(definition, ValidationOptions::default()).validate_tree(&tree);
//! report.into_result()?; // strict: first finding becomes an error
//! ```
//!
//! ## Crate Policy
//!
//! - Conformance failures are findings, never `Err`. Only
//!   [`ValidationReport::into_result`] turns them into an error.
//! - The tree and definition are borrowed immutably; a pass owns all of
//!   its mutable state.

pub mod checks;
pub mod dimensions;
pub mod links;
pub mod options;
pub mod report;
pub mod scope;
pub mod transformations;
pub mod validator;

pub use links::{check_link, EntryContext};
pub use options::{FailurePolicy, LinkResolution, ValidationOptions, DEFAULT_MAX_LINK_HOPS};
pub use report::{ConformanceError, FindingKind, ValidationFinding, ValidationReport};
pub use scope::{Binding, DimensionScope, DimensionScopes};
pub use transformations::validate_transformations;
pub use validator::Validator;
