//! # nexval-core — Tree Model for NeXus Conformance Checking
//!
//! The read-only data source the conformance engine walks: an in-memory
//! hierarchy of groups, fields, attributes, and soft links, mirroring the
//! NeXus/HDF5 object model.
//!
//! ## Key Design Principles
//!
//! 1. **Read-only once built.** The engine borrows a [`NexusTree`] and never
//!    mutates it, so one tree can be validated against several definitions
//!    concurrently.
//!
//! 2. **Paths are values.** Every node address is a [`NodePath`]; link
//!    targets, finding locations, and transformation references all use it.
//!
//! 3. **Data may be lazy.** A [`Field`] knows its element type and shape
//!    without holding its values. Storage backends implement [`LazyData`] to
//!    defer reads until a check needs them.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `nexval-*` crates (this is the leaf of the DAG).
//! - No file or HDF5 I/O. Tree documents are decoded from JSON only.
//! - No `.unwrap()` outside tests.

pub mod document;
pub mod error;
pub mod path;
pub mod tree;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use error::TreeError;
pub use path::NodePath;
pub use tree::{Attribute, Field, FieldData, Group, LazyData, Link, NexusTree, Node, NodeRef, Resolved, UNITS_ATTRIBUTE};
pub use value::{ElementType, Value};
