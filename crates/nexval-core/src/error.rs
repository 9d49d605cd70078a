//! # Error Types — Tree Model Errors
//!
//! Errors raised while building or reading the in-memory tree. These are
//! operational errors, distinct from conformance findings: a tree that
//! fails to decode never reaches the validation engine.

use thiserror::Error;

/// Error constructing, decoding, or reading a tree node.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    /// A JSON value could not be interpreted as data of the declared type.
    #[error("invalid {dtype} value at '{path}': {reason}")]
    InvalidValue {
        /// Path of the node being decoded.
        path: String,
        /// Declared element type.
        dtype: String,
        /// What was wrong with the value.
        reason: String,
    },

    /// The number of elements does not agree with the declared shape.
    #[error("field '{path}' declares shape {shape:?} ({expected} elements) but holds {actual} values")]
    ShapeMismatch {
        /// Path of the field.
        path: String,
        /// Declared shape.
        shape: Vec<usize>,
        /// Element count implied by the shape.
        expected: usize,
        /// Element count actually present.
        actual: usize,
    },

    /// Two children of the same group share a name.
    #[error("group '{path}' has more than one child named '{name}'")]
    DuplicateChild {
        /// Path of the group.
        path: String,
        /// Duplicated child name.
        name: String,
    },

    /// Lazily-loaded data could not be read from its backing store.
    #[error("failed to load data for '{path}': {reason}")]
    LoadFailed {
        /// Path of the field whose data failed to load.
        path: String,
        /// Backend-specific reason.
        reason: String,
    },

    /// A path does not lead to a node, or link-following did not terminate.
    #[error("cannot resolve '{path}': {reason}")]
    Unresolved {
        /// The path, or the first segment of it that failed.
        path: String,
        /// Why resolution stopped.
        reason: String,
    },

    /// The tree document is not valid JSON or does not match the tree layout.
    #[error("tree document error: {0}")]
    Document(String),
}

impl From<serde_json::Error> for TreeError {
    fn from(e: serde_json::Error) -> Self {
        TreeError::Document(e.to_string())
    }
}
