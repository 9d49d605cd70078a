//! # Tree Documents
//!
//! JSON encoding of an in-memory tree, used by the CLI and by fixtures.
//!
//! ```json
//! {
//!   "children": [
//!     { "kind": "group", "name": "entry", "nx_class": "NXentry",
//!       "attributes": { "default": "data" },
//!       "children": [
//!         { "kind": "field", "name": "definition", "dtype": "string", "value": "NXmx" },
//!         { "kind": "field", "name": "data", "dtype": "uint", "shape": [2, 2],
//!           "value": [[1, 2], [3, 4]], "attributes": { "units": "counts" } },
//!         { "kind": "link", "name": "alias", "target": "/entry/data" }
//!       ] }
//!   ]
//! }
//! ```
//!
//! `shape` is optional and defaults to the nesting of `value`. When given,
//! it must agree with the element count, which lets a scalar be stored as
//! shape `[1]`.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value as Json;

use crate::error::TreeError;
use crate::path::NodePath;
use crate::tree::{Field, Group, Link, NexusTree, Node};
use crate::value::{ElementType, Value};

#[derive(Debug, Deserialize)]
struct GroupDoc {
    #[serde(default)]
    name: String,
    #[serde(default)]
    nx_class: Option<String>,
    #[serde(default)]
    attributes: BTreeMap<String, Json>,
    #[serde(default)]
    children: Vec<NodeDoc>,
}

#[derive(Debug, Deserialize)]
struct FieldDoc {
    name: String,
    dtype: ElementType,
    #[serde(default)]
    shape: Option<Vec<usize>>,
    value: Json,
    #[serde(default)]
    attributes: BTreeMap<String, Json>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum NodeDoc {
    Group(GroupDoc),
    Field(FieldDoc),
    Link { name: String, target: String },
}

impl NexusTree {
    /// Decode a tree document.
    pub fn from_json_str(s: &str) -> Result<Self, TreeError> {
        let doc: GroupDoc = serde_json::from_str(s)?;
        Ok(NexusTree::new(build_group(doc, &NodePath::root())?))
    }

    /// Decode a tree document that has already been parsed.
    pub fn from_json_value(json: Json) -> Result<Self, TreeError> {
        let doc: GroupDoc = serde_json::from_value(json)?;
        Ok(NexusTree::new(build_group(doc, &NodePath::root())?))
    }
}

fn build_group(doc: GroupDoc, path: &NodePath) -> Result<Group, TreeError> {
    let mut group = Group::new(doc.name, doc.nx_class.as_deref());
    for (name, json) in doc.attributes {
        let value = Value::infer_json(&json, &path.attribute(&name).to_string())?;
        group = group.with_attribute(name, value);
    }
    for child in doc.children {
        let node = match child {
            NodeDoc::Group(g) => {
                let child_path = path.child(&g.name);
                Node::Group(build_group(g, &child_path)?)
            }
            NodeDoc::Field(f) => {
                let child_path = path.child(&f.name);
                Node::Field(build_field(f, &child_path)?)
            }
            NodeDoc::Link { name, target } => Node::Link(Link { name, target }),
        };
        group.add_child(node).map_err(|e| match e {
            TreeError::DuplicateChild { name, .. } => TreeError::DuplicateChild {
                path: path.to_string(),
                name,
            },
            other => other,
        })?;
    }
    Ok(group)
}

fn build_field(doc: FieldDoc, path: &NodePath) -> Result<Field, TreeError> {
    let path_str = path.to_string();
    let (value, nested_shape) = Value::from_json(doc.dtype, &doc.value, &path_str)?;
    let shape = doc.shape.unwrap_or(nested_shape);
    let mut field = Field::new(doc.name, value, shape).map_err(|e| match e {
        TreeError::ShapeMismatch {
            shape,
            expected,
            actual,
            ..
        } => TreeError::ShapeMismatch {
            path: path_str.clone(),
            shape,
            expected,
            actual,
        },
        other => other,
    })?;
    for (name, json) in doc.attributes {
        let value = Value::infer_json(&json, &path.attribute(&name).to_string())?;
        field = field.with_attribute(name, value);
    }
    Ok(field)
}
