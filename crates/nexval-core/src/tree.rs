//! # In-Memory Tree
//!
//! The hierarchical data model the engine reads: groups (directories with
//! an optional `NX_class`), fields (typed, shaped datasets), attributes
//! (named values on either), and soft links (named pointers to another
//! path). Children of a group are uniquely named.
//!
//! Field data may be held eagerly or behind a [`LazyData`] source that a
//! storage backend implements; the engine only loads data when a check
//! needs element values (enumerations, integer ranges, date-times).
//!
//! The tree is read-only once built. Builders replace a same-named child
//! rather than fail, so uniqueness holds by construction.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::TreeError;
use crate::path::NodePath;
use crate::value::{ElementType, Value};

/// Name of the attribute carrying a field's unit string.
pub const UNITS_ATTRIBUTE: &str = "units";

/// Deferred source of a field's element values.
pub trait LazyData: fmt::Debug + Send + Sync {
    /// Read the full flattened value.
    fn load(&self) -> Result<Value, TreeError>;
}

/// Element storage of a field.
#[derive(Debug, Clone)]
pub enum FieldData {
    Loaded(Value),
    Lazy(Arc<dyn LazyData>),
}

/// A named value attached to a group or field.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Value,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A typed, shaped dataset.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    dtype: ElementType,
    shape: Vec<usize>,
    data: FieldData,
    attributes: Vec<Attribute>,
}

impl Field {
    /// Eager field. Fails when the element count disagrees with `shape`.
    pub fn new(name: impl Into<String>, value: Value, shape: Vec<usize>) -> Result<Self, TreeError> {
        let name = name.into();
        let expected: usize = shape.iter().product();
        if expected != value.len() {
            return Err(TreeError::ShapeMismatch {
                path: name,
                shape,
                expected,
                actual: value.len(),
            });
        }
        Ok(Self {
            name,
            dtype: value.element_type(),
            shape,
            data: FieldData::Loaded(value),
            attributes: Vec::new(),
        })
    }

    /// Eager field shaped by its element count: rank 0 for one element,
    /// rank 1 otherwise.
    pub fn scalar(name: impl Into<String>, value: Value) -> Self {
        let shape = if value.len() == 1 { Vec::new() } else { vec![value.len()] };
        Self {
            name: name.into(),
            dtype: value.element_type(),
            shape,
            data: FieldData::Loaded(value),
            attributes: Vec::new(),
        }
    }

    /// Field whose values are read on demand.
    pub fn lazy(name: impl Into<String>, dtype: ElementType, shape: Vec<usize>, source: Arc<dyn LazyData>) -> Self {
        Self {
            name: name.into(),
            dtype,
            shape,
            data: FieldData::Lazy(source),
            attributes: Vec::new(),
        }
    }

    /// Builder: attach (or replace) an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        put_attribute(&mut self.attributes, Attribute::new(name, value));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> ElementType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Scalar `units` attribute, if present.
    pub fn units(&self) -> Option<&str> {
        self.attribute(UNITS_ATTRIBUTE).and_then(|a| a.value.as_scalar_str())
    }

    /// Element values, loading lazy data if needed. A lazy load whose
    /// element count disagrees with the declared shape is an error.
    pub fn values(&self) -> Result<Cow<'_, Value>, TreeError> {
        match &self.data {
            FieldData::Loaded(v) => Ok(Cow::Borrowed(v)),
            FieldData::Lazy(source) => {
                let value = source.load()?;
                let expected: usize = self.shape.iter().product();
                if value.len() != expected {
                    return Err(TreeError::ShapeMismatch {
                        path: self.name.clone(),
                        shape: self.shape.clone(),
                        expected,
                        actual: value.len(),
                    });
                }
                Ok(Cow::Owned(value))
            }
        }
    }

    /// Whether values are already in memory.
    pub fn is_loaded(&self) -> bool {
        matches!(self.data, FieldData::Loaded(_))
    }
}

/// Soft link: a named pointer to an absolute path elsewhere in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: String,
    pub target: String,
}

/// One child of a group.
#[derive(Debug, Clone)]
pub enum Node {
    Group(Group),
    Field(Field),
    Link(Link),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Group(g) => g.name(),
            Node::Field(f) => f.name(),
            Node::Link(l) => &l.name,
        }
    }
}

/// A group or field reached after following links.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Group(&'a Group),
    Field(&'a Field),
}

impl<'a> NodeRef<'a> {
    pub fn as_field(&self) -> Option<&'a Field> {
        match self {
            NodeRef::Field(f) => Some(f),
            NodeRef::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&'a Group> {
        match self {
            NodeRef::Group(g) => Some(g),
            NodeRef::Field(_) => None,
        }
    }

    /// Identity comparison: both refer to the same node in memory.
    pub fn same_node(&self, other: &NodeRef<'_>) -> bool {
        match (self, other) {
            (NodeRef::Group(a), NodeRef::Group(b)) => std::ptr::eq(*a, *b),
            (NodeRef::Field(a), NodeRef::Field(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

/// Result of resolving a path: the node and the path where it actually lives.
#[derive(Debug, Clone)]
pub struct Resolved<'a> {
    pub path: NodePath,
    pub node: NodeRef<'a>,
}

/// A directory-like node with uniquely-named children.
#[derive(Debug, Clone, Default)]
pub struct Group {
    name: String,
    nx_class: Option<String>,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Group {
    pub fn new(name: impl Into<String>, nx_class: Option<&str>) -> Self {
        Self {
            name: name.into(),
            nx_class: nx_class.map(str::to_string),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add (or replace) a child group.
    pub fn with_group(mut self, group: Group) -> Self {
        self.put_child(Node::Group(group));
        self
    }

    /// Builder: add (or replace) a child field.
    pub fn with_field(mut self, field: Field) -> Self {
        self.put_child(Node::Field(field));
        self
    }

    /// Builder: add (or replace) a soft link.
    pub fn with_link(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.put_child(Node::Link(Link {
            name: name.into(),
            target: target.into(),
        }));
        self
    }

    /// Builder: attach (or replace) an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        put_attribute(&mut self.attributes, Attribute::new(name, value));
        self
    }

    /// Add a child, rejecting duplicate names.
    pub fn add_child(&mut self, node: Node) -> Result<(), TreeError> {
        if self.child(node.name()).is_some() {
            return Err(TreeError::DuplicateChild {
                path: self.name.clone(),
                name: node.name().to_string(),
            });
        }
        self.children.push(node);
        Ok(())
    }

    fn put_child(&mut self, node: Node) {
        match self.children.iter_mut().find(|c| c.name() == node.name()) {
            Some(existing) => *existing = node,
            None => self.children.push(node),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nx_class(&self) -> Option<&str> {
        self.nx_class.as_deref()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name() == name)
    }

    /// Direct child group (links are not followed).
    pub fn group(&self, name: &str) -> Option<&Group> {
        match self.child(name) {
            Some(Node::Group(g)) => Some(g),
            _ => None,
        }
    }

    /// Direct child field (links are not followed).
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self.child(name) {
            Some(Node::Field(f)) => Some(f),
            _ => None,
        }
    }

    /// Direct child groups whose `NX_class` is `nx_class`, in insertion order.
    pub fn groups_of_class<'a, 'b: 'a>(&'b self, nx_class: &'a str) -> impl Iterator<Item = &'b Group> + 'a {
        self.children.iter().filter_map(move |c| match c {
            Node::Group(g) if g.nx_class() == Some(nx_class) => Some(g),
            _ => None,
        })
    }
}

fn put_attribute(attributes: &mut Vec<Attribute>, attribute: Attribute) {
    match attributes.iter_mut().find(|a| a.name == attribute.name) {
        Some(existing) => *existing = attribute,
        None => attributes.push(attribute),
    }
}

/// A complete tree rooted at an unnamed group.
#[derive(Debug, Clone, Default)]
pub struct NexusTree {
    root: Group,
}

impl NexusTree {
    pub fn new(root: Group) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Resolve an absolute path, following soft links. At most `max_hops`
    /// links are followed in total, which bounds resolution on cyclic links.
    pub fn resolve(&self, path: &NodePath, max_hops: usize) -> Result<Resolved<'_>, TreeError> {
        let mut hops = 0;
        self.resolve_segments(path.segments(), &mut hops, max_hops)
    }

    /// Follow `node` (a child of the group at `parent`) to the group or
    /// field it denotes.
    pub fn follow<'a>(&'a self, parent: &NodePath, node: &'a Node, max_hops: usize) -> Result<Resolved<'a>, TreeError> {
        match node {
            Node::Group(g) => Ok(Resolved {
                path: parent.child(g.name()),
                node: NodeRef::Group(g),
            }),
            Node::Field(f) => Ok(Resolved {
                path: parent.child(f.name()),
                node: NodeRef::Field(f),
            }),
            Node::Link(link) => {
                let target = parent.join(&link.target);
                let mut hops = 1;
                if hops > max_hops {
                    return Err(unresolved(&target, "too many link hops"));
                }
                self.resolve_segments(target.segments(), &mut hops, max_hops)
            }
        }
    }

    fn resolve_segments(&self, segments: &[String], hops: &mut usize, max_hops: usize) -> Result<Resolved<'_>, TreeError> {
        let mut path = NodePath::root();
        let mut group = &self.root;

        for (i, segment) in segments.iter().enumerate() {
            let is_last = i + 1 == segments.len();
            let child = group
                .child(segment)
                .ok_or_else(|| unresolved(&path.child(segment), "no such node"))?;

            let resolved = match child {
                Node::Group(g) => Resolved {
                    path: path.child(segment),
                    node: NodeRef::Group(g),
                },
                Node::Field(f) => Resolved {
                    path: path.child(segment),
                    node: NodeRef::Field(f),
                },
                Node::Link(link) => {
                    *hops += 1;
                    if *hops > max_hops {
                        return Err(unresolved(&path.child(segment), "too many link hops"));
                    }
                    let target = path.join(&link.target);
                    self.resolve_segments(target.segments(), hops, max_hops)?
                }
            };

            if is_last {
                return Ok(resolved);
            }
            match resolved.node {
                NodeRef::Group(g) => {
                    group = g;
                    path = resolved.path;
                }
                NodeRef::Field(_) => {
                    return Err(unresolved(&resolved.path, "is a field, not a group"));
                }
            }
        }

        Ok(Resolved {
            path,
            node: NodeRef::Group(group),
        })
    }
}

fn unresolved(path: &NodePath, reason: &str) -> TreeError {
    TreeError::Unresolved {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
