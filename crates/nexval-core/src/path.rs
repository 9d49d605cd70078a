//! # Node Paths
//!
//! Absolute, slash-separated addresses of nodes in a tree, with an optional
//! `@attribute` suffix. Every finding the engine produces names its target
//! through a [`NodePath`], so the rendering here is what users see.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Absolute path of a group, field, or attribute.
///
/// `/entry/sample/temperature` addresses a field; appending an attribute
/// gives `/entry/sample/temperature@units`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodePath {
    segments: Vec<String>,
    attribute: Option<String>,
}

impl NodePath {
    /// The tree root, rendered as `/`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse an absolute path. Empty segments and `.` are ignored and `..`
    /// steps to the parent, so `//entry/./sample/../sample` is `/entry/sample`.
    pub fn parse(path: &str) -> Self {
        let (node_part, attribute) = match path.split_once('@') {
            Some((node, attr)) if !attr.is_empty() => (node, Some(attr.to_string())),
            Some((node, _)) => (node, None),
            None => (path, None),
        };
        let mut out = Self::root().join(node_part);
        out.attribute = attribute;
        out
    }

    /// Child path of this node.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self {
            segments,
            attribute: None,
        }
    }

    /// Path of an attribute attached to this node.
    pub fn attribute(&self, name: &str) -> Self {
        Self {
            segments: self.segments.clone(),
            attribute: Some(name.to_string()),
        }
    }

    /// Resolve `relative` against this path. An absolute `relative` replaces
    /// this path entirely.
    pub fn join(&self, relative: &str) -> Self {
        let mut segments = if relative.starts_with('/') {
            Vec::new()
        } else {
            self.segments.clone()
        };
        for part in relative.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                name => segments.push(name.to_string()),
            }
        }
        Self {
            segments,
            attribute: None,
        }
    }

    /// Parent node path. The root is its own parent.
    pub fn parent(&self) -> Self {
        if self.attribute.is_some() {
            return Self {
                segments: self.segments.clone(),
                attribute: None,
            };
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Self {
            segments,
            attribute: None,
        }
    }

    /// Final node name, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Attribute name, if this path addresses an attribute.
    pub fn attribute_name(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// Node name segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty() && self.attribute.is_none()
    }

    /// Whether `self` lies at or below `ancestor`.
    pub fn starts_with(&self, ancestor: &NodePath) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "/")?;
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        if let Some(attr) = &self.attribute {
            write!(f, "@{attr}")?;
        }
        Ok(())
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodePath::parse(&s))
    }
}
