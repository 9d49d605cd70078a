//! # Application Definitions
//!
//! The data-driven replacement for per-definition generated validators.
//! An [`ApplicationDefinition`] is a tree of rules rooted at the `NXentry`
//! rule; the engine interprets it generically.
//!
//! ## File Format
//!
//! ```yaml
//! name: NXmonitored
//! symbols: [nP]
//! entry:
//!   nx_class: NXentry
//!   fields:
//!     - { name: definition, type: NX_CHAR, enumeration: [NXmonitored] }
//!   groups:
//!     - nx_class: NXmonitor
//!       resets_dimension_scope: true
//!       fields:
//!         - { name: mode, type: NX_CHAR, enumeration: [monitor, timer] }
//!         - { name: data, type: NX_NUMBER, units: NX_ANY, rank: 1, dimensions: [nP] }
//! ```
//!
//! Dimension descriptors are integers (literal extents), strings (symbols),
//! or `null` (any number of leading axes, first position only).

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use nexval_core::Group;

use crate::types::{NexusType, Requirement, UnitCategory};

/// One named schema: the rules an entry must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationDefinition {
    /// Definition name as written in an entry's `definition` field.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Dimension symbols shared by the whole entry. Any other symbol is
    /// scoped to the nearest group that resets dimension scope.
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Rule for each selected `NXentry` group.
    pub entry: GroupRule,
}

/// Expectations for a group and, recursively, its contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupRule {
    /// Fixed name. When absent, every child of class `nx_class` matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub nx_class: String,
    #[serde(default)]
    pub requirement: Requirement,
    /// Upper bound on matching instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_occurs: Option<usize>,
    /// Start a fresh dimension-symbol scope for each instance.
    #[serde(default)]
    pub resets_dimension_scope: bool,
    /// Follow this group's `depends_on` field through the entry's
    /// transformation groups.
    #[serde(default)]
    pub validate_transformations: bool,
    #[serde(default)]
    pub attributes: Vec<AttributeRule>,
    #[serde(default)]
    pub fields: Vec<FieldRule>,
    #[serde(default)]
    pub groups: Vec<GroupRule>,
    #[serde(default)]
    pub links: Vec<LinkRule>,
}

impl GroupRule {
    /// Empty rule for groups of `nx_class`.
    pub fn new(nx_class: impl Into<String>) -> Self {
        Self {
            name: None,
            nx_class: nx_class.into(),
            requirement: Requirement::Required,
            max_occurs: None,
            resets_dimension_scope: false,
            validate_transformations: false,
            attributes: Vec::new(),
            fields: Vec::new(),
            groups: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Label used in messages: the fixed name, else the class.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.nx_class)
    }

    /// Whether this rule applies to `group`, found under `child_name` in
    /// its parent. The name may be a link's name rather than the group's.
    ///
    /// A named rule matches the child of that name when its class agrees
    /// (or it has no class); an unnamed rule matches every group of the class.
    pub fn admits(&self, child_name: &str, group: &Group) -> bool {
        match &self.name {
            Some(name) => name == child_name && group.nx_class().map_or(true, |c| c == self.nx_class),
            None => group.nx_class() == Some(self.nx_class.as_str()),
        }
    }
}

/// Expectations for a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldRule {
    pub name: String,
    #[serde(default)]
    pub requirement: Requirement,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub nx_type: Option<NexusType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<UnitCategory>,
    /// Allowed values; empty means unconstrained.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enumeration: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<DimensionSpec>,
    #[serde(default)]
    pub attributes: Vec<AttributeRule>,
}

impl FieldRule {
    /// Required field with no constraints beyond presence.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirement: Requirement::Required,
            nx_type: None,
            units: None,
            enumeration: Vec::new(),
            rank: None,
            dimensions: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

/// Expectations for an attribute of a group or field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeRule {
    pub name: String,
    #[serde(default)]
    pub requirement: Requirement,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub nx_type: Option<NexusType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enumeration: Vec<String>,
}

impl AttributeRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirement: Requirement::Required,
            nx_type: None,
            enumeration: Vec::new(),
        }
    }
}

/// A node that must be a link to a canonical location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkRule {
    pub name: String,
    /// Target path relative to the entry, e.g.
    /// `/NXentry/NXinstrument/NXdetector/data`. Segments match child names
    /// first and `NX_class` otherwise.
    pub target: String,
    #[serde(default)]
    pub requirement: Requirement,
}

/// One axis descriptor of a field's expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<DimensionRepr>", into = "Option<DimensionRepr>")]
pub enum DimensionSpec {
    /// Any number of leading axes (`null` in files).
    Any,
    /// Exact extent.
    Extent(usize),
    /// Extent bound from data and shared by every use of the symbol in scope.
    Symbol(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DimensionRepr {
    Extent(usize),
    Symbol(String),
}

impl From<Option<DimensionRepr>> for DimensionSpec {
    fn from(repr: Option<DimensionRepr>) -> Self {
        match repr {
            None => DimensionSpec::Any,
            Some(DimensionRepr::Extent(n)) => DimensionSpec::Extent(n),
            Some(DimensionRepr::Symbol(s)) => DimensionSpec::Symbol(s),
        }
    }
}

impl From<DimensionSpec> for Option<DimensionRepr> {
    fn from(spec: DimensionSpec) -> Self {
        match spec {
            DimensionSpec::Any => None,
            DimensionSpec::Extent(n) => Some(DimensionRepr::Extent(n)),
            DimensionSpec::Symbol(s) => Some(DimensionRepr::Symbol(s)),
        }
    }
}

impl fmt::Display for DimensionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionSpec::Any => f.write_str("*"),
            DimensionSpec::Extent(n) => write!(f, "{n}"),
            DimensionSpec::Symbol(s) => f.write_str(s),
        }
    }
}

// ─── Consistency ─────────────────────────────────────────────────────

/// A structural problem in a definition that JSON Schema cannot express.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionIssue {
    /// Dotted location within the definition, e.g. `entry.NXinstrument.data`.
    pub location: String,
    pub message: String,
}

impl fmt::Display for DefinitionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}: {}", self.location, self.message)
    }
}

impl ApplicationDefinition {
    /// Whether `symbol` is shared across the whole entry.
    pub fn is_definition_symbol(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    /// Cross-field checks: rank agrees with the dimension list, `null`
    /// appears only first, and names are unique within a group.
    pub fn consistency_issues(&self) -> Vec<DefinitionIssue> {
        let mut issues = Vec::new();
        if self.entry.nx_class != "NXentry" && self.entry.nx_class != "NXsubentry" {
            issues.push(DefinitionIssue {
                location: "entry".to_string(),
                message: format!("entry rule must be NXentry or NXsubentry, found {}", self.entry.nx_class),
            });
        }
        check_group(&self.entry, "entry", &mut issues);
        issues
    }
}

fn check_group(rule: &GroupRule, location: &str, issues: &mut Vec<DefinitionIssue>) {
    let mut names = HashSet::new();
    for name in rule
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .chain(rule.links.iter().map(|l| l.name.as_str()))
        .chain(rule.groups.iter().filter_map(|g| g.name.as_deref()))
    {
        if !names.insert(name) {
            issues.push(DefinitionIssue {
                location: location.to_string(),
                message: format!("'{name}' is declared more than once"),
            });
        }
    }

    if rule.max_occurs == Some(0) && rule.requirement.is_required() {
        issues.push(DefinitionIssue {
            location: location.to_string(),
            message: "required group cannot have max_occurs 0".to_string(),
        });
    }

    for field in &rule.fields {
        let field_location = format!("{location}.{}", field.name);
        if let Some(pos) = field.dimensions.iter().skip(1).position(|d| *d == DimensionSpec::Any) {
            issues.push(DefinitionIssue {
                location: field_location.clone(),
                message: format!("null dimension at position {} (only the first may be null)", pos + 1),
            });
        }
        let open_leading = field.dimensions.first() == Some(&DimensionSpec::Any);
        if let Some(rank) = field.rank {
            if !field.dimensions.is_empty() && !open_leading && field.dimensions.len() != rank {
                issues.push(DefinitionIssue {
                    location: field_location,
                    message: format!("rank {rank} disagrees with {} dimension descriptors", field.dimensions.len()),
                });
            }
        }
    }

    for group in &rule.groups {
        check_group(group, &format!("{location}.{}", group.label()), issues);
    }
}
