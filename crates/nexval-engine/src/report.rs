//! # Findings and Reports
//!
//! A finding is a local conformance failure at one node. Findings never
//! abort a pass; they accumulate into a [`ValidationReport`] in traversal
//! order, and the caller decides whether a non-empty report is an error.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use nexval_core::NodePath;

/// Category of a conformance failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    MissingRequired,
    TypeMismatch,
    UnitMismatch,
    EnumerationViolation,
    RankMismatch,
    DimensionMismatch,
    UnresolvedLink,
    BrokenTransformationChain,
    TransformationCycle,
    /// More instances of a group than its rule allows.
    MultiplicityViolation,
    /// Field data exists but could not be loaded.
    Unreadable,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingRequired => "missing_required",
            Self::TypeMismatch => "type_mismatch",
            Self::UnitMismatch => "unit_mismatch",
            Self::EnumerationViolation => "enumeration_violation",
            Self::RankMismatch => "rank_mismatch",
            Self::DimensionMismatch => "dimension_mismatch",
            Self::UnresolvedLink => "unresolved_link",
            Self::BrokenTransformationChain => "broken_transformation_chain",
            Self::TransformationCycle => "transformation_cycle",
            Self::MultiplicityViolation => "multiplicity_violation",
            Self::Unreadable => "unreadable",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conformance failure. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    /// Node (or `node@attribute`) the finding is about.
    pub path: NodePath,
    pub kind: FindingKind,
    pub message: String,
}

impl ValidationFinding {
    pub fn new(path: NodePath, kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.path, self.kind, self.message)
    }
}

/// Ordered, append-only record of one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    definition: String,
    entries: Vec<NodePath>,
    findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    pub fn new(definition: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            entries: Vec::new(),
            findings: Vec::new(),
        }
    }

    /// Name of the definition the tree was checked against.
    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Entries that were validated, in tree order.
    pub fn entries(&self) -> &[NodePath] {
        &self.entries
    }

    pub fn findings(&self) -> &[ValidationFinding] {
        &self.findings
    }

    pub fn push(&mut self, finding: ValidationFinding) {
        tracing::debug!(path = %finding.path, kind = %finding.kind, "{}", finding.message);
        self.findings.push(finding);
    }

    /// Shorthand for `push(ValidationFinding::new(..))`.
    pub fn record(&mut self, path: NodePath, kind: FindingKind, message: impl Into<String>) {
        self.push(ValidationFinding::new(path, kind, message));
    }

    pub(crate) fn record_entry(&mut self, path: NodePath) {
        self.entries.push(path);
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// True when no finding was recorded.
    pub fn is_conformant(&self) -> bool {
        self.findings.is_empty()
    }

    /// Number of findings of `kind`.
    pub fn count(&self, kind: FindingKind) -> usize {
        self.findings.iter().filter(|f| f.kind == kind).count()
    }

    /// Findings of `kind`, in order.
    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &ValidationFinding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }

    /// Strict surfacing: `Err` carrying the first finding when the report
    /// is non-empty.
    pub fn into_result(self) -> Result<Self, ConformanceError> {
        match self.findings.first().cloned() {
            None => Ok(self),
            Some(first) => Err(ConformanceError::NonConformant {
                definition: self.definition.clone(),
                total: self.findings.len(),
                first,
                report: Box::new(self),
            }),
        }
    }
}

/// Raised by [`ValidationReport::into_result`] for a non-conformant tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConformanceError {
    #[error("tree does not conform to {definition}: {first} ({total} finding(s) in total)")]
    NonConformant {
        definition: String,
        /// The first finding in traversal order.
        first: ValidationFinding,
        total: usize,
        /// The complete report.
        report: Box<ValidationReport>,
    },
}

impl ConformanceError {
    /// The full report behind the error.
    pub fn report(&self) -> &ValidationReport {
        match self {
            ConformanceError::NonConformant { report, .. } => report,
        }
    }
}
