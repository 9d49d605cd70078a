//! # Rank and Dimension Checks
//!
//! Literal extents must match exactly. Symbols bind on first use within
//! their scope and must agree afterwards; a disagreement names the symbol,
//! the bound extent and where it was bound. A leading `null` descriptor
//! stands for any number of leading axes, so the remaining descriptors
//! are matched against the field's trailing axes.

use nexval_core::{Field, NodePath};
use nexval_schema::DimensionSpec;

use crate::report::{FindingKind, ValidationReport};
use crate::scope::DimensionScopes;

/// Record a `RankMismatch` when the field's rank differs from `expected`.
/// Returns whether the rank matched.
pub fn check_rank(report: &mut ValidationReport, path: &NodePath, field: &Field, expected: usize) -> bool {
    if field.rank() == expected {
        return true;
    }
    report.record(
        path.clone(),
        FindingKind::RankMismatch,
        format!("rank {} (shape {:?}), expected rank {expected}", field.rank(), field.shape()),
    );
    false
}

/// Whether `specs` starts with an open (`null`) descriptor, which
/// suppresses the rank check.
pub fn has_open_leading_axes(specs: &[DimensionSpec]) -> bool {
    specs.first() == Some(&DimensionSpec::Any)
}

/// Match the field's shape against `specs`, binding unbound symbols in
/// `scopes`. One `DimensionMismatch` is recorded per disagreeing axis.
pub fn check_dimensions(
    report: &mut ValidationReport,
    path: &NodePath,
    field: &Field,
    specs: &[DimensionSpec],
    scopes: &mut DimensionScopes,
) {
    let shape = field.shape();
    let open = has_open_leading_axes(specs);
    let fixed = if open { &specs[1..] } else { specs };

    if open && shape.len() < fixed.len() {
        report.record(
            path.clone(),
            FindingKind::DimensionMismatch,
            format!("{} axes (shape {shape:?}), at least {} expected", shape.len(), fixed.len()),
        );
        return;
    }
    if !open && shape.len() != fixed.len() {
        report.record(
            path.clone(),
            FindingKind::DimensionMismatch,
            format!("{} axes (shape {shape:?}), expected {}", shape.len(), fixed.len()),
        );
        return;
    }

    let offset = shape.len() - fixed.len();
    for (i, spec) in fixed.iter().enumerate() {
        let axis = offset + i;
        let extent = shape[axis];
        match spec {
            DimensionSpec::Any => {}
            DimensionSpec::Extent(expected) => {
                if extent != *expected {
                    report.record(
                        path.clone(),
                        FindingKind::DimensionMismatch,
                        format!("axis {axis} has extent {extent}, expected {expected}"),
                    );
                }
            }
            DimensionSpec::Symbol(symbol) => {
                if let Err(binding) = scopes.check_or_bind(symbol, extent, path) {
                    report.record(
                        path.clone(),
                        FindingKind::DimensionMismatch,
                        format!(
                            "axis {axis} has extent {extent}, but {symbol} = {} (bound by {})",
                            binding.extent, binding.bound_at
                        ),
                    );
                }
            }
        }
    }
}
