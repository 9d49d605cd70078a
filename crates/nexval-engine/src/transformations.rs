//! # Transformation Chains
//!
//! Follows `depends_on` references from a starting value through the
//! transformation fields of an entry's `NXtransformations` groups. The
//! walk ends at `"."` or at a transformation without a `depends_on`
//! attribute. References are trimmed and lose trailing slashes, so `"./"`
//! also ends the chain; an empty reference names nothing and breaks it. It visits each field at most once and takes at most as many
//! steps as there are transformation fields, so it always terminates.
//!
//! Each visited step is also checked for a well-formed
//! `transformation_type`, a three-component `vector`, and units that fit
//! the transformation type.

use std::collections::HashSet;

use nexval_core::{Field, Group, Node, NodePath, NodeRef};
use nexval_schema::UnitCategory;

use crate::checks::check_units;
use crate::links::EntryContext;
use crate::report::{FindingKind, ValidationReport};

/// `depends_on` value that ends a chain.
pub const CHAIN_END: &str = ".";

pub const DEPENDS_ON: &str = "depends_on";
pub const TRANSFORMATION_TYPE: &str = "transformation_type";
pub const VECTOR: &str = "vector";

/// Walk the chain starting at `start`, resolved relative to `base` (the
/// group holding the starting reference).
pub fn validate_transformations(
    report: &mut ValidationReport,
    ctx: &EntryContext<'_>,
    groups: &[(NodePath, &Group)],
    start: &str,
    base: &NodePath,
) {
    let bound: usize = groups
        .iter()
        .map(|(_, g)| g.children().iter().filter(|c| !matches!(c, Node::Group(_))).count())
        .sum();
    let mut visited: HashSet<NodePath> = HashSet::new();
    let mut steps = 0;
    let mut reference = normalize(start).to_string();
    let mut from = base.clone();

    while reference != CHAIN_END {
        if reference.is_empty() {
            report.record(
                from,
                FindingKind::BrokenTransformationChain,
                "empty depends_on does not name a transformation",
            );
            return;
        }
        let target = from.join(&reference);
        if visited.contains(&target) {
            report.record(
                target.clone(),
                FindingKind::TransformationCycle,
                format!("depends_on chain from {base} returns to {target}"),
            );
            return;
        }
        let Some((path, field)) = find_transformation(ctx, groups, &target) else {
            report.record(
                target,
                FindingKind::BrokenTransformationChain,
                format!("depends_on '{reference}' does not name a transformation"),
            );
            return;
        };
        if steps >= bound {
            report.record(
                path,
                FindingKind::TransformationCycle,
                format!("depends_on chain from {base} exceeds {bound} steps"),
            );
            return;
        }
        tracing::trace!(step = %path, "following transformation");
        check_step(report, &path, field);
        steps += 1;
        visited.insert(target);
        visited.insert(path.clone());

        match field.attribute(DEPENDS_ON).and_then(|a| a.value.as_scalar_str()) {
            Some(next) => {
                reference = normalize(next).to_string();
                from = path.parent();
            }
            None => return,
        }
    }
}

fn normalize(reference: &str) -> &str {
    let reference = reference.trim();
    match reference.trim_end_matches('/') {
        "" => reference,
        trimmed => trimmed,
    }
}

/// Locate the transformation field at `target`, either directly in one
/// of `groups` or by resolving the path through the tree.
fn find_transformation<'g>(
    ctx: &EntryContext<'g>,
    groups: &[(NodePath, &'g Group)],
    target: &NodePath,
) -> Option<(NodePath, &'g Field)> {
    let name = target.name()?;
    let parent = target.parent();
    for (group_path, group) in groups {
        if *group_path == parent {
            let node = group.child(name)?;
            let resolved = ctx.follow(group_path, node).ok()?;
            return resolved.node.as_field().map(|f| (target.clone(), f));
        }
    }

    // The reference may pass through a link into a transformation group.
    let resolved = ctx.tree.resolve(target, ctx.max_link_hops).ok()?;
    let NodeRef::Field(field) = resolved.node else {
        return None;
    };
    groups
        .iter()
        .any(|(group_path, _)| resolved.path.parent() == *group_path)
        .then_some((resolved.path, field))
}

fn check_step(report: &mut ValidationReport, path: &NodePath, field: &Field) {
    let kind = field.attribute(TRANSFORMATION_TYPE).and_then(|a| a.value.as_scalar_str());
    match kind {
        None => report.record(
            path.attribute(TRANSFORMATION_TYPE),
            FindingKind::MissingRequired,
            "transformation has no transformation_type",
        ),
        Some("translation") => check_units(report, path, field, UnitCategory::Length),
        Some("rotation") => check_units(report, path, field, UnitCategory::Angle),
        Some(other) => report.record(
            path.attribute(TRANSFORMATION_TYPE),
            FindingKind::EnumerationViolation,
            format!("'{other}' not in [translation, rotation]"),
        ),
    }

    match field.attribute(VECTOR) {
        None => report.record(path.attribute(VECTOR), FindingKind::MissingRequired, "transformation has no vector"),
        Some(vector) if vector.value.len() != 3 || !vector.value.element_type().is_numeric() => report.record(
            path.attribute(VECTOR),
            FindingKind::DimensionMismatch,
            format!(
                "vector must be 3 numbers, found {} {} value(s)",
                vector.value.len(),
                vector.value.element_type()
            ),
        ),
        Some(_) => {}
    }
}
