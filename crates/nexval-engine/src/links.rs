//! # Entry Context and Link Checks
//!
//! [`EntryContext`] carries the entry being validated so that link and
//! transformation checks can resolve paths relative to it.
//!
//! Declared link targets are written in class notation relative to the
//! entry, e.g. `/NXentry/NXinstrument/NXdetector/data`. Each segment
//! matches a child by name first and by `NX_class` otherwise, keeping
//! every same-class candidate.

use nexval_core::{Group, NexusTree, Node, NodePath, NodeRef, Resolved};
use nexval_schema::{LinkRule, Requirement};

use crate::options::LinkResolution;
use crate::report::{FindingKind, ValidationReport};

/// The tree and entry a traversal is working in.
#[derive(Debug, Clone)]
pub struct EntryContext<'t> {
    pub tree: &'t NexusTree,
    pub entry_path: NodePath,
    pub entry: &'t Group,
    pub max_link_hops: usize,
}

impl<'t> EntryContext<'t> {
    pub fn new(tree: &'t NexusTree, entry_path: NodePath, entry: &'t Group, max_link_hops: usize) -> Self {
        Self {
            tree,
            entry_path,
            entry,
            max_link_hops,
        }
    }

    /// Follow a child node of the group at `parent` through any soft links.
    pub fn follow(&self, parent: &NodePath, node: &'t Node) -> Result<Resolved<'t>, nexval_core::TreeError> {
        self.tree.follow(parent, node, self.max_link_hops)
    }

    /// Every group of `nx_class` at or below the entry, depth first. Links
    /// are not followed.
    pub fn groups_of_class(&self, nx_class: &str) -> Vec<(NodePath, &'t Group)> {
        let mut found = Vec::new();
        collect_groups(&self.entry_path, self.entry, nx_class, &mut found);
        found
    }

    /// Nodes a class-notation target denotes within this entry.
    pub fn resolve_target(&self, target: &str) -> Vec<Resolved<'t>> {
        let target = NodePath::parse(target);
        let mut segments = target.segments();
        if let Some(first) = segments.first() {
            if Some(first.as_str()) == self.entry.nx_class() || first == self.entry.name() {
                segments = &segments[1..];
            }
        }

        let mut frontier = vec![Resolved {
            path: self.entry_path.clone(),
            node: NodeRef::Group(self.entry),
        }];
        for segment in segments {
            let mut next = Vec::new();
            for current in &frontier {
                let Some(group) = current.node.as_group() else {
                    continue;
                };
                if let Some(child) = group.child(segment) {
                    if let Ok(resolved) = self.follow(&current.path, child) {
                        next.push(resolved);
                    }
                } else {
                    for g in group.groups_of_class(segment) {
                        next.push(Resolved {
                            path: current.path.child(g.name()),
                            node: NodeRef::Group(g),
                        });
                    }
                }
            }
            frontier = next;
        }
        frontier
    }
}

fn collect_groups<'t>(path: &NodePath, group: &'t Group, nx_class: &str, out: &mut Vec<(NodePath, &'t Group)>) {
    if group.nx_class() == Some(nx_class) {
        out.push((path.clone(), group));
    }
    for child in group.children() {
        if let Node::Group(g) = child {
            collect_groups(&path.child(g.name()), g, nx_class, out);
        }
    }
}

/// Check the node named `rule.name` inside `parent` (at `parent_path`).
///
/// Under [`LinkResolution::Local`] the node only has to exist. Under
/// [`LinkResolution::Full`] it must also resolve to the declared target:
/// a soft link must land on a target candidate, and a stored field must
/// agree with a candidate in element type and shape.
pub fn check_link(
    report: &mut ValidationReport,
    ctx: &EntryContext<'_>,
    parent_path: &NodePath,
    parent: &Group,
    rule: &LinkRule,
    resolution: LinkResolution,
) {
    let path = parent_path.child(&rule.name);
    let Some(node) = parent.child(&rule.name) else {
        match rule.requirement {
            Requirement::Required => {
                report.record(path, FindingKind::UnresolvedLink, format!("no node links to {}", rule.target));
            }
            Requirement::Recommended => tracing::debug!(path = %path, "recommended link is absent"),
            Requirement::Optional => {}
        }
        return;
    };
    if resolution == LinkResolution::Local {
        return;
    }

    let resolved = match ctx.tree.follow(parent_path, node, ctx.max_link_hops) {
        Ok(resolved) => resolved,
        Err(e) => {
            report.record(path, FindingKind::UnresolvedLink, e.to_string());
            return;
        }
    };
    let candidates = ctx.resolve_target(&rule.target);
    if candidates.is_empty() {
        report.record(
            path,
            FindingKind::UnresolvedLink,
            format!("target {} does not resolve in {}", rule.target, ctx.entry_path),
        );
        return;
    }
    if candidates.iter().any(|c| c.node.same_node(&resolved.node)) {
        return;
    }

    let message = match (node, resolved.node) {
        (Node::Link(_), _) => format!("links to {}, expected {}", resolved.path, rule.target),
        (_, NodeRef::Field(field)) => {
            let agrees = candidates.iter().any(|c| {
                c.node
                    .as_field()
                    .is_some_and(|t| t.dtype() == field.dtype() && t.shape() == field.shape())
            });
            if agrees {
                return;
            }
            format!(
                "{} field of shape {:?} does not match target {}",
                field.dtype(),
                field.shape(),
                rule.target
            )
        }
        (_, NodeRef::Group(_)) => format!("is a separate group, expected a link to {}", rule.target),
    };
    report.record(path, FindingKind::UnresolvedLink, message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexval_core::{Field, Value};

    fn tree(data_group: Group) -> NexusTree {
        let detector = Group::new("det", Some("NXdetector"))
            .with_field(Field::new("data", Value::Uint(vec![0; 4]), vec![2, 2]).unwrap());
        let instrument = Group::new("instrument", Some("NXinstrument")).with_group(detector);
        let entry = Group::new("entry", Some("NXentry")).with_group(instrument).with_group(data_group);
        NexusTree::new(Group::default().with_group(entry))
    }

    fn rule() -> LinkRule {
        LinkRule {
            name: "data".to_string(),
            target: "/NXentry/NXinstrument/NXdetector/data".to_string(),
            requirement: Requirement::Required,
        }
    }

    fn run(tree: &NexusTree, resolution: LinkResolution) -> ValidationReport {
        let entry = tree.root().group("entry").unwrap();
        let ctx = EntryContext::new(tree, NodePath::parse("/entry"), entry, 8);
        let data = entry.group("plot").unwrap();
        let mut report = ValidationReport::new("NXtest");
        check_link(&mut report, &ctx, &NodePath::parse("/entry/plot"), data, &rule(), resolution);
        report
    }

    #[test]
    fn target_resolves_by_class() {
        let t = tree(Group::new("plot", Some("NXdata")));
        let entry = t.root().group("entry").unwrap();
        let ctx = EntryContext::new(&t, NodePath::parse("/entry"), entry, 8);
        let found = ctx.resolve_target("/NXentry/NXinstrument/NXdetector/data");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path.to_string(), "/entry/instrument/det/data");
        assert!(ctx.resolve_target("/NXentry/NXsample/temperature").is_empty());
    }

    #[test]
    fn soft_link_to_target_passes_full_resolution() {
        let t = tree(Group::new("plot", Some("NXdata")).with_link("data", "/entry/instrument/det/data"));
        assert!(run(&t, LinkResolution::Full).is_empty());
    }

    #[test]
    fn missing_link_is_unresolved_in_both_modes() {
        let t = tree(Group::new("plot", Some("NXdata")));
        for mode in [LinkResolution::Local, LinkResolution::Full] {
            let r = run(&t, mode);
            assert_eq!(r.count(FindingKind::UnresolvedLink), 1);
        }
    }

    #[test]
    fn dangling_link_only_fails_full_resolution() {
        let t = tree(Group::new("plot", Some("NXdata")).with_link("data", "/entry/nowhere"));
        assert!(run(&t, LinkResolution::Local).is_empty());
        assert_eq!(run(&t, LinkResolution::Full).count(FindingKind::UnresolvedLink), 1);
    }

    #[test]
    fn link_to_wrong_node_is_unresolved() {
        let plot = Group::new("plot", Some("NXdata"))
            .with_field(Field::scalar("other", Value::Int(vec![1])))
            .with_link("data", "/entry/plot/other");
        let r = run(&tree(plot), LinkResolution::Full);
        assert_eq!(r.len(), 1);
        assert!(r.findings()[0].message.contains("/entry/plot/other"));
    }

    #[test]
    fn copied_field_must_match_type_and_shape() {
        let same = Group::new("plot", Some("NXdata"))
            .with_field(Field::new("data", Value::Uint(vec![9; 4]), vec![2, 2]).unwrap());
        assert!(run(&tree(same), LinkResolution::Full).is_empty());

        let different = Group::new("plot", Some("NXdata"))
            .with_field(Field::new("data", Value::Float(vec![0.0; 4]), vec![4]).unwrap());
        assert_eq!(run(&tree(different), LinkResolution::Full).count(FindingKind::UnresolvedLink), 1);
    }
}
