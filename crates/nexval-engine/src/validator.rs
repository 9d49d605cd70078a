//! # Validator
//!
//! The generic traversal. One [`Validator`] interprets any
//! [`ApplicationDefinition`]: it selects entries, walks the definition's
//! group rules over matching tree groups, and dispatches to the checkers.
//!
//! ## Traversal Order
//!
//! For each group instance: attributes, then fields (presence, type,
//! units, enumeration, rank, dimensions, field attributes), then links,
//! then child groups in rule order, then the transformation chain.
//! Findings are recorded in that order, so reports are deterministic.
//!
//! ## Failure Policy
//!
//! Under [`FailurePolicy::FailFastPerBranch`] a group instance is broken
//! when one of its required attributes, fields or links is missing, or a
//! required node fails its type check. A broken group does not descend
//! into child groups or walk its transformation chain. Unit, enumeration,
//! rank and dimension findings never stop descent. Absent nodes never get
//! dependent checks under either policy.
//!
//! Child groups may be soft links. A link is followed and the group it
//! lands on is checked under the link's own path.

use nexval_core::{Attribute, Group, NexusTree, Node, NodePath, NodeRef};
use nexval_schema::{ApplicationDefinition, AttributeRule, FieldRule, GroupRule, Requirement};

use crate::checks::{
    check_attribute_enumeration, check_attribute_type, check_enumeration, check_presence, check_type, check_units,
    load_values,
};
use crate::dimensions::{check_dimensions, check_rank, has_open_leading_axes};
use crate::links::{check_link, EntryContext};
use crate::options::{FailurePolicy, ValidationOptions};
use crate::report::{FindingKind, ValidationReport};
use crate::scope::DimensionScopes;
use crate::transformations::{validate_transformations, DEPENDS_ON};

/// Name of the field through which an entry declares its definition.
pub const DEFINITION_FIELD: &str = "definition";

/// Checks trees against one application definition.
///
/// Holds no per-pass state; every `validate_*` call owns its report and
/// scopes, so one validator can serve concurrent passes.
#[derive(Debug, Clone)]
pub struct Validator<'d> {
    definition: &'d ApplicationDefinition,
    options: ValidationOptions,
}

impl<'d> Validator<'d> {
    pub fn new(definition: &'d ApplicationDefinition, options: ValidationOptions) -> Self {
        Self { definition, options }
    }

    pub fn definition(&self) -> &'d ApplicationDefinition {
        self.definition
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validate every selected entry of `tree`.
    ///
    /// Entries are the root's groups of the definition's entry class whose
    /// `definition` field names this definition, or all of them when
    /// `all_entries` is set. Selecting none is itself a finding.
    pub fn validate_tree(&self, tree: &NexusTree) -> ValidationReport {
        let mut report = ValidationReport::new(&self.definition.name);
        let root = NodePath::root();
        let entry_class = self.definition.entry.nx_class.as_str();

        let mut selected = 0;
        for entry in tree.root().groups_of_class(entry_class) {
            let path = root.child(entry.name());
            if !self.options.all_entries && !self.declares_definition(entry) {
                tracing::debug!(entry = %path, definition = %self.definition.name, "entry declares another definition, skipping");
                continue;
            }
            selected += 1;
            self.check_entry(tree, path, entry, &mut report);
        }

        if selected == 0 {
            report.record(
                root,
                FindingKind::MissingRequired,
                format!("no {entry_class} declares definition {}", self.definition.name),
            );
        }
        tracing::info!(
            definition = %self.definition.name,
            entries = selected,
            findings = report.len(),
            "validation finished"
        );
        report
    }

    /// Validate the single entry at `entry_path`, regardless of its
    /// `definition` field.
    pub fn validate_entry(&self, tree: &NexusTree, entry_path: &NodePath) -> ValidationReport {
        let mut report = ValidationReport::new(&self.definition.name);
        match tree.resolve(entry_path, self.options.max_link_hops) {
            Ok(resolved) => match resolved.node {
                NodeRef::Group(entry) => self.check_entry(tree, resolved.path, entry, &mut report),
                NodeRef::Field(_) => report.record(
                    entry_path.clone(),
                    FindingKind::TypeMismatch,
                    format!("expected a {} group, found a field", self.definition.entry.nx_class),
                ),
            },
            Err(e) => report.record(entry_path.clone(), FindingKind::MissingRequired, e.to_string()),
        }
        tracing::info!(
            definition = %self.definition.name,
            entry = %entry_path,
            findings = report.len(),
            "validation finished"
        );
        report
    }

    fn declares_definition(&self, entry: &Group) -> bool {
        let Some(field) = entry.field(DEFINITION_FIELD) else {
            return false;
        };
        match field.values() {
            Ok(values) => values.as_scalar_str().map(str::trim) == Some(self.definition.name.as_str()),
            Err(e) => {
                tracing::warn!(entry = %entry.name(), error = %e, "cannot read definition field");
                false
            }
        }
    }

    fn check_entry<'t>(&self, tree: &'t NexusTree, path: NodePath, entry: &'t Group, report: &mut ValidationReport) {
        tracing::debug!(entry = %path, definition = %self.definition.name, "validating entry");
        report.record_entry(path.clone());
        let ctx = EntryContext::new(tree, path.clone(), entry, self.options.max_link_hops);
        let mut scopes = DimensionScopes::new(self.definition.symbols.iter().cloned());
        self.check_group(&ctx, &mut scopes, &self.definition.entry, &path, entry, report);
    }

    // ─── Groups ──────────────────────────────────────────────────────

    fn check_group<'t>(
        &self,
        ctx: &EntryContext<'t>,
        scopes: &mut DimensionScopes,
        rule: &GroupRule,
        path: &NodePath,
        group: &'t Group,
        report: &mut ValidationReport,
    ) {
        if rule.resets_dimension_scope {
            tracing::debug!(group = %path, "new dimension scope");
            scopes.push();
        }
        let mut broken = false;

        for attribute in &rule.attributes {
            let attr_path = path.attribute(&attribute.name);
            broken |= self.check_attribute(report, &attr_path, group.attribute(&attribute.name), attribute);
        }
        for field in &rule.fields {
            broken |= self.check_field(ctx, scopes, path, group, field, report);
        }
        for link in &rule.links {
            broken |= link.requirement == Requirement::Required && group.child(&link.name).is_none();
            check_link(report, ctx, path, group, link, self.options.link_resolution);
        }

        if broken && self.options.failure_policy == FailurePolicy::FailFastPerBranch {
            tracing::debug!(group = %path, "required node missing or mistyped, not descending");
        } else {
            for child_rule in &rule.groups {
                self.check_child_groups(ctx, scopes, child_rule, path, group, report);
            }
            if rule.validate_transformations {
                self.check_transformations(ctx, path, group, report);
            }
        }

        if rule.resets_dimension_scope {
            scopes.pop();
        }
    }

    fn check_child_groups<'t>(
        &self,
        ctx: &EntryContext<'t>,
        scopes: &mut DimensionScopes,
        rule: &GroupRule,
        parent_path: &NodePath,
        parent: &'t Group,
        report: &mut ValidationReport,
    ) {
        let instances = self.matching_groups(ctx, rule, parent_path, parent, report);
        if instances.is_empty() {
            check_presence(report, &parent_path.child(rule.label()), false, rule.requirement, "group");
            return;
        }
        if let Some(max) = rule.max_occurs {
            if instances.len() > max {
                report.record(
                    parent_path.child(rule.label()),
                    FindingKind::MultiplicityViolation,
                    format!("{} {} groups, at most {max} allowed", instances.len(), rule.nx_class),
                );
            }
        }
        for (path, group) in instances {
            self.check_group(ctx, scopes, rule, &path, group, report);
        }
    }

    /// Children of `parent` that `rule` applies to, in tree order, paired
    /// with their local paths. Soft links are followed; a group reachable
    /// under several names is checked once.
    fn matching_groups<'t>(
        &self,
        ctx: &EntryContext<'t>,
        rule: &GroupRule,
        parent_path: &NodePath,
        parent: &'t Group,
        report: &mut ValidationReport,
    ) -> Vec<(NodePath, &'t Group)> {
        let mut found: Vec<(NodePath, &'t Group)> = Vec::new();
        for child in parent.children() {
            if rule.name.as_deref().is_some_and(|name| name != child.name()) {
                continue;
            }
            let path = parent_path.child(child.name());
            let group = match child {
                Node::Group(g) => g,
                Node::Field(_) => continue,
                Node::Link(_) => match ctx.follow(parent_path, child) {
                    Ok(resolved) => match resolved.node {
                        NodeRef::Group(g) => g,
                        NodeRef::Field(_) => continue,
                    },
                    Err(e) if rule.name.is_some() => {
                        report.record(path, FindingKind::UnresolvedLink, e.to_string());
                        continue;
                    }
                    Err(e) => {
                        tracing::debug!(link = %path, error = %e, "skipping dangling link");
                        continue;
                    }
                },
            };
            if rule.admits(child.name(), group) && !found.iter().any(|(_, seen)| std::ptr::eq(*seen, group)) {
                found.push((path, group));
            }
        }
        found
    }

    fn check_transformations<'t>(&self, ctx: &EntryContext<'t>, path: &NodePath, group: &'t Group, report: &mut ValidationReport) {
        let Some(node) = group.child(DEPENDS_ON) else {
            return;
        };
        let Ok(resolved) = ctx.follow(path, node) else {
            return;
        };
        let Some(field) = resolved.node.as_field() else {
            return;
        };
        let Some(values) = load_values(report, &resolved.path, field) else {
            return;
        };
        let Some(start) = values.as_scalar_str() else {
            return;
        };
        let groups = ctx.groups_of_class("NXtransformations");
        tracing::debug!(group = %path, depends_on = start, transformation_groups = groups.len(), "walking transformation chain");
        validate_transformations(report, ctx, &groups, start, path);
    }

    // ─── Fields & Attributes ─────────────────────────────────────────

    /// Returns whether the field breaks its branch: required and missing,
    /// unresolvable, or mistyped.
    fn check_field<'t>(
        &self,
        ctx: &EntryContext<'t>,
        scopes: &mut DimensionScopes,
        parent_path: &NodePath,
        parent: &'t Group,
        rule: &FieldRule,
        report: &mut ValidationReport,
    ) -> bool {
        let required = rule.requirement == Requirement::Required;
        let path = parent_path.child(&rule.name);
        let Some(node) = parent.child(&rule.name) else {
            check_presence(report, &path, false, rule.requirement, "field");
            return required;
        };
        let field = match ctx.follow(parent_path, node) {
            Ok(resolved) => match resolved.node {
                NodeRef::Field(field) => field,
                NodeRef::Group(_) => {
                    report.record(path, FindingKind::TypeMismatch, "expected a field, found a group");
                    return required;
                }
            },
            Err(e) => {
                report.record(path, FindingKind::UnresolvedLink, e.to_string());
                return required;
            }
        };
        let mut broken = false;
        if let Some(nx_type) = rule.nx_type {
            let typed = check_type(report, &path, field, nx_type);
            broken |= required && !typed;
        }
        if let Some(units) = rule.units {
            check_units(report, &path, field, units);
        }
        if !rule.enumeration.is_empty() {
            check_enumeration(report, &path, field, &rule.enumeration);
        }

        let rank_ok = match rule.rank {
            Some(rank) if !has_open_leading_axes(&rule.dimensions) => check_rank(report, &path, field, rank),
            _ => true,
        };
        if rank_ok && !rule.dimensions.is_empty() {
            check_dimensions(report, &path, field, &rule.dimensions, scopes);
        }

        for attribute in &rule.attributes {
            let attr_path = path.attribute(&attribute.name);
            broken |= self.check_attribute(report, &attr_path, field.attribute(&attribute.name), attribute);
        }
        broken
    }

    /// Returns whether the attribute breaks its branch: required and
    /// missing or mistyped.
    fn check_attribute(
        &self,
        report: &mut ValidationReport,
        path: &NodePath,
        attribute: Option<&Attribute>,
        rule: &AttributeRule,
    ) -> bool {
        let required = rule.requirement == Requirement::Required;
        let Some(attribute) = attribute else {
            check_presence(report, path, false, rule.requirement, "attribute");
            return required;
        };
        let mut broken = false;
        if let Some(nx_type) = rule.nx_type {
            let typed = check_attribute_type(report, path, attribute, nx_type);
            broken |= required && !typed;
        }
        if !rule.enumeration.is_empty() {
            check_attribute_enumeration(report, path, attribute, &rule.enumeration);
        }
        broken
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use nexval_core::{Field, Value};
    use nexval_schema::DimensionSpec;
    use proptest::prelude::*;

    fn definition() -> ApplicationDefinition {
        let mut sample = GroupRule::new("NXsample");
        sample.resets_dimension_scope = true;
        sample.fields = ["a", "b", "c"]
            .into_iter()
            .map(|name| FieldRule {
                dimensions: vec![DimensionSpec::Symbol("n".to_string())],
                ..FieldRule::new(name)
            })
            .collect();
        let mut entry = GroupRule::new("NXentry");
        entry.groups = vec![sample];
        ApplicationDefinition {
            name: "NXprop".to_string(),
            version: None,
            description: None,
            symbols: Vec::new(),
            entry,
        }
    }

    fn tree(extents: &[usize]) -> NexusTree {
        let mut sample = Group::new("sample", Some("NXsample"));
        for (name, &n) in ["a", "b", "c"].iter().zip(extents) {
            sample = sample.with_field(Field::new(*name, Value::Int(vec![0; n]), vec![n]).unwrap());
        }
        NexusTree::new(Group::default().with_group(
            Group::new("entry", Some("NXentry"))
                .with_field(Field::scalar("definition", Value::string("NXprop")))
                .with_group(sample),
        ))
    }

    proptest! {
        /// Every field after the first that disagrees with the first
        /// extent yields exactly one mismatch.
        #[test]
        fn symbol_binding_agreement(extents in prop::collection::vec(0usize..6, 3)) {
            let def = definition();
            let report = Validator::new(&def, ValidationOptions::default()).validate_tree(&tree(&extents));
            let expected = extents[1..].iter().filter(|&&e| e != extents[0]).count();
            prop_assert_eq!(report.count(FindingKind::DimensionMismatch), expected);
            prop_assert_eq!(report.len(), expected);
        }

        /// Validating the same tree twice gives identical reports.
        #[test]
        fn validation_is_idempotent(extents in prop::collection::vec(0usize..6, 3), fail_fast in any::<bool>()) {
            let def = definition();
            let options = ValidationOptions {
                failure_policy: if fail_fast { FailurePolicy::FailFastPerBranch } else { FailurePolicy::Accumulate },
                ..ValidationOptions::default()
            };
            let validator = Validator::new(&def, options);
            let t = tree(&extents);
            prop_assert_eq!(validator.validate_tree(&t), validator.validate_tree(&t));
        }
    }
}
