//! # Validate Subcommand
//!
//! Loads the definitions directory and a JSON tree document, checks the
//! tree against one definition and prints the report.
//!
//! The definition is taken from `--definition`, or else from the
//! `definition` field of the first `NXentry` in the tree. Options come
//! from `--config` and are then overridden by the command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use nexval_core::{NexusTree, NodePath};
use nexval_engine::validator::DEFINITION_FIELD;
use nexval_engine::{FailurePolicy, LinkResolution, ValidationOptions, ValidationReport, Validator};
use nexval_schema::DefinitionRegistry;

/// Report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Arguments for the `nexval validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Directory of application definitions (YAML or JSON).
    #[arg(long, value_name = "DIR", default_value = "definitions")]
    pub definitions: PathBuf,

    /// Definition to check against. Defaults to the one the tree's first
    /// entry declares.
    #[arg(long, value_name = "NAME")]
    pub definition: Option<String>,

    /// Validate only the entry at this path, whatever it declares.
    #[arg(long, value_name = "PATH")]
    pub entry: Option<String>,

    /// Fail with an error on the first finding.
    #[arg(long)]
    pub strict: bool,

    /// Stop descending into a group once it has a finding.
    #[arg(long)]
    pub fail_fast: bool,

    /// Check that links resolve to their declared targets.
    #[arg(long)]
    pub resolve_links: bool,

    /// Validate every entry, not only those declaring the definition.
    #[arg(long)]
    pub all_entries: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// JSON tree document to validate.
    #[arg(value_name = "TREE")]
    pub tree: PathBuf,
}

impl ValidateArgs {
    /// Layer the command-line flags over `options`. Flags only switch
    /// behavior on; anything they leave off keeps the config value.
    pub fn apply(&self, mut options: ValidationOptions) -> ValidationOptions {
        if self.fail_fast {
            options.failure_policy = FailurePolicy::FailFastPerBranch;
        }
        if self.resolve_links {
            options.link_resolution = LinkResolution::Full;
        }
        if self.all_entries {
            options.all_entries = true;
        }
        options
    }
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when the tree conforms, 1 when there are findings.
/// Under `--strict` findings are returned as an error instead.
pub fn run_validate(args: &ValidateArgs, config: Option<&Path>) -> Result<u8> {
    let options = args.apply(crate::load_options(config)?);

    let registry = DefinitionRegistry::from_dir(&args.definitions)
        .with_context(|| format!("failed to load definitions from {}", args.definitions.display()))?;
    tracing::info!(definitions = registry.len(), "loaded definition registry");

    let tree = read_tree(&args.tree)?;
    let name = match &args.definition {
        Some(name) => name.clone(),
        None => declared_definition(&tree).with_context(|| {
            format!(
                "{} declares no definition in its first entry; pass --definition",
                args.tree.display()
            )
        })?,
    };
    let definition = registry.require(&name)?;
    tracing::debug!(definition = %name, tree = %args.tree.display(), "validating");

    let validator = Validator::new(definition, options);
    let report = match &args.entry {
        Some(entry) => validator.validate_entry(&tree, &NodePath::parse(entry)),
        None => validator.validate_tree(&tree),
    };

    println!("{}", render_report(&report, args.format)?);

    if args.strict {
        report.into_result()?;
        return Ok(0);
    }
    Ok(if report.is_conformant() { 0 } else { 1 })
}

/// Read and decode a JSON tree document.
pub fn read_tree(path: &Path) -> Result<NexusTree> {
    let content = std::fs::read_to_string(path).with_context(|| format!("cannot read tree {}", path.display()))?;
    NexusTree::from_json_str(&content).with_context(|| format!("invalid tree document {}", path.display()))
}

/// The definition named by the first `NXentry` that carries a readable
/// `definition` field.
pub fn declared_definition(tree: &NexusTree) -> Option<String> {
    tree.root().groups_of_class("NXentry").find_map(|entry| {
        let field = entry.field(DEFINITION_FIELD)?;
        let values = field.values().ok()?;
        values.as_scalar_str().map(|s| s.trim().to_string())
    })
}

pub fn render_report(report: &ValidationReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report).context("failed to serialize report"),
        OutputFormat::Text => {
            let mut lines: Vec<String> = report.findings().iter().map(|f| format!("  {f}")).collect();
            let summary = if report.is_conformant() {
                format!(
                    "{}: conformant ({} entr{})",
                    report.definition(),
                    report.entries().len(),
                    if report.entries().len() == 1 { "y" } else { "ies" }
                )
            } else {
                format!("{}: {} finding(s)", report.definition(), report.len())
            };
            lines.insert(0, summary);
            Ok(lines.join("\n"))
        }
    }
}
