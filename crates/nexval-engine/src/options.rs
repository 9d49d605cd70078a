//! # Validation Options
//!
//! Caller-chosen knobs for a pass. Every field has a default, so a config
//! file only needs the keys it changes:
//!
//! ```yaml
//! failure_policy: fail_fast_per_branch
//! link_resolution: full
//! ```

use serde::{Deserialize, Serialize};

/// Default bound on soft links followed while resolving one path.
pub const DEFAULT_MAX_LINK_HOPS: usize = 16;

/// What happens after a group instance records a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record everything and keep walking.
    #[default]
    Accumulate,
    /// Skip the subgroups and transformation chain of a group whose required
    /// node is missing or mistyped. Siblings are still visited.
    FailFastPerBranch,
}

/// How much work the link checker does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkResolution {
    /// A node must exist under the link's name.
    #[default]
    Local,
    /// The node must also resolve to the declared target.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationOptions {
    pub failure_policy: FailurePolicy,
    pub link_resolution: LinkResolution,
    /// Validate every `NXentry`, not only those whose `definition` field
    /// names the definition.
    pub all_entries: bool,
    pub max_link_hops: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Accumulate,
            link_resolution: LinkResolution::Local,
            all_entries: false,
            max_link_hops: DEFAULT_MAX_LINK_HOPS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let opts: ValidationOptions = serde_yaml::from_str("link_resolution: full\n").unwrap();
        assert_eq!(opts.link_resolution, LinkResolution::Full);
        assert_eq!(opts.failure_policy, FailurePolicy::Accumulate);
        assert_eq!(opts.max_link_hops, DEFAULT_MAX_LINK_HOPS);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_yaml::from_str::<ValidationOptions>("strict: true\n").is_err());
    }
}
