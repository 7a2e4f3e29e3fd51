//! Transform configuration
//!
//! A `Transform` is one partial rule fragment as written in a transform
//! file, a directory `.defaults.yaml`, the global defaults file, or the
//! command line. Fragments are layered into a single effective fragment
//! (see [`layer`]), which a [`RuleSet`] then wraps with derived
//! membership sets for total, constant-shape lookups.

mod layering;
mod loader;

pub use layering::{layer, layer_onto};
pub use loader::{load_global, load_transforms, validate_rules, ConfigError, ConfigFile};

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::jobs::Refs;
use crate::matcher::{self, PatternError};

/// Job kinds processed when a transform names none.
pub const DEFAULT_JOB_TYPES: &[&str] = &["presubmit", "postsubmit", "periodic"];

/// Suffix appended to generated file and job names when unconfigured.
pub const DEFAULT_MODIFIER: &str = "private";

/// Cluster name that counts as "not an override".
pub const DEFAULT_CLUSTER: &str = "default";

/// One partial rule fragment.
///
/// Every field defaults to its empty value; "unset" is exactly the
/// default, tested per type by the layering fold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Transform {
    /// Public org → private org.
    #[serde(rename = "mapping")]
    pub org_map: BTreeMap<String, String>,

    /// Public org → private org, checked first for extra refs.
    #[serde(rename = "ref_mapping")]
    pub ref_org_map: BTreeMap<String, String>,

    /// Substring replacements applied to container image registries.
    #[serde(rename = "hub_mapping")]
    pub hub_map: BTreeMap<String, String>,

    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub selector: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,

    pub input: String,
    pub output: String,
    pub bucket: String,
    pub cluster: String,
    pub channel: String,
    pub ssh_key_secret: String,
    pub modifier: String,
    pub service_account: String,
    pub tag: String,
    pub sort: String,
    pub ref_branch_out: String,

    /// Input branches a job must match to survive.
    pub branches: Vec<String>,

    /// Replacement branch list for surviving presubmits/postsubmits.
    pub branches_out: Vec<String>,

    /// Extra refs appended to every surviving job.
    pub extra_refs: Vec<Refs>,

    /// Preset file paths.
    pub presets: Vec<String>,

    pub rerun_orgs: Vec<String>,
    pub rerun_users: Vec<String>,

    pub env_denylist: Vec<String>,
    pub volume_denylist: Vec<String>,
    pub job_allowlist: Vec<String>,
    pub job_denylist: Vec<String>,
    pub repo_allowlist: Vec<String>,
    pub repo_denylist: Vec<String>,

    #[serde(rename = "job_type")]
    pub job_types: Vec<String>,

    pub clean: bool,
    pub dry_run: bool,

    /// Apply ref translation to all extra refs regardless of repo gates.
    pub refs: bool,

    /// Expand presets into surviving jobs.
    pub resolve: bool,

    pub ssh_clone: bool,
    pub override_selector: bool,
    pub support_gerrit_reporting: bool,
    pub allow_long_job_names: bool,
    pub verbose: bool,
}

/// Effective, fully-layered configuration for one transform.
///
/// Built once, immutable thereafter. The derived sets default to empty
/// so membership tests are total.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub transform: Transform,

    pub env_denylist: BTreeSet<String>,
    pub volume_denylist: BTreeSet<String>,
    pub repo_allowlist: BTreeSet<String>,
    pub repo_denylist: BTreeSet<String>,
    pub job_types: BTreeSet<String>,
}

impl RuleSet {
    /// Wrap a layered fragment, validating its name patterns.
    ///
    /// An invalid allow/deny regex is a configuration error and surfaces
    /// here rather than as a silent non-match later.
    pub fn new(transform: Transform) -> Result<Self, PatternError> {
        matcher::validate(&transform.job_allowlist)?;
        matcher::validate(&transform.job_denylist)?;

        let env_denylist = transform.env_denylist.iter().cloned().collect();
        let volume_denylist = transform.volume_denylist.iter().cloned().collect();
        let repo_allowlist = transform.repo_allowlist.iter().cloned().collect();
        let repo_denylist = transform.repo_denylist.iter().cloned().collect();
        let job_types = transform.job_types.iter().cloned().collect();

        Ok(Self {
            transform,
            env_denylist,
            volume_denylist,
            repo_allowlist,
            repo_denylist,
            job_types,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ruleset_builds_sets() {
        let transform = Transform {
            repo_denylist: vec!["bad".to_string()],
            job_types: vec!["presubmit".to_string()],
            ..Transform::default()
        };

        let rules = RuleSet::new(transform).unwrap();
        assert!(rules.repo_denylist.contains("bad"));
        assert!(rules.job_types.contains("presubmit"));
        assert!(rules.repo_allowlist.is_empty());
    }

    #[test]
    fn test_ruleset_rejects_invalid_patterns() {
        let transform = Transform {
            job_denylist: vec!["(".to_string()],
            ..Transform::default()
        };

        assert!(RuleSet::new(transform).is_err());
    }

    #[test]
    fn test_fragment_rejects_unknown_fields() {
        let err = serde_yaml::from_str::<Transform>("no_such_rule: 1");
        assert!(err.is_err());
    }

    #[test]
    fn test_fragment_defaults() {
        let t: Transform = serde_yaml::from_str("modifier: internal").unwrap();
        assert_eq!(t.modifier, "internal");
        assert!(t.org_map.is_empty());
        assert!(!t.resolve);
    }
}
