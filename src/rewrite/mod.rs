//! Ordered mutation pipeline for surviving jobs
//!
//! Every job that passes the filter runs the same fixed sequence of
//! rewrite steps. Order matters: the node-selector override must precede
//! the additive selector merge, presets resolve before pruning, and the
//! tag override runs after hub rewriting. Each step is its own function;
//! the orchestrators here spell the order out once per job kind.

mod decoration;
mod identity;
mod images;
mod podspec;
mod presets;
mod prune;
mod refs;

pub use identity::GERRIT_REPORT_LABEL;
pub use presets::resolve_presets;

use crate::config::RuleSet;
use crate::jobs::{Periodic, Postsubmit, Preset, Presubmit};

/// Git host used when rendering SSH clone URIs.
pub const GIT_HOST: &str = "github.com";

/// Separator between a job name and the modifier suffix.
pub const JOBNAME_SEPARATOR: &str = "_";

/// Maximum label length a job name must fit within.
pub const MAX_LABEL_LEN: usize = 63;

/// Rewrite a surviving presubmit in place.
pub fn rewrite_presubmit(
    rules: &RuleSet,
    job: &mut Presubmit,
    orgrepo: &str,
    presets: &[Preset],
) {
    refs::update_extra_refs(rules, &mut job.base);
    identity::update_job_base(rules, &mut job.base, Some(orgrepo));
    podspec::update_branches_out(rules, &mut job.branches);
    decoration::update_decoration(rules, &mut job.base);
    identity::update_gerrit_report_label(
        rules,
        job.skip_report,
        job.optional,
        &mut job.base.labels,
    );
    presets::resolve_presets(rules, &mut job.base, presets);
    prune::prune_spec(rules, &mut job.base);
    images::update_hubs(rules, &mut job.base);
    images::update_tags(rules, &mut job.base);
}

/// Rewrite a surviving postsubmit in place.
pub fn rewrite_postsubmit(
    rules: &RuleSet,
    job: &mut Postsubmit,
    orgrepo: &str,
    presets: &[Preset],
) {
    refs::update_extra_refs(rules, &mut job.base);
    identity::update_job_base(rules, &mut job.base, Some(orgrepo));
    podspec::update_branches_out(rules, &mut job.branches);
    decoration::update_decoration(rules, &mut job.base);
    presets::resolve_presets(rules, &mut job.base, presets);
    prune::prune_spec(rules, &mut job.base);
    images::update_hubs(rules, &mut job.base);
    images::update_tags(rules, &mut job.base);
}

/// Rewrite a surviving periodic in place.
///
/// Periodics carry no primary org/repo identity, so the SSH clone URI
/// and branch-output steps do not apply.
pub fn rewrite_periodic(rules: &RuleSet, job: &mut Periodic, presets: &[Preset]) {
    refs::update_extra_refs(rules, &mut job.base);
    identity::update_job_base(rules, &mut job.base, None);
    decoration::update_decoration(rules, &mut job.base);
    presets::resolve_presets(rules, &mut job.base, presets);
    prune::prune_spec(rules, &mut job.base);
    images::update_hubs(rules, &mut job.base);
    images::update_tags(rules, &mut job.base);
}
