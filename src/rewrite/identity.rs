//! Identity, reporting, and rerun-auth rewrites (pipeline steps 2–4)

use std::collections::BTreeMap;

use super::{podspec, GIT_HOST, JOBNAME_SEPARATOR, MAX_LABEL_LEN};
use crate::config::{RuleSet, DEFAULT_CLUSTER};
use crate::jobs::{JobBase, RerunAuthConfig, SlackReporterConfig};

/// Label carrying the Gerrit report target.
pub const GERRIT_REPORT_LABEL: &str = "prow.k8s.io/gerrit-report-label";

/// Apply the shared base-record rewrites in their fixed order.
pub fn update_job_base(rules: &RuleSet, base: &mut JobBase, orgrepo: Option<&str>) {
    let t = &rules.transform;

    if !t.annotations.is_empty() {
        base.annotations = t.annotations.clone();
    }

    if t.ssh_clone {
        if let Some(orgrepo) = orgrepo.filter(|o| !o.is_empty()) {
            base.clone_uri = format!("git@{}:{}.git", GIT_HOST, orgrepo);
        }
    }

    if !t.cluster.is_empty() && t.cluster != DEFAULT_CLUSTER {
        base.cluster = t.cluster.clone();
    }

    update_job_name(rules, base);
    update_reporter(rules, base);
    update_rerun_auth(rules, base);
    podspec::update_labels(rules, base);
    podspec::update_node_selector(rules, base);
    podspec::update_envs(rules, base);
    podspec::update_service_account(rules, base);
}

/// Truncate the name to fit the label ceiling, then append the modifier.
fn update_job_name(rules: &RuleSet, base: &mut JobBase) {
    let t = &rules.transform;

    let suffix = if t.modifier.is_empty() {
        String::new()
    } else {
        format!("{}{}", JOBNAME_SEPARATOR, t.modifier)
    };

    if !t.allow_long_job_names {
        let max = MAX_LABEL_LEN.saturating_sub(suffix.len());
        truncate_at_boundary(&mut base.name, max);
    }

    base.name.push_str(&suffix);
}

fn truncate_at_boundary(name: &mut String, mut max: usize) {
    if name.len() <= max {
        return;
    }
    while !name.is_char_boundary(max) {
        max -= 1;
    }
    name.truncate(max);
}

/// Set the Slack reporter channel if one is configured.
fn update_reporter(rules: &RuleSet, base: &mut JobBase) {
    let channel = &rules.transform.channel;
    if channel.is_empty() {
        return;
    }

    let reporter = base.reporter_config.get_or_insert_with(Default::default);
    reporter.slack = Some(SlackReporterConfig {
        channel: channel.clone(),
        ..SlackReporterConfig::default()
    });
}

/// Replace (not merge) rerun authorization when any is configured.
fn update_rerun_auth(rules: &RuleSet, base: &mut JobBase) {
    let t = &rules.transform;
    if t.rerun_orgs.is_empty() && t.rerun_users.is_empty() {
        return;
    }

    base.rerun_auth_config = Some(RerunAuthConfig {
        github_orgs: t.rerun_orgs.clone(),
        github_users: t.rerun_users.clone(),
    });
}

/// Set or clear the Gerrit report label.
///
/// Required jobs get `Verified` only if the label is absent, so a job
/// may pin a custom report label; optional jobs always get `Advisory`.
/// With reporting support off the label is removed outright.
pub fn update_gerrit_report_label(
    rules: &RuleSet,
    skip_report: bool,
    optional: bool,
    labels: &mut BTreeMap<String, String>,
) {
    if rules.transform.support_gerrit_reporting && !skip_report {
        if optional {
            labels.insert(GERRIT_REPORT_LABEL.to_string(), "Advisory".to_string());
        } else {
            labels
                .entry(GERRIT_REPORT_LABEL.to_string())
                .or_insert_with(|| "Verified".to_string());
        }
    } else {
        labels.remove(GERRIT_REPORT_LABEL);
    }
}
