//! Extra-refs rewrite (pipeline step 1)

use super::GIT_HOST;
use crate::config::RuleSet;
use crate::jobs::JobBase;

/// Translate every eligible extra ref and append configured refs.
///
/// A ref is eligible when global refs mode is set or its org/repo passes
/// the translation gate. The ref-specific org map wins over the general
/// one and also rewrites the clone URI to an HTTPS form.
pub fn update_extra_refs(rules: &RuleSet, base: &mut JobBase) {
    let t = &rules.transform;

    for r in &mut base.extra_refs {
        if !(t.refs || rules.accepts_org_repo(&r.org, &r.repo)) {
            continue;
        }

        if let Some(new_org) = t.ref_org_map.get(&r.org) {
            r.clone_uri = format!("https://{}/{}", new_org, r.repo);
            r.org = new_org.clone();
        } else if let Some(new_org) = t.org_map.get(&r.org) {
            r.org = new_org.clone();
        }

        if t.ssh_clone {
            r.clone_uri = format!("git@{}:{}/{}.git", GIT_HOST, r.org, r.repo);
        }

        if !t.ref_branch_out.is_empty() {
            r.base_ref = t.ref_branch_out.clone();
        }
    }

    if !t.extra_refs.is_empty() {
        base.extra_refs.extend(t.extra_refs.iter().cloned());
    }
}
