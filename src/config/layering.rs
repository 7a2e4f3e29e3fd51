//! Fragment layering
//!
//! An explicit fold over ordered fragments: each field takes the first
//! non-unset value, scanning from highest to lowest precedence. "Unset"
//! is a per-type predicate — empty string, empty collection, `false` —
//! so a higher-precedence fragment can never force a field back to
//! empty or `false` once a lower layer sets it. That asymmetry is a
//! known property of this layering model (see DESIGN.md), kept rather
//! than redesigned.

use super::Transform;

/// Per-type "is this the unset sentinel" predicate.
trait Unset {
    fn is_unset(&self) -> bool;
}

impl Unset for String {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

impl Unset for bool {
    fn is_unset(&self) -> bool {
        !*self
    }
}

impl<T> Unset for Vec<T> {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Unset for std::collections::BTreeMap<K, V> {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

fn fill<T: Unset + Clone>(dst: &mut T, src: &T) {
    if dst.is_unset() {
        *dst = src.clone();
    }
}

/// Fill every unset field of `dst` from the lower-precedence `src`.
pub fn layer_onto(dst: &mut Transform, src: &Transform) {
    fill(&mut dst.org_map, &src.org_map);
    fill(&mut dst.ref_org_map, &src.ref_org_map);
    fill(&mut dst.hub_map, &src.hub_map);
    fill(&mut dst.labels, &src.labels);
    fill(&mut dst.annotations, &src.annotations);
    fill(&mut dst.selector, &src.selector);
    fill(&mut dst.env, &src.env);

    fill(&mut dst.input, &src.input);
    fill(&mut dst.output, &src.output);
    fill(&mut dst.bucket, &src.bucket);
    fill(&mut dst.cluster, &src.cluster);
    fill(&mut dst.channel, &src.channel);
    fill(&mut dst.ssh_key_secret, &src.ssh_key_secret);
    fill(&mut dst.modifier, &src.modifier);
    fill(&mut dst.service_account, &src.service_account);
    fill(&mut dst.tag, &src.tag);
    fill(&mut dst.sort, &src.sort);
    fill(&mut dst.ref_branch_out, &src.ref_branch_out);

    fill(&mut dst.branches, &src.branches);
    fill(&mut dst.branches_out, &src.branches_out);
    fill(&mut dst.extra_refs, &src.extra_refs);
    fill(&mut dst.presets, &src.presets);
    fill(&mut dst.rerun_orgs, &src.rerun_orgs);
    fill(&mut dst.rerun_users, &src.rerun_users);

    fill(&mut dst.env_denylist, &src.env_denylist);
    fill(&mut dst.volume_denylist, &src.volume_denylist);
    fill(&mut dst.job_allowlist, &src.job_allowlist);
    fill(&mut dst.job_denylist, &src.job_denylist);
    fill(&mut dst.repo_allowlist, &src.repo_allowlist);
    fill(&mut dst.repo_denylist, &src.repo_denylist);
    fill(&mut dst.job_types, &src.job_types);

    fill(&mut dst.clean, &src.clean);
    fill(&mut dst.dry_run, &src.dry_run);
    fill(&mut dst.refs, &src.refs);
    fill(&mut dst.resolve, &src.resolve);
    fill(&mut dst.ssh_clone, &src.ssh_clone);
    fill(&mut dst.override_selector, &src.override_selector);
    fill(&mut dst.support_gerrit_reporting, &src.support_gerrit_reporting);
    fill(&mut dst.allow_long_job_names, &src.allow_long_job_names);
    fill(&mut dst.verbose, &src.verbose);
}

/// Layer fragments ordered highest to lowest precedence into one.
pub fn layer(fragments: &[Transform]) -> Transform {
    let mut iter = fragments.iter();
    let mut merged = iter.next().cloned().unwrap_or_default();

    for fragment in iter {
        layer_onto(&mut merged, fragment);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(modifier: &str) -> Transform {
        Transform {
            modifier: modifier.to_string(),
            ..Transform::default()
        }
    }

    #[test]
    fn test_layering_single_fragment_is_identity() {
        let a = Transform {
            bucket: "logs".to_string(),
            verbose: true,
            branches: vec!["master".to_string()],
            ..Transform::default()
        };

        assert_eq!(layer(&[a.clone()]), a);
    }

    #[test]
    fn test_layering_is_idempotent() {
        let a = Transform {
            bucket: "logs".to_string(),
            resolve: true,
            ..Transform::default()
        };

        assert_eq!(layer(&[a.clone(), a.clone()]), layer(&[a]));
    }

    #[test]
    fn test_higher_precedence_wins() {
        let merged = layer(&[fragment("high"), fragment("low")]);
        assert_eq!(merged.modifier, "high");
    }

    #[test]
    fn test_lower_layer_fills_unset() {
        let mut high = Transform::default();
        high.bucket = "high-bucket".to_string();

        let mut low = fragment("low");
        low.verbose = true;
        low.env_denylist = vec!["SECRET".to_string()];

        let merged = layer(&[high, low]);
        assert_eq!(merged.bucket, "high-bucket");
        assert_eq!(merged.modifier, "low");
        assert!(merged.verbose);
        assert_eq!(merged.env_denylist, vec!["SECRET"]);
    }

    #[test]
    fn test_false_cannot_override_true() {
        // The documented limitation: a higher layer's false is "unset".
        let mut low = Transform::default();
        low.ssh_clone = true;

        let merged = layer(&[Transform::default(), low]);
        assert!(merged.ssh_clone);
    }

    #[test]
    fn test_empty_fragment_list() {
        assert_eq!(layer(&[]), Transform::default());
    }
}
