//! Label, selector, env, service-account, and branch rewrites
//! (pipeline steps 5–9)

use crate::config::RuleSet;
use crate::jobs::{EnvVar, JobBase};

/// Overlay configured labels; configured wins on collision.
pub fn update_labels(rules: &RuleSet, base: &mut JobBase) {
    for (k, v) in &rules.transform.labels {
        base.labels.insert(k.clone(), v.clone());
    }
}

/// Overlay the node selector, optionally clearing the existing one first.
pub fn update_node_selector(rules: &RuleSet, base: &mut JobBase) {
    let t = &rules.transform;
    let Some(spec) = base.spec.as_mut() else {
        return;
    };

    if t.override_selector {
        spec.node_selector.clear();
    }

    for (k, v) in &t.selector {
        spec.node_selector.insert(k.clone(), v.clone());
    }
}

/// Update configured env vars by name in every container, appending when
/// absent. Keys are walked in sorted order for deterministic output.
pub fn update_envs(rules: &RuleSet, base: &mut JobBase) {
    let t = &rules.transform;
    if t.env.is_empty() {
        return;
    }
    let Some(spec) = base.spec.as_mut() else {
        return;
    };

    for (key, value) in &t.env {
        for container in &mut spec.containers {
            match container.env.iter_mut().find(|e| &e.name == key) {
                Some(existing) => existing.value = Some(value.clone()),
                None => container.env.push(EnvVar::new(key.clone(), value.clone())),
            }
        }
    }
}

/// Overwrite the service account only when the job already carries one.
pub fn update_service_account(rules: &RuleSet, base: &mut JobBase) {
    let account = &rules.transform.service_account;
    if account.is_empty() {
        return;
    }
    let Some(spec) = base.spec.as_mut() else {
        return;
    };

    if !spec.service_account_name.is_empty() {
        spec.service_account_name = account.clone();
    }
}

/// Replace the job's target branches wholesale when branches-out is set.
pub fn update_branches_out(rules: &RuleSet, branches: &mut Vec<String>) {
    if rules.transform.branches_out.is_empty() {
        return;
    }

    *branches = rules.transform.branches_out.clone();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Transform;
    use crate::jobs::{Container, PodSpec};
    use std::collections::BTreeMap;

    fn rules(mutate: impl FnOnce(&mut Transform)) -> RuleSet {
        let mut t = Transform::default();
        mutate(&mut t);
        RuleSet::new(t).unwrap()
    }

    fn base_with_containers(n: usize) -> JobBase {
        JobBase {
            spec: Some(PodSpec {
                containers: (0..n).map(|_| Container::default()).collect(),
                ..PodSpec::default()
            }),
            ..JobBase::default()
        }
    }

    #[test]
    fn test_labels_overlay_configured_wins() {
        let r = rules(|t| {
            t.labels = BTreeMap::from([("tier".to_string(), "private".to_string())]);
        });
        let mut base = JobBase::default();
        base.labels = BTreeMap::from([
            ("tier".to_string(), "public".to_string()),
            ("keep".to_string(), "yes".to_string()),
        ]);

        update_labels(&r, &mut base);
        assert_eq!(base.labels["tier"], "private");
        assert_eq!(base.labels["keep"], "yes");
    }

    #[test]
    fn test_selector_additive_by_default() {
        let r = rules(|t| {
            t.selector = BTreeMap::from([("pool".to_string(), "private".to_string())]);
        });
        let mut base = base_with_containers(1);
        base.spec.as_mut().unwrap().node_selector =
            BTreeMap::from([("arch".to_string(), "amd64".to_string())]);

        update_node_selector(&r, &mut base);
        let selector = &base.spec.as_ref().unwrap().node_selector;
        assert_eq!(selector.len(), 2);
    }

    #[test]
    fn test_selector_override_clears_first() {
        let r = rules(|t| {
            t.override_selector = true;
            t.selector = BTreeMap::from([("pool".to_string(), "private".to_string())]);
        });
        let mut base = base_with_containers(1);
        base.spec.as_mut().unwrap().node_selector =
            BTreeMap::from([("arch".to_string(), "amd64".to_string())]);

        update_node_selector(&r, &mut base);
        let selector = &base.spec.as_ref().unwrap().node_selector;
        assert_eq!(selector.len(), 1);
        assert_eq!(selector["pool"], "private");
    }

    #[test]
    fn test_env_update_or_append_every_container() {
        let r = rules(|t| {
            t.env = BTreeMap::from([("GOPROXY".to_string(), "off".to_string())]);
        });
        let mut base = base_with_containers(2);
        base.spec.as_mut().unwrap().containers[0]
            .env
            .push(EnvVar::new("GOPROXY", "direct"));

        update_envs(&r, &mut base);
        let containers = &base.spec.as_ref().unwrap().containers;
        assert_eq!(containers[0].env.len(), 1);
        assert_eq!(containers[0].env[0].value.as_deref(), Some("off"));
        assert_eq!(containers[1].env.len(), 1);
        assert_eq!(containers[1].env[0].name, "GOPROXY");
    }

    #[test]
    fn test_service_account_only_replaces_existing() {
        let r = rules(|t| t.service_account = "private-sa".to_string());

        let mut unset = base_with_containers(1);
        update_service_account(&r, &mut unset);
        assert!(unset.spec.as_ref().unwrap().service_account_name.is_empty());

        let mut set = base_with_containers(1);
        set.spec.as_mut().unwrap().service_account_name = "public-sa".to_string();
        update_service_account(&r, &mut set);
        assert_eq!(set.spec.as_ref().unwrap().service_account_name, "private-sa");
    }

    #[test]
    fn test_branches_out_replaces_wholesale() {
        let r = rules(|t| t.branches_out = vec!["private-main".to_string()]);
        let mut branches = vec!["master".to_string(), "release-1.0".to_string()];

        update_branches_out(&r, &mut branches);
        assert_eq!(branches, vec!["private-main"]);

        let none = rules(|_| {});
        update_branches_out(&none, &mut branches);
        assert_eq!(branches, vec!["private-main"]);
    }
}
