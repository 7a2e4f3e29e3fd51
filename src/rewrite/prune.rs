//! Denylist pruning (pipeline step 12)

use crate::config::RuleSet;
use crate::jobs::JobBase;

/// Drop denylisted env vars, volumes, and volume mounts from the spec.
pub fn prune_spec(rules: &RuleSet, base: &mut JobBase) {
    let Some(spec) = base.spec.as_mut() else {
        return;
    };

    if !rules.volume_denylist.is_empty() {
        spec.volumes
            .retain(|v| !rules.volume_denylist.contains(&v.name));
        for container in &mut spec.containers {
            container
                .volume_mounts
                .retain(|m| !rules.volume_denylist.contains(&m.name));
        }
    }

    if !rules.env_denylist.is_empty() {
        for container in &mut spec.containers {
            container
                .env
                .retain(|e| !rules.env_denylist.contains(&e.name));
        }
    }
}
