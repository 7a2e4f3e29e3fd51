//! Preset resolution (pipeline step 11)

use std::collections::BTreeMap;

use crate::config::RuleSet;
use crate::jobs::{JobBase, PodSpec, Preset};

/// Expand every matching preset into the job's container spec.
///
/// Gated by the resolve flag; a preset matches only when every label it
/// declares is present on the job with an exactly equal value.
pub fn resolve_presets(rules: &RuleSet, base: &mut JobBase, presets: &[Preset]) {
    if !rules.transform.resolve {
        return;
    }

    let JobBase { labels, spec, .. } = base;
    let Some(spec) = spec.as_mut() else {
        return;
    };

    for preset in presets {
        merge_preset(labels, spec, preset);
    }
}

fn labels_match(job_labels: &BTreeMap<String, String>, preset: &Preset) -> bool {
    preset
        .labels
        .iter()
        .all(|(k, v)| job_labels.get(k) == Some(v))
}

fn merge_preset(job_labels: &BTreeMap<String, String>, spec: &mut PodSpec, preset: &Preset) {
    if !labels_match(job_labels, preset) {
        return;
    }

    for env in &preset.env {
        for container in &mut spec.containers {
            match container.env.iter_mut().find(|e| e.name == env.name) {
                Some(existing) => *existing = env.clone(),
                None => container.env.push(env.clone()),
            }
        }
    }

    for volume in &preset.volumes {
        match spec.volumes.iter_mut().find(|v| v.name == volume.name) {
            Some(existing) => *existing = volume.clone(),
            None => spec.volumes.push(volume.clone()),
        }
    }

    for mount in &preset.volume_mounts {
        for container in &mut spec.containers {
            match container
                .volume_mounts
                .iter_mut()
                .find(|m| m.name == mount.name)
            {
                Some(existing) => *existing = mount.clone(),
                None => container.volume_mounts.push(mount.clone()),
            }
        }
    }
}
