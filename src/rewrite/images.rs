//! Image hub and tag rewrites (pipeline step 13)
//!
//! Both steps are best-effort: an image reference that fails to parse is
//! left exactly as it was.

use crate::config::RuleSet;
use crate::image::ImageRef;
use crate::jobs::JobBase;

/// Apply hub-map substring replacements to every container image.
pub fn update_hubs(rules: &RuleSet, base: &mut JobBase) {
    let t = &rules.transform;
    if t.hub_map.is_empty() {
        return;
    }
    let Some(spec) = base.spec.as_mut() else {
        return;
    };

    for container in &mut spec.containers {
        let Ok(mut image) = ImageRef::parse(&container.image) else {
            continue;
        };

        for (from, to) in &t.hub_map {
            image.base = image.base.replace(from.as_str(), to);
        }

        container.image = image.format();
    }
}

/// Force the configured tag onto every container image.
pub fn update_tags(rules: &RuleSet, base: &mut JobBase) {
    let tag = &rules.transform.tag;
    if tag.is_empty() {
        return;
    }
    let Some(spec) = base.spec.as_mut() else {
        return;
    };

    for container in &mut spec.containers {
        let Ok(mut image) = ImageRef::parse(&container.image) else {
            continue;
        };

        image.tag = tag.clone();
        container.image = image.format();
    }
}
