//! Utility/decoration config rewrite (pipeline step 10)

use crate::config::RuleSet;
use crate::jobs::{GcsConfiguration, JobBase};

/// Set the GCS bucket and append the SSH key secret, creating the
/// decoration config lazily. The secret list is additive.
pub fn update_decoration(rules: &RuleSet, base: &mut JobBase) {
    let t = &rules.transform;
    if t.bucket.is_empty() && t.ssh_key_secret.is_empty() {
        return;
    }

    let decoration = base.decoration_config.get_or_insert_with(Default::default);

    if !t.bucket.is_empty() {
        match decoration.gcs_configuration.as_mut() {
            Some(gcs) => gcs.bucket = t.bucket.clone(),
            None => {
                decoration.gcs_configuration = Some(GcsConfiguration {
                    bucket: t.bucket.clone(),
                    ..GcsConfiguration::default()
                })
            }
        }
    }

    if !t.ssh_key_secret.is_empty() {
        decoration.ssh_key_secrets.push(t.ssh_key_secret.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Transform;
    use crate::jobs::DecorationConfig;

    #[test]
    fn test_no_config_leaves_job_untouched() {
        let rules = RuleSet::new(Transform::default()).unwrap();
        let mut base = JobBase::default();

        update_decoration(&rules, &mut base);
        assert!(base.decoration_config.is_none());
    }

    #[test]
    fn test_bucket_creates_decoration_lazily() {
        let t = Transform {
            bucket: "private-logs".to_string(),
            ..Transform::default()
        };
        let rules = RuleSet::new(t).unwrap();
        let mut base = JobBase::default();

        update_decoration(&rules, &mut base);
        let gcs = base
            .decoration_config
            .unwrap()
            .gcs_configuration
            .unwrap();
        assert_eq!(gcs.bucket, "private-logs");
    }

    #[test]
    fn test_bucket_overwrites_existing() {
        let t = Transform {
            bucket: "private-logs".to_string(),
            ..Transform::default()
        };
        let rules = RuleSet::new(t).unwrap();
        let mut base = JobBase {
            decoration_config: Some(DecorationConfig {
                gcs_configuration: Some(GcsConfiguration {
                    bucket: "public-logs".to_string(),
                    ..GcsConfiguration::default()
                }),
                ..DecorationConfig::default()
            }),
            ..JobBase::default()
        };

        update_decoration(&rules, &mut base);
        let gcs = base
            .decoration_config
            .unwrap()
            .gcs_configuration
            .unwrap();
        assert_eq!(gcs.bucket, "private-logs");
    }

    #[test]
    fn test_ssh_key_secret_appends() {
        let t = Transform {
            ssh_key_secret: "private-key".to_string(),
            ..Transform::default()
        };
        let rules = RuleSet::new(t).unwrap();
        let mut base = JobBase {
            decoration_config: Some(DecorationConfig {
                ssh_key_secrets: vec!["existing-key".to_string()],
                ..DecorationConfig::default()
            }),
            ..JobBase::default()
        };

        update_decoration(&rules, &mut base);
        assert_eq!(
            base.decoration_config.unwrap().ssh_key_secrets,
            vec!["existing-key", "private-key"]
        );
    }
}
