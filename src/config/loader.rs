//! Transform file discovery and layering
//!
//! Walks the configured transform trees, pairs every transform file with
//! its directory `.defaults.yaml` and the global defaults file, and
//! layers each transform entry into an effective rule set. Precedence,
//! highest first: transform entry, file-level defaults, directory
//! defaults, global defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use walkdir::WalkDir;

use super::{layer, RuleSet, Transform, DEFAULT_JOB_TYPES};
use crate::jobs::is_yaml_path;
use crate::matcher::PatternError;

/// Per-directory defaults filename.
pub const DEFAULTS_FILENAME: &str = ".defaults.yaml";

/// Errors building rule sets from configuration.
///
/// All of these are fatal: a malformed rule document or a bad configured
/// path aborts the run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("path does not exist: {0}")]
    MissingPath(PathBuf),

    #[error("not a yaml file: {0}")]
    NotYaml(PathBuf),

    #[error("an org mapping is required")]
    MissingMapping,
}

/// A transform configuration file: shared defaults plus transform entries.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub defaults: Transform,
    pub transforms: Vec<Transform>,
}

/// Load the global defaults fragment, if a path is configured.
pub fn load_global(path: Option<&Path>) -> Result<Transform, ConfigError> {
    match path {
        Some(path) => Ok(parse_config_file(path)?.defaults),
        None => Ok(Transform::default()),
    }
}

/// Load every transform under the configured roots as an effective rule set.
pub fn load_transforms(
    configs: &[PathBuf],
    global: &Transform,
) -> Result<Vec<RuleSet>, ConfigError> {
    let mut rule_sets = Vec::new();

    for root in configs {
        if !root.exists() {
            return Err(ConfigError::MissingPath(root.clone()));
        }
        if root.is_file() && !is_yaml_path(root) {
            return Err(ConfigError::NotYaml(root.clone()));
        }

        for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
            let path = entry.path();
            if !entry.file_type().is_file()
                || !is_yaml_path(path)
                || entry.file_name().to_str() == Some(DEFAULTS_FILENAME)
            {
                continue;
            }

            let local = load_dir_defaults(path)?;
            let file = parse_config_file(path)?;

            for mut transform in file.transforms {
                if transform.job_types.is_empty() {
                    transform.job_types =
                        DEFAULT_JOB_TYPES.iter().map(|s| s.to_string()).collect();
                }

                let layered = layer(&[
                    transform,
                    file.defaults.clone(),
                    local.clone(),
                    global.clone(),
                ]);

                let rules = RuleSet::new(layered)?;
                validate_rules(&rules)?;
                rule_sets.push(rules);
            }
        }
    }

    Ok(rule_sets)
}

/// Structural checks on an effective rule set.
pub fn validate_rules(rules: &RuleSet) -> Result<(), ConfigError> {
    if rules.transform.org_map.is_empty() {
        return Err(ConfigError::MissingMapping);
    }

    for preset in &rules.transform.presets {
        let path = Path::new(preset);
        if !path.exists() {
            return Err(ConfigError::MissingPath(path.to_path_buf()));
        }
        if path.is_file() && !is_yaml_path(path) {
            return Err(ConfigError::NotYaml(path.to_path_buf()));
        }
    }

    Ok(())
}

/// Defaults from the `.defaults.yaml` next to a transform file, if any.
fn load_dir_defaults(path: &Path) -> Result<Transform, ConfigError> {
    let defaults_path = match path.parent() {
        Some(dir) => dir.join(DEFAULTS_FILENAME),
        None => return Ok(Transform::default()),
    };

    if !defaults_path.is_file() {
        return Ok(Transform::default());
    }

    Ok(parse_config_file(&defaults_path)?.defaults)
}

fn parse_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_parse_config_file_shape() {
        let contents = r#"
defaults:
  modifier: internal
transforms:
  - mapping:
      foo: foo-internal
    job_type:
      - presubmit
"#;
        let file: ConfigFile = serde_yaml::from_str(contents).unwrap();
        assert_eq!(file.defaults.modifier, "internal");
        assert_eq!(file.transforms.len(), 1);
        assert_eq!(file.transforms[0].org_map["foo"], "foo-internal");
    }

    #[test]
    fn test_validate_requires_mapping() {
        let rules = RuleSet::new(Transform::default()).unwrap();
        assert!(matches!(
            validate_rules(&rules),
            Err(ConfigError::MissingMapping)
        ));

        let mut mapped = Transform::default();
        mapped.org_map =
            BTreeMap::from([("foo".to_string(), "foo-private".to_string())]);
        let rules = RuleSet::new(mapped).unwrap();
        assert!(validate_rules(&rules).is_ok());
    }

    #[test]
    fn test_missing_config_root_is_fatal() {
        let configs = vec![PathBuf::from("/nonexistent/transforms")];
        assert!(matches!(
            load_transforms(&configs, &Transform::default()),
            Err(ConfigError::MissingPath(_))
        ));
    }
}
