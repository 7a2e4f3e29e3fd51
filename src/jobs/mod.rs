//! Job document schema
//!
//! One input unit: presubmit and postsubmit jobs keyed by `org/repo`,
//! periodic jobs self-described through extra refs, and any presets the
//! document defines inline. The schema models the fields the transform
//! rules touch; unknown fields pass through via flattened catch-alls.

mod io;
mod pod;

pub use io::{is_yaml_path, read_document, DocumentError};
pub use pod::{Container, EnvVar, PodSpec, Volume, VolumeMount};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// One parsed job-definition document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDocument {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub presubmits: BTreeMap<String, Vec<Presubmit>>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub postsubmits: BTreeMap<String, Vec<Postsubmit>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub periodics: Vec<Periodic>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub presets: Vec<Preset>,
}

/// Fields shared by every job kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobBase {
    pub name: String,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub cluster: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub clone_uri: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_refs: Vec<Refs>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoration_config: Option<DecorationConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter_config: Option<ReporterConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerun_auth_config: Option<RerunAuthConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<PodSpec>,

    #[serde(flatten)]
    pub rest: BTreeMap<String, Value>,
}

/// A pre-merge check job, keyed by repo identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Presubmit {
    #[serde(flatten)]
    pub base: JobBase,

    pub always_run: bool,

    #[serde(skip_serializing_if = "is_false")]
    pub optional: bool,

    #[serde(skip_serializing_if = "is_false")]
    pub skip_report: bool,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skip_branches: Vec<String>,
}

/// A post-merge job, keyed by repo identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Postsubmit {
    #[serde(flatten)]
    pub base: JobBase,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skip_branches: Vec<String>,
}

/// A time-scheduled job; its repo identity lives in its extra refs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Periodic {
    #[serde(flatten)]
    pub base: JobBase,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub interval: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub cron: String,
}

/// A secondary repository reference a job checks out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Refs {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub org: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub repo: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub base_ref: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub clone_uri: String,

    #[serde(flatten)]
    pub rest: BTreeMap<String, Value>,
}

/// Log/artifact decoration settings attached to a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcs_configuration: Option<GcsConfiguration>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ssh_key_secrets: Vec<String>,

    #[serde(flatten)]
    pub rest: BTreeMap<String, Value>,
}

/// GCS upload settings inside the decoration config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcsConfiguration {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub bucket: String,

    #[serde(flatten)]
    pub rest: BTreeMap<String, Value>,
}

/// Status-reporting settings attached to a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack: Option<SlackReporterConfig>,

    #[serde(flatten)]
    pub rest: BTreeMap<String, Value>,
}

/// Slack channel for job status notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackReporterConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub channel: String,

    #[serde(flatten)]
    pub rest: BTreeMap<String, Value>,
}

/// Who may re-trigger a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerunAuthConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub github_orgs: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub github_users: Vec<String>,
}

/// A label-gated template of env vars, volumes, and mounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preset {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,

    #[serde(rename = "volumeMounts", skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
presubmits:
  foo/bar:
    - name: test-job
      always_run: true
      optional: true
      branches:
        - master
      labels:
        preset-service-account: "true"
      spec:
        containers:
          - image: gcr.io/ci/builder:v1
            env:
              - name: GOPROXY
                value: direct
periodics:
  - name: nightly
    interval: 24h
    extra_refs:
      - org: foo
        repo: bar
        base_ref: master
"#;

    #[test]
    fn test_parse_document() {
        let doc: JobDocument = serde_yaml::from_str(DOC).unwrap();
        let pre = &doc.presubmits["foo/bar"][0];
        assert_eq!(pre.base.name, "test-job");
        assert!(pre.always_run);
        assert!(pre.optional);
        assert_eq!(pre.branches, vec!["master"]);

        let spec = pre.base.spec.as_ref().unwrap();
        assert_eq!(spec.containers[0].image, "gcr.io/ci/builder:v1");
        assert_eq!(spec.containers[0].env[0].name, "GOPROXY");

        assert_eq!(doc.periodics[0].base.extra_refs[0].org, "foo");
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let src = r#"
presubmits:
  foo/bar:
    - name: j
      always_run: false
      trigger: "/test j"
      rerun_command: "/retest"
"#;
        let doc: JobDocument = serde_yaml::from_str(src).unwrap();
        let pre = &doc.presubmits["foo/bar"][0];
        assert!(pre.base.rest.contains_key("trigger"));

        let out = serde_yaml::to_string(&doc).unwrap();
        assert!(out.contains("rerun_command"));
    }
}
