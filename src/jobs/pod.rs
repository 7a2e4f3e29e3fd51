//! Container spec subset
//!
//! Models just enough of the pod spec for the rewrite rules: containers
//! with env and mounts, volumes, the node selector, and the service
//! account. Everything else rides along in flattened catch-all maps so
//! documents round-trip without loss.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Pod spec carried by a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodSpec {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub service_account_name: String,

    #[serde(flatten)]
    pub rest: BTreeMap<String, Value>,
}

/// A single container in a pod spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Container {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,

    #[serde(flatten)]
    pub rest: BTreeMap<String, Value>,
}

/// An environment variable entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvVar {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(flatten)]
    pub rest: BTreeMap<String, Value>,
}

impl EnvVar {
    /// Plain name/value pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            rest: BTreeMap::new(),
        }
    }
}

/// A named volume; the source stays opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Volume {
    pub name: String,

    #[serde(flatten)]
    pub rest: BTreeMap<String, Value>,
}

/// A volume mount inside a container; the mount details stay opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeMount {
    pub name: String,

    #[serde(flatten)]
    pub rest: BTreeMap<String, Value>,
}
