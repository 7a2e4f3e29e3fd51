//! Output accumulation, merge, and persistence
//!
//! Newly generated jobs for one destination are merged with whatever
//! already exists there (new after old), sorted if a sort order is
//! configured, and written back with the autogenerated header. Absence
//! of the destination is not an error; concurrent writers are not
//! coordinated — last writer wins, by design.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex_lite::Regex;
use thiserror::Error;

use crate::config::RuleSet;
use crate::jobs::{self, JobDocument, Periodic, Postsubmit, Presubmit};

/// Header prepended to every generated document.
pub const AUTOGEN_HEADER: &str =
    "# THIS FILE IS AUTOGENERATED by jobtrans. DO NOT EDIT; change the public jobs instead.\n";

/// Errors persisting a destination document
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Jobs accumulated for one destination path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputBundle {
    pub presubmits: BTreeMap<String, Vec<Presubmit>>,
    pub postsubmits: BTreeMap<String, Vec<Postsubmit>>,
    pub periodics: Vec<Periodic>,
}

impl OutputBundle {
    pub fn is_empty(&self) -> bool {
        self.presubmits.is_empty() && self.postsubmits.is_empty() && self.periodics.is_empty()
    }

    /// Total job count, for reporting.
    pub fn len(&self) -> usize {
        self.presubmits.values().map(Vec::len).sum::<usize>()
            + self.postsubmits.values().map(Vec::len).sum::<usize>()
            + self.periodics.len()
    }

    fn into_document(self) -> JobDocument {
        JobDocument {
            presubmits: self.presubmits,
            postsubmits: self.postsubmits,
            periodics: self.periodics,
            presets: Vec::new(),
        }
    }
}

/// Sort direction for generated jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Parse a `(asc|desc)(ending)?` token; anything else is no sort.
    pub fn parse(token: &str) -> Option<Self> {
        let re = Regex::new(r"^(asc|desc)(?:ending)?$").expect("sort token pattern");
        match re.captures(token)?.get(1)?.as_str() {
            "asc" => Some(SortOrder::Ascending),
            "desc" => Some(SortOrder::Descending),
            _ => None,
        }
    }

    fn ordering(self, a: &str, b: &str) -> std::cmp::Ordering {
        match self {
            SortOrder::Ascending => a.cmp(b),
            SortOrder::Descending => b.cmp(a),
        }
    }
}

/// Merge a fresh bundle into the existing destination document.
///
/// Per-repo lists append new after old; periodics concatenate. Merging
/// an empty bundle reproduces the existing document's jobs unchanged.
pub fn merge_into_existing(existing: JobDocument, bundle: OutputBundle) -> OutputBundle {
    let mut merged = OutputBundle {
        presubmits: existing.presubmits,
        postsubmits: existing.postsubmits,
        periodics: existing.periodics,
    };

    for (orgrepo, jobs) in bundle.presubmits {
        merged.presubmits.entry(orgrepo).or_default().extend(jobs);
    }
    for (orgrepo, jobs) in bundle.postsubmits {
        merged.postsubmits.entry(orgrepo).or_default().extend(jobs);
    }
    merged.periodics.extend(bundle.periodics);

    merged
}

/// Sort every job list by name in the given order.
pub fn sort_bundle(bundle: &mut OutputBundle, order: SortOrder) {
    for jobs in bundle.presubmits.values_mut() {
        jobs.sort_by(|a, b| order.ordering(&a.base.name, &b.base.name));
    }
    for jobs in bundle.postsubmits.values_mut() {
        jobs.sort_by(|a, b| order.ordering(&a.base.name, &b.base.name));
    }
    bundle
        .periodics
        .sort_by(|a, b| order.ordering(&a.base.name, &b.base.name));
}

/// Render the destination document: header plus YAML body.
pub fn serialize(bundle: OutputBundle) -> Result<String, OutputError> {
    let body = serde_yaml::to_string(&bundle.into_document())?;
    Ok(format!("{}{}", AUTOGEN_HEADER, body))
}

/// Read-merge-sort-write one destination.
///
/// An empty bundle writes nothing; an unreadable existing document
/// counts as empty.
pub fn merge_and_write(
    path: &Path,
    bundle: OutputBundle,
    rules: &RuleSet,
) -> Result<(), OutputError> {
    if bundle.is_empty() {
        return Ok(());
    }

    let existing = jobs::read_document(path).unwrap_or_default();
    let mut merged = merge_into_existing(existing, bundle);

    if let Some(order) = SortOrder::parse(&rules.transform.sort) {
        sort_bundle(&mut merged, order);
    }

    let contents = serialize(merged)?;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| OutputError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, contents).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobBase;

    fn presubmit(name: &str) -> Presubmit {
        Presubmit {
            base: JobBase {
                name: name.to_string(),
                ..JobBase::default()
            },
            ..Presubmit::default()
        }
    }

    fn periodic(name: &str) -> Periodic {
        Periodic {
            base: JobBase {
                name: name.to_string(),
                ..JobBase::default()
            },
            ..Periodic::default()
        }
    }

    #[test]
    fn test_sort_order_tokens() {
        assert_eq!(SortOrder::parse("asc"), Some(SortOrder::Ascending));
        assert_eq!(SortOrder::parse("ascending"), Some(SortOrder::Ascending));
        assert_eq!(SortOrder::parse("desc"), Some(SortOrder::Descending));
        assert_eq!(SortOrder::parse("descending"), Some(SortOrder::Descending));
        assert_eq!(SortOrder::parse(""), None);
        assert_eq!(SortOrder::parse("alphabetical"), None);
        assert_eq!(SortOrder::parse("ascend"), None);
    }

    #[test]
    fn test_merge_appends_new_after_old() {
        let existing = JobDocument {
            presubmits: BTreeMap::from([(
                "foo-private/bar".to_string(),
                vec![presubmit("old")],
            )]),
            ..JobDocument::default()
        };
        let bundle = OutputBundle {
            presubmits: BTreeMap::from([(
                "foo-private/bar".to_string(),
                vec![presubmit("new")],
            )]),
            ..OutputBundle::default()
        };

        let merged = merge_into_existing(existing, bundle);
        let names: Vec<&str> = merged.presubmits["foo-private/bar"]
            .iter()
            .map(|j| j.base.name.as_str())
            .collect();
        assert_eq!(names, vec!["old", "new"]);
    }

    #[test]
    fn test_merge_empty_bundle_is_non_destructive() {
        let existing = JobDocument {
            presubmits: BTreeMap::from([(
                "foo-private/bar".to_string(),
                vec![presubmit("kept")],
            )]),
            periodics: vec![periodic("nightly")],
            ..JobDocument::default()
        };

        let merged = merge_into_existing(existing.clone(), OutputBundle::default());
        assert_eq!(merged.presubmits, existing.presubmits);
        assert_eq!(merged.periodics, existing.periodics);
    }

    #[test]
    fn test_sort_by_name() {
        let mut bundle = OutputBundle {
            periodics: vec![periodic("b"), periodic("a"), periodic("c")],
            ..OutputBundle::default()
        };

        sort_bundle(&mut bundle, SortOrder::Ascending);
        let names: Vec<&str> =
            bundle.periodics.iter().map(|j| j.base.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        sort_bundle(&mut bundle, SortOrder::Descending);
        let names: Vec<&str> =
            bundle.periodics.iter().map(|j| j.base.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_serialize_prepends_header() {
        let bundle = OutputBundle {
            periodics: vec![periodic("nightly")],
            ..OutputBundle::default()
        };

        let out = serialize(bundle).unwrap();
        assert!(out.starts_with(AUTOGEN_HEADER));
        assert!(out.contains("nightly"));
    }
}
