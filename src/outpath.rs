//! Destination path derivation
//!
//! Decides where a transformed document lands based on the input path's
//! shape relative to the input root and the org mapping. `None` means
//! "skip this file": no rule tier claims it.

use std::path::{Component, Path, PathBuf};

use regex_lite::Regex;

use crate::config::RuleSet;
use crate::jobs::is_yaml_path;

/// Separator used inside generated filenames.
pub const FILENAME_SEPARATOR: &str = ".";

/// Derive the output path for one input document.
///
/// Tiers, in priority order: a document output target routes everything
/// to itself; `org/repo/file` and `org/file` shapes rewrite the filename's
/// org prefix and land under the mapped top-level org; flat files gain
/// the modifier prefix directly under the output root.
pub fn resolve(rules: &RuleSet, current: &Path) -> Option<PathBuf> {
    let t = &rules.transform;
    let output = Path::new(&t.output);

    if is_yaml_path(output) {
        return Some(output.to_path_buf());
    }

    let rel = current.strip_prefix(&t.input).unwrap_or(current);
    let segments: Vec<&str> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();

    match segments.len() {
        n if n >= 3 => {
            let org = segments[n - 3];
            let repo = segments[n - 2];
            let file = segments[n - 1];

            let new_org = t.org_map.get(org)?;
            let mut filename = rename_org_prefix(file, org, new_org);
            if !t.branches_out.is_empty() && !t.branches.is_empty() {
                filename = normalize_config_name(
                    &filename.replace(&t.branches[0], &t.branches_out[0]),
                );
            }

            Some(output.join(top_level_org(new_org)).join(repo).join(filename))
        }
        2 => {
            let org = segments[0];
            let file = segments[1];

            let new_org = t.org_map.get(org)?;
            let filename = rename_org_prefix(file, org, new_org);

            Some(output.join(top_level_org(new_org)).join(filename))
        }
        1 | 0 => {
            let file = match segments.first() {
                Some(file) => file.to_string(),
                None => Path::new(&t.input)
                    .file_name()?
                    .to_str()?
                    .to_string(),
            };

            if file.starts_with(&t.modifier) {
                return None;
            }

            Some(output.join(format!("{}{}{}", t.modifier, FILENAME_SEPARATOR, file)))
        }
        _ => None,
    }
}

/// Rewrite a filename's leading org prefix to the new org's form.
///
/// Only a prefix at a word boundary is rewritten; a filename that does
/// not start with the org is returned unchanged.
fn rename_org_prefix(file: &str, org: &str, new_org: &str) -> String {
    let old = normalize_org(org, FILENAME_SEPARATOR);
    let new = normalize_org(new_org, FILENAME_SEPARATOR);

    match Regex::new(&format!(r"^{}\b", old)) {
        Ok(re) => re.replace(file, new.as_str()).into_owned(),
        Err(_) => file.to_string(),
    }
}

/// Normalize an org for filename use: no URL scheme, `/` → separator.
pub fn normalize_org(org: &str, separator: &str) -> String {
    let org = org
        .strip_prefix("https://")
        .or_else(|| org.strip_prefix("http://"))
        .unwrap_or(org);

    org.replace('/', separator)
}

/// First path segment of an org identity.
pub fn top_level_org(org: &str) -> &str {
    org.split('/').next().unwrap_or(org)
}

/// Make a branch-substituted filename safe: `/` → `-`.
pub fn normalize_config_name(name: &str) -> String {
    name.replace('/', "-")
}
