//! Org/repo translation
//!
//! Maps a public `org/repo` identity to its private counterpart, gated
//! by the org map and the repo allow/deny lists. Jobs whose identity
//! fails the gate are silently excluded, not errors.

use crate::config::RuleSet;

/// Split an `org/repo` identity at the final separator.
///
/// The org side may itself contain separators (e.g. a host-qualified
/// org); the repo is always the last segment.
pub fn split_org_repo(orgrepo: &str) -> (&str, &str) {
    match orgrepo.rsplit_once('/') {
        Some((org, repo)) => (org, repo),
        None => (orgrepo, ""),
    }
}

impl RuleSet {
    /// True if the org is mapped and the repo passes the allow/deny gates.
    pub fn accepts_org_repo(&self, org: &str, repo: &str) -> bool {
        if !self.transform.org_map.contains_key(org) {
            return false;
        }
        if self.repo_denylist.contains(repo) {
            return false;
        }
        if !self.repo_allowlist.is_empty() && !self.repo_allowlist.contains(repo) {
            return false;
        }

        true
    }

    /// Translate an org/repo pair; `None` when the gate rejects it.
    pub fn translate_org_repo(&self, org: &str, repo: &str) -> Option<String> {
        if !self.accepts_org_repo(org, repo) {
            return None;
        }

        Some(format!("{}/{}", self.transform.org_map[org], repo))
    }

    /// Translate a collection key of the form `org/repo`.
    pub fn translate_key(&self, orgrepo: &str) -> Option<String> {
        let (org, repo) = split_org_repo(orgrepo);
        self.translate_org_repo(org, repo)
    }
}
