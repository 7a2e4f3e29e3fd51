//! Job survival filter
//!
//! A job survives only if it misses the denylist, hits a configured
//! allowlist (or none exists), matches a configured target branch (or
//! the branch filter is inactive), and has its type enabled.

use crate::config::RuleSet;
use crate::matcher::{self, PatternError};

impl RuleSet {
    /// Decide whether a job survives translation.
    ///
    /// `branch_patterns` are the job's own branch regexes, matched
    /// against each configured target branch.
    pub fn keeps_job(
        &self,
        name: &str,
        branch_patterns: &[String],
        job_type: &str,
    ) -> Result<bool, PatternError> {
        if matcher::any_match(name, &self.transform.job_denylist)? {
            return Ok(false);
        }

        if !self.transform.job_allowlist.is_empty()
            && !matcher::any_match(name, &self.transform.job_allowlist)?
        {
            return Ok(false);
        }

        if !self.matches_branch(branch_patterns)? {
            return Ok(false);
        }

        Ok(self.job_types.contains(job_type))
    }

    /// Inactive (always true) when no target branches are configured.
    fn matches_branch(&self, branch_patterns: &[String]) -> Result<bool, PatternError> {
        if self.transform.branches.is_empty() {
            return Ok(true);
        }

        for branch in &self.transform.branches {
            if matcher::any_match(branch, branch_patterns)? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Transform;

    fn rules(mutate: impl FnOnce(&mut Transform)) -> RuleSet {
        let mut t = Transform {
            job_types: vec!["presubmit".to_string(), "periodic".to_string()],
            ..Transform::default()
        };
        mutate(&mut t);
        RuleSet::new(t).unwrap()
    }

    #[test]
    fn test_keeps_unfiltered_job() {
        let r = rules(|_| {});
        assert!(r.keeps_job("test-job", &[], "presubmit").unwrap());
    }

    #[test]
    fn test_denylist_rejects() {
        let r = rules(|t| t.job_denylist = vec!["^test-".to_string()]);
        assert!(!r.keeps_job("test-job", &[], "presubmit").unwrap());
        assert!(r.keeps_job("lint-job", &[], "presubmit").unwrap());
    }

    #[test]
    fn test_allowlist_restricts() {
        let r = rules(|t| t.job_allowlist = vec!["lint".to_string()]);
        assert!(r.keeps_job("lint-job", &[], "presubmit").unwrap());
        assert!(!r.keeps_job("test-job", &[], "presubmit").unwrap());
    }

    #[test]
    fn test_branch_filter() {
        let r = rules(|t| t.branches = vec!["release-1.0".to_string()]);

        // Job branch patterns are regexes matched against target branches.
        let matching = vec!["^release-".to_string()];
        let other = vec!["^master$".to_string()];

        assert!(r.keeps_job("j", &matching, "presubmit").unwrap());
        assert!(!r.keeps_job("j", &other, "presubmit").unwrap());
    }

    #[test]
    fn test_branch_filter_inactive_without_targets() {
        let r = rules(|_| {});
        assert!(r
            .keeps_job("j", &["^master$".to_string()], "presubmit")
            .unwrap());
    }

    #[test]
    fn test_type_gate() {
        let r = rules(|_| {});
        assert!(!r.keeps_job("j", &[], "postsubmit").unwrap());
        assert!(r.keeps_job("j", &[], "periodic").unwrap());
    }

    #[test]
    fn test_invalid_job_branch_pattern_is_fatal() {
        let r = rules(|t| t.branches = vec!["master".to_string()]);
        assert!(r.keeps_job("j", &["(".to_string()], "presubmit").is_err());
    }
}
