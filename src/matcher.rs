//! Pattern matching for allow/deny rules
//!
//! Rule patterns are regular expressions matched unanchored against job
//! names and branch names. An invalid pattern is a configuration error,
//! never a silent non-match.

use regex_lite::Regex;
use thiserror::Error;

/// Errors from compiling rule patterns
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid pattern '{pattern}': {source}")]
    Invalid {
        pattern: String,
        source: regex_lite::Error,
    },
}

/// Returns true if any pattern matches `name`.
///
/// Patterns are compiled as regular expressions and searched unanchored;
/// a pattern may anchor itself with `^`/`$`.
pub fn any_match<I, S>(name: &str, patterns: I) -> Result<bool, PatternError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for pattern in patterns {
        if compile(pattern.as_ref())?.is_match(name) {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Compile a single rule pattern.
pub fn compile(pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(pattern).map_err(|source| PatternError::Invalid {
        pattern: pattern.to_string(),
        source,
    })
}

/// Validate a set of patterns without matching anything.
pub fn validate<I, S>(patterns: I) -> Result<(), PatternError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for pattern in patterns {
        compile(pattern.as_ref())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_match() {
        assert!(any_match("release-test-job", ["test"]).unwrap());
    }

    #[test]
    fn test_anchored_pattern() {
        assert!(any_match("test-job", ["^test"]).unwrap());
        assert!(!any_match("my-test-job", ["^test"]).unwrap());
    }

    #[test]
    fn test_no_patterns_is_no_match() {
        let empty: [&str; 0] = [];
        assert!(!any_match("anything", empty).unwrap());
    }

    #[test]
    fn test_any_of_several() {
        assert!(any_match("nightly-build", ["weekly", "nightly"]).unwrap());
        assert!(!any_match("hourly-build", ["weekly", "nightly"]).unwrap());
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        assert!(any_match("name", ["["]).is_err());
        assert!(validate(["ok", "("]).is_err());
        assert!(validate(["ok", "also.*fine$"]).is_ok());
    }
}
