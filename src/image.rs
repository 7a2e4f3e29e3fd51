//! Container image reference codec
//!
//! Splits an image reference into its registry/repository base and tag,
//! and reassembles the two after rewriting. References are handled as
//! written: short names are not expanded to a canonical registry, so hub
//! substitutions operate on the literal text of the reference.

use thiserror::Error;

/// Tag used when a reference carries none.
pub const DEFAULT_TAG: &str = "latest";

/// Errors from parsing an image reference
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("empty image reference")]
    Empty,

    #[error("invalid image reference '{0}'")]
    Invalid(String),
}

/// A parsed image reference: `registry/repository` plus tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Registry and repository portion, e.g. `gcr.io/team/builder`
    pub base: String,
    /// Tag portion, e.g. `v1.2.3`; defaults to `latest`
    pub tag: String,
}

impl ImageRef {
    /// Parse an image reference string.
    ///
    /// The tag is the text after the last `:` that follows the last `/`
    /// (so registry ports are not mistaken for tags). Digest references
    /// and whitespace are rejected.
    pub fn parse(image: &str) -> Result<Self, ImageError> {
        if image.is_empty() {
            return Err(ImageError::Empty);
        }
        if image.contains(char::is_whitespace) || image.contains('@') {
            return Err(ImageError::Invalid(image.to_string()));
        }

        let tag_start = match image.rfind(':') {
            Some(i) if i > image.rfind('/').unwrap_or(0) => Some(i),
            _ => None,
        };

        let (base, tag) = match tag_start {
            Some(i) => (&image[..i], &image[i + 1..]),
            None => (image, DEFAULT_TAG),
        };

        if base.is_empty() || tag.is_empty() {
            return Err(ImageError::Invalid(image.to_string()));
        }

        Ok(Self {
            base: base.to_string(),
            tag: tag.to_string(),
        })
    }

    /// Reassemble the reference as `base:tag`.
    pub fn format(&self) -> String {
        format!("{}:{}", self.base, self.tag)
    }
}
