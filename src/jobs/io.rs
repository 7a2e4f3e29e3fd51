//! Job document I/O
//!
//! Reading is tolerant by design: callers treat a failed read as "no jobs
//! here" and carry on, per the recoverable-error policy for input files.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::JobDocument;

/// Errors when reading a job document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Read and parse one job document.
pub fn read_document(path: &Path) -> Result<JobDocument, DocumentError> {
    let contents = fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&contents).map_err(|source| DocumentError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// True for `.yaml`/`.yml` paths.
pub fn is_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
