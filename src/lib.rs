//! jobtrans - Public-to-private CI job transformer
//!
//! This crate transforms public Prow-style job configuration documents
//! into private variants: org/repo identities are remapped, job fields
//! are filtered and rewritten per configured rules, and results are
//! merged into deterministically derived destination files.

pub mod config;
pub mod filter;
pub mod image;
pub mod jobs;
pub mod matcher;
pub mod outpath;
pub mod output;
pub mod pipeline;
pub mod rewrite;
pub mod translate;

pub use config::{RuleSet, Transform};
pub use jobs::JobDocument;
pub use output::OutputBundle;
pub use pipeline::transform_document;
