//! Batch transformation pipeline
//!
//! Drives one effective rule set over an input tree: walk the yaml
//! documents, decide a destination for each, filter and rewrite the
//! jobs, and merge the result into the destination. Per-file problems
//! are warnings; only configuration-level errors abort the run.

use std::fs;
use std::path::Path;

use thiserror::Error;
use walkdir::WalkDir;

use crate::config::{ConfigError, RuleSet};
use crate::jobs::{self, is_yaml_path, JobDocument, Preset};
use crate::matcher::PatternError;
use crate::outpath;
use crate::output::{self, OutputBundle};
use crate::rewrite;

/// Fatal pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Filter, rewrite, and group every job of one input document.
pub fn transform_document(
    mut doc: JobDocument,
    rules: &RuleSet,
    file_presets: &[Preset],
) -> Result<OutputBundle, PatternError> {
    // The document's own presets resolve alongside the configured files.
    let mut presets = file_presets.to_vec();
    presets.append(&mut doc.presets);

    let mut bundle = OutputBundle::default();

    for (orgrepo, jobs) in doc.presubmits {
        let Some(private_key) = rules.translate_key(&orgrepo) else {
            continue;
        };

        for mut job in jobs {
            if !rules.keeps_job(&job.base.name, &job.branches, "presubmit")? {
                continue;
            }

            rewrite::rewrite_presubmit(rules, &mut job, &private_key, &presets);
            bundle
                .presubmits
                .entry(private_key.clone())
                .or_default()
                .push(job);
        }
    }

    for (orgrepo, jobs) in doc.postsubmits {
        let Some(private_key) = rules.translate_key(&orgrepo) else {
            continue;
        };

        for mut job in jobs {
            if !rules.keeps_job(&job.base.name, &job.branches, "postsubmit")? {
                continue;
            }

            rewrite::rewrite_postsubmit(rules, &mut job, &private_key, &presets);
            bundle
                .postsubmits
                .entry(private_key.clone())
                .or_default()
                .push(job);
        }
    }

    for mut job in doc.periodics {
        // A periodic's identity is its extra refs; it survives when at
        // least one ref passes the translation gate.
        if job.base.extra_refs.is_empty() {
            continue;
        }

        let branches: Vec<String> = job
            .base
            .extra_refs
            .iter()
            .filter(|r| rules.accepts_org_repo(&r.org, &r.repo))
            .map(|r| r.base_ref.clone())
            .collect();

        if branches.is_empty() {
            continue;
        }

        if !rules.keeps_job(&job.base.name, &branches, "periodic")? {
            continue;
        }

        rewrite::rewrite_periodic(rules, &mut job, &presets);
        bundle.periodics.push(job);
    }

    Ok(bundle)
}

/// Aggregate presets across the configured preset files.
///
/// Unreadable files warn and are skipped.
pub fn combine_presets(paths: &[String]) -> Vec<Preset> {
    let mut presets = Vec::new();

    for path in paths {
        match jobs::read_document(Path::new(path)) {
            Ok(doc) => presets.extend(doc.presets),
            Err(err) => eprintln!("warning: skipping preset file: {}", err),
        }
    }

    presets
}

/// Run one effective rule set over its input tree.
pub fn run(rules: &RuleSet) -> Result<(), PipelineError> {
    let t = &rules.transform;
    let presets = combine_presets(&t.presets);

    for entry in WalkDir::new(&t.input).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !is_yaml_path(path) {
            continue;
        }

        let Some(out_path) = outpath::resolve(rules, path) else {
            continue;
        };

        if t.clean {
            if let Err(err) = fs::remove_file(&out_path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    eprintln!("warning: unable to clean {}: {}", out_path.display(), err);
                }
            }
        }

        let doc = match jobs::read_document(path) {
            Ok(doc) => doc,
            Err(err) => {
                eprintln!("warning: skipping {}: {}", path.display(), err);
                continue;
            }
        };

        let bundle = transform_document(doc, rules, &presets)?;

        if t.verbose {
            println!(
                "write {} presubmits, {} postsubmits, and {} periodics to {}",
                bundle.presubmits.values().map(Vec::len).sum::<usize>(),
                bundle.postsubmits.values().map(Vec::len).sum::<usize>(),
                bundle.periodics.len(),
                out_path.display()
            );
        }

        if !t.dry_run {
            if let Err(err) = output::merge_and_write(&out_path, bundle, rules) {
                eprintln!("warning: {}", err);
            }
        }
    }

    Ok(())
}
