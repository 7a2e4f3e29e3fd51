//! jobtrans CLI
//!
//! Entry point for the `jobtrans` command-line tool.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use jobtrans::config::{self, RuleSet, Transform, DEFAULT_JOB_TYPES, DEFAULT_MODIFIER};
use jobtrans::pipeline::{self, PipelineError};

#[derive(Parser, Debug)]
#[command(name = "jobtrans")]
#[command(about = "Transform public CI job definitions into private variants", version)]
struct Cli {
    /// Input directory (or file) containing job definitions
    #[arg(long, short = 'i', default_value = ".")]
    input: String,

    /// Output directory (or file) for generated job definitions
    #[arg(long, short = 'o', default_value = ".")]
    output: String,

    /// Public-to-private org mapping (PUBLIC=PRIVATE)
    #[arg(long = "mapping", short = 'm', value_parser = parse_key_val)]
    mapping: Vec<(String, String)>,

    /// Org mapping applied to extra refs before the general mapping
    #[arg(long = "ref-mapping", value_parser = parse_key_val)]
    ref_mapping: Vec<(String, String)>,

    /// Substring replacements applied to container image registries
    #[arg(long = "hub-mapping", value_parser = parse_key_val)]
    hub_mapping: Vec<(String, String)>,

    /// Labels set on every generated job (KEY=VALUE)
    #[arg(long, short = 'l', value_parser = parse_key_val)]
    labels: Vec<(String, String)>,

    /// Annotations replacing each generated job's annotations (KEY=VALUE)
    #[arg(long, short = 'a', value_parser = parse_key_val)]
    annotations: Vec<(String, String)>,

    /// Node selector entries set on every generated job (KEY=VALUE)
    #[arg(long, value_parser = parse_key_val)]
    selector: Vec<(String, String)>,

    /// Environment variables set in every container (KEY=VALUE)
    #[arg(long, short = 'e', value_parser = parse_key_val)]
    env: Vec<(String, String)>,

    /// Transform configuration files or directories
    #[arg(long, value_delimiter = ',')]
    configs: Vec<PathBuf>,

    /// Global defaults file layered under every transform
    #[arg(long)]
    global: Option<PathBuf>,

    /// Preset files resolved into generated jobs
    #[arg(long, short = 'p', value_delimiter = ',')]
    presets: Vec<String>,

    /// GCS bucket for logs and artifacts
    #[arg(long)]
    bucket: Option<String>,

    /// Cluster generated jobs run in
    #[arg(long)]
    cluster: Option<String>,

    /// Slack channel generated jobs report to
    #[arg(long)]
    channel: Option<String>,

    /// SSH key secret added to the decoration config
    #[arg(long)]
    ssh_key_secret: Option<String>,

    /// Suffix for generated job and file names
    #[arg(long, default_value = DEFAULT_MODIFIER)]
    modifier: String,

    /// Service account override for jobs that already name one
    #[arg(long)]
    service_account: Option<String>,

    /// Tag forced onto every container image
    #[arg(long)]
    tag: Option<String>,

    /// Sort generated jobs by name: asc[ending] or desc[ending]
    #[arg(long, short = 's')]
    sort: Option<String>,

    /// Branches a job must match to be transformed
    #[arg(long, value_delimiter = ',')]
    branches: Vec<String>,

    /// Replacement branches for generated presubmits and postsubmits
    #[arg(long, value_delimiter = ',')]
    branches_out: Vec<String>,

    /// Replacement base ref for translated extra refs
    #[arg(long)]
    ref_branch_out: Option<String>,

    /// GitHub orgs allowed to rerun generated jobs
    #[arg(long, value_delimiter = ',')]
    rerun_orgs: Vec<String>,

    /// GitHub users allowed to rerun generated jobs
    #[arg(long, value_delimiter = ',')]
    rerun_users: Vec<String>,

    /// Environment variable names removed from every container
    #[arg(long, value_delimiter = ',')]
    env_denylist: Vec<String>,

    /// Volume names removed from every pod spec
    #[arg(long, value_delimiter = ',')]
    volume_denylist: Vec<String>,

    /// Job name patterns to keep (empty keeps all)
    #[arg(long, value_delimiter = ',')]
    job_allowlist: Vec<String>,

    /// Job name patterns to drop
    #[arg(long, value_delimiter = ',')]
    job_denylist: Vec<String>,

    /// Repo names to keep (empty keeps all)
    #[arg(long, value_delimiter = ',')]
    repo_allowlist: Vec<String>,

    /// Repo names to drop
    #[arg(long, value_delimiter = ',')]
    repo_denylist: Vec<String>,

    /// Job types to transform
    #[arg(long = "job-type", short = 't', value_delimiter = ',')]
    job_type: Vec<String>,

    /// Remove each destination file before writing
    #[arg(long)]
    clean: bool,

    /// Transform without writing any output
    #[arg(long)]
    dry_run: bool,

    /// Translate all extra refs regardless of repo gates
    #[arg(long)]
    refs: bool,

    /// Resolve presets into generated jobs
    #[arg(long)]
    resolve: bool,

    /// Use SSH clone URIs for translated repos
    #[arg(long)]
    ssh_clone: bool,

    /// Replace node selectors instead of overlaying them
    #[arg(long)]
    override_selector: bool,

    /// Keep Gerrit report labels consistent on generated presubmits
    #[arg(long)]
    support_gerrit_reporting: bool,

    /// Skip job name truncation
    #[arg(long)]
    allow_long_job_names: bool,

    /// Print per-file job counts
    #[arg(long)]
    verbose: bool,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

impl Cli {
    fn to_transform(&self) -> Transform {
        let job_types = if self.job_type.is_empty() {
            DEFAULT_JOB_TYPES.iter().map(|s| s.to_string()).collect()
        } else {
            self.job_type.clone()
        };

        Transform {
            org_map: to_map(&self.mapping),
            ref_org_map: to_map(&self.ref_mapping),
            hub_map: to_map(&self.hub_mapping),
            labels: to_map(&self.labels),
            annotations: to_map(&self.annotations),
            selector: to_map(&self.selector),
            env: to_map(&self.env),
            input: self.input.clone(),
            output: self.output.clone(),
            bucket: self.bucket.clone().unwrap_or_default(),
            cluster: self.cluster.clone().unwrap_or_default(),
            channel: self.channel.clone().unwrap_or_default(),
            ssh_key_secret: self.ssh_key_secret.clone().unwrap_or_default(),
            modifier: self.modifier.clone(),
            service_account: self.service_account.clone().unwrap_or_default(),
            tag: self.tag.clone().unwrap_or_default(),
            sort: self.sort.clone().unwrap_or_default(),
            ref_branch_out: self.ref_branch_out.clone().unwrap_or_default(),
            branches: self.branches.clone(),
            branches_out: self.branches_out.clone(),
            extra_refs: Vec::new(),
            presets: self.presets.clone(),
            rerun_orgs: self.rerun_orgs.clone(),
            rerun_users: self.rerun_users.clone(),
            env_denylist: self.env_denylist.clone(),
            volume_denylist: self.volume_denylist.clone(),
            job_allowlist: self.job_allowlist.clone(),
            job_denylist: self.job_denylist.clone(),
            repo_allowlist: self.repo_allowlist.clone(),
            repo_denylist: self.repo_denylist.clone(),
            job_types,
            clean: self.clean,
            dry_run: self.dry_run,
            refs: self.refs,
            resolve: self.resolve,
            ssh_clone: self.ssh_clone,
            override_selector: self.override_selector,
            support_gerrit_reporting: self.support_gerrit_reporting,
            allow_long_job_names: self.allow_long_job_names,
            verbose: self.verbose,
        }
    }
}

fn to_map(pairs: &[(String, String)]) -> BTreeMap<String, String> {
    pairs.iter().cloned().collect()
}

fn run_transforms(cli: &Cli) -> Result<(), PipelineError> {
    // Without config files the command line itself is the one transform
    // and must form a complete rule set.
    let rule_sets = if cli.configs.is_empty() {
        let rules = RuleSet::new(cli.to_transform())?;
        config::validate_rules(&rules)?;
        vec![rules]
    } else {
        let global = config::load_global(cli.global.as_deref())?;
        config::load_transforms(&cli.configs, &global)?
    };

    for rules in &rule_sets {
        pipeline::run(rules)?;
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // A panic anywhere below is a reported failure, not a crash.
    match std::panic::catch_unwind(|| run_transforms(&cli)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            eprintln!("jobtrans: {}", err);
            process::exit(1);
        }
        Err(panic) => {
            let msg = panic
                .downcast_ref::<String>()
                .map(String::as_str)
                .or_else(|| panic.downcast_ref::<&str>().copied())
                .unwrap_or("unknown failure");
            eprintln!("jobtrans: unexpected failure: {}", msg);
            process::exit(1);
        }
    }
}
