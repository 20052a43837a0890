//! Build command implementation
//!
//! Implements `debsmith build`: preflight, then the full pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use super::WorkspaceArgs;
use crate::cli::output::{status, OutputConfig, TerminalProgress};
use crate::core::pipeline::{Orchestrator, RunSummary};
use crate::core::preflight;
use crate::core::settings::{BuildRequest, RunConfig};
use crate::error::DebsmithError;
use crate::infra::dirs::DebsmithDirs;
use crate::infra::process::SystemRunner;
use crate::infra::webhook::WebhookNotifier;

/// Arguments for `debsmith build`
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub location: WorkspaceArgs,

    /// Directory receiving the built packages
    #[arg(short, long, env = "DEBSMITH_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Run component jobs in parallel (optionally with a job count; default: processor count)
    #[arg(short = 'j', long, num_args = 0..=1, default_missing_value = "0", value_name = "N")]
    pub parallel: Option<usize>,

    /// Only package these components (comma, semicolon or space separated)
    #[arg(short, long)]
    pub packages: Option<String>,

    /// Install missing system dependencies before building
    #[arg(long)]
    pub resolve_deps: bool,

    /// Push artifacts to the configured repository host
    #[arg(long)]
    pub publish: bool,

    /// Webhook URL receiving job notifications
    #[arg(long, env = "DEBSMITH_WEBHOOK_URL", value_name = "URL")]
    pub notify: Option<String>,

    /// Root of the per-component scratch directories
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Target OS name
    #[arg(long)]
    pub os_name: Option<String>,

    /// Target OS codename
    #[arg(long)]
    pub os_codename: Option<String>,

    /// Distribution channel
    #[arg(long)]
    pub distro: Option<String>,

    /// Build identifier appended to package descriptions (default: git revision)
    #[arg(long)]
    pub build_id: Option<String>,

    /// Exit with a failure status if any component fails
    #[arg(long)]
    pub strict: bool,

    /// Keep scratch directories after collection
    #[arg(long)]
    pub keep_scratch: bool,
}

impl BuildArgs {
    /// Convert into a pipeline request
    pub fn into_request(self) -> BuildRequest {
        BuildRequest {
            workspace: self.location.workspace,
            output: self.output,
            parallel: self.parallel,
            packages: self.packages,
            resolve_deps: self.resolve_deps,
            publish: self.publish,
            notify_url: self.notify,
            scratch_dir: self.scratch_dir,
            os_name: self.os_name,
            os_codename: self.os_codename,
            distro: self.distro,
            build_id: self.build_id,
            strict: self.strict,
            keep_scratch: self.keep_scratch,
        }
    }
}

/// Execute the build command
pub async fn execute(args: BuildArgs, output: OutputConfig) -> Result<()> {
    let dirs = DebsmithDirs::new();
    let file = args.location.file_config(&dirs)?;
    let config = RunConfig::resolve(args.into_request(), file, &dirs)?;

    preflight::check_tools(&preflight::required_tools(&config))
        .map_err(DebsmithError::from)
        .context("Preflight check failed")?;

    tracing::info!(
        "Packaging {} for {}",
        config.workspace.root().display(),
        config.target.describe()
    );

    let strict = config.strict;
    let webhook = config.webhook_url.clone();
    let mut orchestrator = Orchestrator::new(config, Arc::new(SystemRunner));
    if let Some(url) = webhook {
        orchestrator = orchestrator.with_notifier(Arc::new(WebhookNotifier::new(url)));
    }
    if output.shows_progress() {
        orchestrator = orchestrator.with_progress(Arc::new(TerminalProgress::new()));
    }

    let summary = orchestrator.run().await?;
    print_summary(&summary, output)?;
    summary.status(strict)?;
    Ok(())
}

/// Print a run summary as text or JSON
pub fn print_summary(summary: &RunSummary, output: OutputConfig) -> Result<()> {
    if output.json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    if output.quiet {
        return Ok(());
    }

    println!(
        "{} {} of {} components packaged",
        if summary.has_failures() {
            status::WARNING
        } else {
            status::SUCCESS
        },
        summary.built.len(),
        summary.attempted()
    );
    for failed in &summary.failed {
        let reason = failed.reason.lines().next().unwrap_or_default();
        println!("  {} {}: {reason}", status::ERROR, failed.identity);
    }
    if !summary.skipped.is_empty() {
        println!("  {} Skipped: {}", status::INFO, summary.skipped.join(", "));
    }
    for artifact in &summary.artifacts {
        println!("  {}", artifact.display());
    }
    if let Some(ref repacked) = summary.repackaged {
        println!("{} Repackaged {}", status::SUCCESS, repacked.display());
    }
    if let Some(ref publish) = summary.publish {
        if publish.success {
            println!(
                "{} Published {} artifacts to {}",
                status::SUCCESS,
                publish.artifacts,
                publish.host
            );
        } else {
            println!(
                "{} Publishing to {} failed: {}",
                status::ERROR,
                publish.host,
                publish.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    Ok(())
}
