//! CLI implementation for `debsmith publish`
//!
//! Pushes the artifacts already in an output directory to the repository
//! host, without building anything.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use super::WorkspaceArgs;
use crate::cli::output::{status, OutputConfig};
use crate::core::notify::Notifier;
use crate::core::preflight;
use crate::core::publish;
use crate::error::{ConfigError, DebsmithError};
use crate::infra::dirs::DebsmithDirs;
use crate::infra::filesystem;
use crate::infra::process::SystemRunner;
use crate::infra::webhook::WebhookNotifier;

/// Arguments for `debsmith publish`
#[derive(Args, Debug, Clone)]
pub struct PublishArgs {
    #[command(flatten)]
    pub location: WorkspaceArgs,

    /// Directory holding the artifacts to publish
    #[arg(short, long, env = "DEBSMITH_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Webhook URL receiving the publish notification
    #[arg(long, env = "DEBSMITH_WEBHOOK_URL", value_name = "URL")]
    pub notify: Option<String>,
}

/// Execute the publish command
pub async fn execute(args: PublishArgs, output: OutputConfig) -> Result<()> {
    let file = args.location.file_config(&DebsmithDirs::new())?;
    let remote = file.publish.clone().ok_or_else(|| {
        DebsmithError::from(ConfigError::Contradictory {
            message: "publishing requires a [publish] section with host, remote_path \
                      and remote_command"
                .to_string(),
        })
    })?;
    let output_dir = args
        .output
        .or(file.output.clone())
        .ok_or_else(|| {
            DebsmithError::from(ConfigError::Missing {
                name: "output".to_string(),
            })
        })?;

    preflight::check_tools(&[&file.tools.copy, &file.tools.remote_shell])
        .map_err(DebsmithError::from)?;

    let artifacts = filesystem::files_with_extensions(&output_dir, &file.layout.artifact_extensions)
        .with_context(|| format!("Failed to list {}", output_dir.display()))?;

    let notifier: Option<Arc<dyn Notifier>> = args
        .notify
        .or(file.webhook_url.clone())
        .map(|url| Arc::new(WebhookNotifier::new(url)) as Arc<dyn Notifier>);

    let report = publish::publish(
        artifacts,
        remote,
        file.tools.clone(),
        Arc::new(SystemRunner),
        notifier.as_deref(),
    )
    .await;

    if output.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !output.quiet && report.success {
        println!(
            "{} Published {} artifacts to {}",
            status::SUCCESS,
            report.artifacts,
            report.host
        );
    }

    if let Some(error) = report.error {
        bail!(error);
    }
    Ok(())
}
