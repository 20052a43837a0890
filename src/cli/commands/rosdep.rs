//! CLI implementation for `debsmith rosdep`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::WorkspaceArgs;
use crate::cli::output::{status, OutputConfig};
use crate::core::rosdep;
use crate::core::scanner;
use crate::core::settings::TargetPlatform;
use crate::error::DebsmithError;
use crate::infra::dirs::DebsmithDirs;

/// Arguments for `debsmith rosdep`
#[derive(Args, Debug, Clone)]
pub struct RosdepArgs {
    #[command(flatten)]
    pub location: WorkspaceArgs,

    /// rosdep file to create or update [default: <workspace>/rosdep.yaml]
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Replace keys that already exist
    #[arg(long)]
    pub force: bool,

    /// Target OS name
    #[arg(long)]
    pub os_name: Option<String>,

    /// Target OS codename
    #[arg(long)]
    pub os_codename: Option<String>,

    /// Distribution channel
    #[arg(long)]
    pub distro: Option<String>,
}

/// Execute the rosdep command
pub fn execute(args: &RosdepArgs, output: OutputConfig) -> Result<()> {
    let file = args.location.file_config(&DebsmithDirs::new())?;
    let workspace = args.location.open(&file.layout)?;
    let defaults = TargetPlatform::default();
    let target = TargetPlatform {
        os_name: args.os_name.clone().or(file.os_name).unwrap_or(defaults.os_name),
        os_codename: args
            .os_codename
            .clone()
            .or(file.os_codename)
            .unwrap_or(defaults.os_codename),
        distro: args.distro.clone().or(file.distro).unwrap_or(defaults.distro),
    };

    let path = args
        .file
        .clone()
        .unwrap_or_else(|| workspace.root().join("rosdep.yaml"));

    let components =
        scanner::scan(workspace.scan_root(), &file.layout).map_err(DebsmithError::from)?;

    let mut db = rosdep::load(&path).map_err(DebsmithError::from)?;
    for issue in rosdep::validate(&db) {
        tracing::warn!("{}: {issue}", path.display());
    }

    let summary = rosdep::merge(&mut db, &components, &target, args.force);
    if summary.added.is_empty() && summary.updated.is_empty() {
        if !output.quiet && !output.json {
            println!("{} {} is up to date", status::SUCCESS, path.display());
        }
    } else {
        rosdep::save(&path, &db)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if output.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !output.quiet {
        for key in &summary.added {
            println!("  {} Added {key}", status::SUCCESS);
        }
        for key in &summary.updated {
            println!("  {} Updated {key}", status::SUCCESS);
        }
        if !summary.kept.is_empty() {
            println!(
                "  {} Kept {} existing keys (use --force to replace)",
                status::INFO,
                summary.kept.len()
            );
        }
    }
    Ok(())
}
