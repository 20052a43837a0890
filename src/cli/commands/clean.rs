//! CLI implementation for `debsmith clean`
//!
//! Removes generated packaging directories and the scratch root without
//! touching artifacts.

use anyhow::{Context, Result};

use super::WorkspaceArgs;
use crate::cli::output::{status, OutputConfig};
use crate::core::scanner;
use crate::error::DebsmithError;
use crate::infra::dirs::DebsmithDirs;
use crate::infra::filesystem;

/// Execute the clean command
pub fn execute(location: &WorkspaceArgs, output: OutputConfig) -> Result<()> {
    let dirs = DebsmithDirs::new();
    let file = location.file_config(&dirs)?;
    let workspace = location.open(&file.layout)?;

    let components =
        scanner::scan(workspace.scan_root(), &file.layout).map_err(DebsmithError::from)?;

    let mut removed = Vec::new();
    for component in &components {
        let dir = component.packaging_dir(&file.layout);
        if dir.exists() {
            filesystem::remove_dir_all(&dir)
                .with_context(|| format!("Failed to clean {}", component.identity))?;
            removed.push(dir);
        }
    }

    let scratch = file.scratch_dir.unwrap_or_else(|| dirs.scratch_root());
    let scratch_existed = scratch.exists();
    filesystem::remove_dir_all(&scratch).context("Failed to remove scratch directory")?;

    if output.json {
        println!(
            "{}",
            serde_json::json!({
                "removed": removed,
                "scratch": scratch_existed.then_some(&scratch),
            })
        );
        return Ok(());
    }
    if output.quiet {
        return Ok(());
    }

    if removed.is_empty() && !scratch_existed {
        println!("{} Nothing to clean", status::SUCCESS);
        return Ok(());
    }
    println!("{} Cleaned:", status::SUCCESS);
    for dir in &removed {
        println!("  Removed {}/", dir.display());
    }
    if scratch_existed {
        println!("  Removed {}/", scratch.display());
    }
    Ok(())
}
