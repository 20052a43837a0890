//! CLI implementation for `debsmith scan`

use anyhow::Result;

use super::WorkspaceArgs;
use crate::cli::output::{status, OutputConfig};
use crate::core::filter::{self, Selection};
use crate::core::scanner;
use crate::error::DebsmithError;
use crate::infra::dirs::DebsmithDirs;

/// Execute the scan command
pub fn execute(location: &WorkspaceArgs, packages: Option<&str>, output: OutputConfig) -> Result<()> {
    let file = location.file_config(&DebsmithDirs::new())?;
    let workspace = location.open(&file.layout)?;

    let components =
        scanner::scan(workspace.scan_root(), &file.layout).map_err(DebsmithError::from)?;
    let selection = packages
        .map(|spec| Selection::parse(spec, file.selection_match.unwrap_or_default()))
        .filter(|s| !s.is_empty());
    let components = filter::select(&components, selection.as_ref());

    if output.json {
        println!("{}", serde_json::to_string_pretty(&components)?);
        return Ok(());
    }

    if components.is_empty() {
        println!("{} No components found", status::INFO);
        return Ok(());
    }

    for component in &components {
        println!(
            "{:<32} {:<32} {:<10} {}",
            component.identity,
            component.name,
            component.version,
            component.path.display()
        );
    }
    Ok(())
}
