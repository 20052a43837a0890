//! Workspace scanner
//!
//! Walks the scan root in lexicographic order and returns every component
//! directory. Descent stops at the first directory that qualifies, so no
//! component is ever nested inside another.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::component::Component;
use super::settings::LayoutConfig;
use crate::error::WorkspaceError;

/// Check if a directory holds both component files
pub fn is_component_dir(dir: &Path, layout: &LayoutConfig) -> bool {
    dir.join(&layout.manifest_file).is_file() && dir.join(&layout.build_descriptor_file).is_file()
}

/// Find component directories under `root`, sorted by path
///
/// Hidden directories and subtrees carrying an ignore marker are not
/// descended. An unreadable entry aborts the scan.
pub fn find_component_dirs(
    root: &Path,
    layout: &LayoutConfig,
) -> Result<Vec<PathBuf>, WorkspaceError> {
    let mut found = Vec::new();
    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| WorkspaceError::ScanFailed {
            path: e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf),
            error: e.to_string(),
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = entry.path();
        let hidden = entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.');
        if hidden || layout.ignore_markers.iter().any(|m| dir.join(m).exists()) {
            tracing::debug!("Not descending into {}", dir.display());
            walker.skip_current_dir();
            continue;
        }

        if is_component_dir(dir, layout) {
            found.push(dir.to_path_buf());
            walker.skip_current_dir();
        }
    }

    Ok(found)
}

/// Scan `root` and load every component
///
/// Two components declaring the same identity would share scratch
/// directories, so that is a scan error.
pub fn scan(root: &Path, layout: &LayoutConfig) -> Result<Vec<Component>, WorkspaceError> {
    let dirs = find_component_dirs(root, layout)?;
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut components = Vec::with_capacity(dirs.len());

    for dir in dirs {
        let component = Component::load(&dir, layout)?;
        if let Some(first) = seen.get(&component.identity) {
            return Err(WorkspaceError::DuplicateIdentity {
                identity: component.identity,
                first: first.clone(),
                second: dir,
            });
        }
        seen.insert(component.identity.clone(), dir);
        components.push(component);
    }

    tracing::info!("Discovered {} components under {}", components.len(), root.display());
    Ok(components)
}
