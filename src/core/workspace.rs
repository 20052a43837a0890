//! Workspace root validation

use std::path::{Path, PathBuf};

use super::settings::LayoutConfig;
use crate::error::WorkspaceError;

/// A validated workspace root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    scan_root: PathBuf,
    install_dir: PathBuf,
}

impl Workspace {
    /// Open a workspace, requiring the root to exist and carry the marker file
    pub fn open(root: &Path, layout: &LayoutConfig) -> Result<Self, WorkspaceError> {
        if !root.is_dir() {
            return Err(WorkspaceError::NotFound {
                path: root.to_path_buf(),
            });
        }

        if !root.join(&layout.marker).exists() {
            return Err(WorkspaceError::MissingMarker {
                path: root.to_path_buf(),
                marker: layout.marker.clone(),
            });
        }

        // Absolute paths are handed to tools running with another cwd.
        let root = root
            .canonicalize()
            .map_err(|_| WorkspaceError::NotFound {
                path: root.to_path_buf(),
            })?;

        let source = root.join(&layout.source_subdir);
        let scan_root = if source.is_dir() { source } else { root.clone() };

        Ok(Self {
            scan_root,
            install_dir: root.join(&layout.install_subdir),
            root,
        })
    }

    /// Workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory scanned for components
    pub fn scan_root(&self) -> &Path {
        &self.scan_root
    }

    /// Install tree produced by the workspace build
    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }
}
