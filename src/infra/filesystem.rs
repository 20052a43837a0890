//! Filesystem operations
//!
//! Handles file and directory operations used by the collector,
//! the metadata patcher and the aggregate repackager.

use std::path::{Path, PathBuf};

use crate::error::FilesystemError;

/// Anchor a relative path at the current directory
///
/// Paths are not canonicalized; they may not exist yet.
pub fn absolute(path: &Path) -> Result<PathBuf, FilesystemError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| FilesystemError::ReadDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    Ok(cwd.join(path))
}

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Remove a file if it exists
pub fn remove_file(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_file(path).map_err(|e| FilesystemError::RemoveFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Write content to a file
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Move a file, replacing any existing destination
///
/// Falls back to copy and remove when a rename crosses filesystems.
pub fn move_file(from: &Path, to: &Path) -> Result<(), FilesystemError> {
    let move_error = |e: std::io::Error| FilesystemError::MoveFile {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        error: e.to_string(),
    };

    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }

    std::fs::copy(from, to).map_err(move_error)?;
    std::fs::remove_file(from).map_err(move_error)
}

/// List regular files directly inside `dir` whose extension is in `extensions`
///
/// The result is sorted so collection order is deterministic.
pub fn files_with_extensions(
    dir: &Path,
    extensions: &[String],
) -> Result<Vec<PathBuf>, FilesystemError> {
    let entries = std::fs::read_dir(dir).map_err(|e| FilesystemError::ReadDir {
        path: dir.to_path_buf(),
        error: e.to_string(),
    })?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
        })
        .collect();
    files.sort();
    Ok(files)
}
