//! Git operations
//!
//! Resolves the short source revision used as the build identifier, using
//! the gix crate instead of shelling out to git.

use std::path::Path;

use crate::config::defaults;
use crate::error::GitError;

/// Short hex id of HEAD in the repository containing `path`
///
/// The repository is discovered upwards from `path`, so a component inside a
/// multi-repository workspace resolves to its own checkout.
pub fn short_revision(path: &Path, len: usize) -> Result<String, GitError> {
    let repo = gix::discover(path).map_err(|e| GitError::NotARepository {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    let head = repo.head_id().map_err(|e| GitError::HeadUnresolved {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    Ok(head.to_hex_with_len(len).to_string())
}

/// Build identifier for a component directory
///
/// Falls back to [`defaults::UNKNOWN_BUILD_ID`] outside a repository so the
/// identifier always has a fixed length.
pub fn build_id(path: &Path) -> String {
    match short_revision(path, defaults::BUILD_ID_LEN) {
        Ok(rev) => rev,
        Err(e) => {
            tracing::warn!("{e}; using build id {}", defaults::UNKNOWN_BUILD_ID);
            defaults::UNKNOWN_BUILD_ID.to_string()
        }
    }
}
