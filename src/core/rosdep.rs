//! rosdep key generation
//!
//! Maps every component's manifest name to the Debian package the build
//! produces, so downstream workspaces can resolve these components as
//! system dependencies:
//!
//! ```yaml
//! nav_core:
//!   ubuntu:
//!     focal:
//!     - ros-noetic-nav-core
//! ```
//!
//! Existing keys are kept unless forced; unrelated entries pass through
//! untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use super::component::Component;
use super::settings::TargetPlatform;
use crate::error::{ConfigError, FilesystemError};
use crate::infra::filesystem;

/// Parsed rosdep file, keyed by rosdep name
pub type RosdepDb = BTreeMap<String, Value>;

/// What a merge changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// Keys that were not present before
    pub added: Vec<String>,
    /// Keys that were replaced (force only)
    pub updated: Vec<String>,
    /// Keys left alone because they already existed
    pub kept: Vec<String>,
}

/// rosdep entry for one component
pub fn entry_for(component: &Component, target: &TargetPlatform) -> Value {
    let mut codenames = Mapping::new();
    codenames.insert(
        Value::String(target.os_codename.clone()),
        Value::Sequence(vec![Value::String(
            component.debian_name(&target.distro),
        )]),
    );

    let mut entry = Mapping::new();
    entry.insert(
        Value::String(target.os_name.clone()),
        Value::Mapping(codenames),
    );
    Value::Mapping(entry)
}

/// Load a rosdep file; a missing file is an empty database
pub fn load(path: &Path) -> Result<RosdepDb, ConfigError> {
    if !path.exists() {
        return Ok(RosdepDb::new());
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    if content.trim().is_empty() {
        return Ok(RosdepDb::new());
    }
    serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Merge entries for `components` into `db`
pub fn merge(
    db: &mut RosdepDb,
    components: &[Component],
    target: &TargetPlatform,
    force: bool,
) -> MergeSummary {
    let mut summary = MergeSummary::default();

    for component in components {
        let key = component.name.clone();
        let entry = entry_for(component, target);
        match db.get(&key) {
            None => {
                db.insert(key.clone(), entry);
                summary.added.push(key);
            }
            Some(existing) if force && *existing != entry => {
                db.insert(key.clone(), entry);
                summary.updated.push(key);
            }
            Some(_) => {
                tracing::debug!("Keeping existing rosdep key {key}");
                summary.kept.push(key);
            }
        }
    }

    summary
}

/// Structural problems in a database
///
/// Every entry needs an `ubuntu` key holding either a list of package names
/// or a map from codename to such lists.
pub fn validate(db: &RosdepDb) -> Vec<String> {
    let mut issues = Vec::new();
    let strings = |v: &Value| {
        v.as_sequence()
            .is_some_and(|seq| seq.iter().all(|item| item.as_str().is_some()))
    };

    for (name, entry) in db {
        match entry.get("ubuntu") {
            None => issues.push(format!("{name}: missing 'ubuntu' key")),
            Some(list @ Value::Sequence(_)) => {
                if !strings(list) {
                    issues.push(format!("{name}: 'ubuntu' list must contain strings"));
                }
            }
            Some(Value::Mapping(codenames)) => {
                for (codename, packages) in codenames {
                    if !strings(packages) {
                        issues.push(format!(
                            "{name}: '{}' must be a list of strings",
                            codename.as_str().unwrap_or("?")
                        ));
                    }
                }
            }
            Some(_) => issues.push(format!("{name}: 'ubuntu' must be a list or map")),
        }
    }

    issues
}

/// Write a database, keeping a `.backup` copy of the previous file
pub fn save(path: &Path, db: &RosdepDb) -> Result<Option<PathBuf>, FilesystemError> {
    let yaml = serde_yaml::to_string(db).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    let backup = if path.exists() {
        let mut name = path.as_os_str().to_owned();
        name.push(".backup");
        let backup = PathBuf::from(name);
        std::fs::copy(path, &backup).map_err(|e| FilesystemError::WriteFile {
            path: backup.clone(),
            error: e.to_string(),
        })?;
        Some(backup)
    } else {
        None
    };

    filesystem::write_file(path, &yaml)?;
    Ok(backup)
}
