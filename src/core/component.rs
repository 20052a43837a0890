//! Component metadata
//!
//! A component is a directory holding both a manifest (`package.xml`) and a
//! build descriptor (`CMakeLists.txt`). Its identity is the first project
//! identifier declared in the build descriptor; the manifest contributes the
//! package name and version.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::settings::LayoutConfig;
use crate::error::WorkspaceError;

/// A discovered component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    /// Component directory
    pub path: PathBuf,
    /// Project identifier, used as the isolation key
    pub identity: String,
    /// Package name from the manifest
    pub name: String,
    /// Package version from the manifest
    pub version: String,
}

/// Fields read from a component manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// `<name>` element
    pub name: Option<String>,
    /// `<version>` element
    pub version: Option<String>,
}

impl Component {
    /// Load a component from a directory known to contain both files
    pub fn load(path: &Path, layout: &LayoutConfig) -> Result<Self, WorkspaceError> {
        let manifest_path = path.join(&layout.manifest_file);
        let manifest_text =
            std::fs::read_to_string(&manifest_path).map_err(|e| WorkspaceError::ScanFailed {
                path: manifest_path.clone(),
                error: e.to_string(),
            })?;
        let manifest = parse_manifest(&manifest_text).map_err(|error| {
            WorkspaceError::InvalidManifest {
                path: manifest_path.clone(),
                error,
            }
        })?;

        let descriptor_path = path.join(&layout.build_descriptor_file);
        let descriptor =
            std::fs::read_to_string(&descriptor_path).map_err(|e| WorkspaceError::ScanFailed {
                path: descriptor_path.clone(),
                error: e.to_string(),
            })?;

        let identity = match parse_project_identity(&descriptor) {
            Some(id) => id,
            None => {
                let fallback = manifest.name.clone().ok_or_else(|| {
                    WorkspaceError::MissingIdentity {
                        path: descriptor_path.clone(),
                    }
                })?;
                tracing::debug!(
                    "{} declares no project(); using manifest name '{fallback}'",
                    descriptor_path.display()
                );
                fallback
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            name: manifest.name.unwrap_or_else(|| identity.clone()),
            version: manifest.version.unwrap_or_default(),
            identity,
        })
    }

    /// Debian package name the generator produces for this component
    pub fn debian_name(&self, distro: &str) -> String {
        debian_package_name(&self.name, distro)
    }

    /// Generated packaging directory inside the component
    pub fn packaging_dir(&self, layout: &LayoutConfig) -> PathBuf {
        self.path.join(&layout.packaging_dir)
    }

    /// Lifecycle hook source directory inside the component
    pub fn hooks_dir(&self, layout: &LayoutConfig) -> PathBuf {
        self.path.join(&layout.hooks_dir)
    }

    /// Directory the packaging build writes artifacts into
    pub fn artifact_dir(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }
}

/// Debian package name for a manifest name: `ros-<distro>-<name>` with
/// underscores turned into dashes
pub fn debian_package_name(name: &str, distro: &str) -> String {
    format!("ros-{distro}-{}", name.replace('_', "-"))
}

fn project_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^[ \t]*project[ \t]*\([ \t\r\n]*([A-Za-z0-9_.+\-]+)")
            .expect("project() pattern is valid")
    })
}

/// First project identifier declared in a build descriptor
///
/// Commented-out declarations are ignored.
pub fn parse_project_identity(descriptor: &str) -> Option<String> {
    project_regex()
        .captures(descriptor)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse the name and version out of a manifest document
pub fn parse_manifest(text: &str) -> Result<Manifest, String> {
    let doc = roxmltree::Document::parse(text).map_err(|e| e.to_string())?;
    let root = doc.root_element();

    let child_text = |tag: &str| {
        root.children()
            .find(|n| n.has_tag_name(tag))
            .and_then(|n| n.text())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    Ok(Manifest {
        name: child_text("name"),
        version: child_text("version"),
    })
}
