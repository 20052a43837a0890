//! Packaging metadata patcher
//!
//! Runs against a freshly generated packaging directory:
//!
//! - appends the workspace install path to the `CMAKE_PREFIX_PATH=`
//!   assignment in `rules`
//! - appends the build identifier to every `Description:` line in `control`
//! - installs lifecycle hook scripts from the component's hook directory
//!
//! Any failure here fails only the current component's job.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::config::defaults;
use crate::error::PatchError;

/// Lifecycle hook kinds understood by the package manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Runs before unpacking
    PreInstall,
    /// Runs after unpacking
    PostInstall,
    /// Runs before removal
    PreRemove,
    /// Runs after removal
    PostRemove,
}

impl HookKind {
    /// All hook kinds
    pub const ALL: [Self; 4] = [
        Self::PreInstall,
        Self::PostInstall,
        Self::PreRemove,
        Self::PostRemove,
    ];

    /// Script file name, both in the hook source and packaging directories
    pub fn file_name(self) -> &'static str {
        match self {
            Self::PreInstall => "preinst",
            Self::PostInstall => "postinst",
            Self::PreRemove => "prerm",
            Self::PostRemove => "postrm",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

fn prefix_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"CMAKE_PREFIX_PATH=(?:"(?P<quoted>[^"]*)"|(?P<bare>[^"\s\\]*))"#)
            .expect("prefix path pattern is valid")
    })
}

/// Append `extra` to every `CMAKE_PREFIX_PATH=` value in a rules file
///
/// Returns `None` when the file has no such assignment. The rest of each
/// line is preserved, and a value already listing `extra` is left alone.
/// A quoted value may contain spaces and stays quoted.
pub fn inject_prefix_path(rules: &str, extra: &str) -> Option<String> {
    let re = prefix_path_regex();
    if !re.is_match(rules) {
        return None;
    }

    let patched = re.replace_all(rules, |caps: &Captures<'_>| {
        let (value, quote) = match caps.name("quoted") {
            Some(m) => (m.as_str(), "\""),
            None => (caps.name("bare").map_or("", |m| m.as_str()), ""),
        };
        let already_listed = value.split(';').any(|entry| entry == extra);
        let value = if already_listed {
            value.to_string()
        } else if value.is_empty() {
            extra.to_string()
        } else {
            format!("{value};{extra}")
        };
        format!("CMAKE_PREFIX_PATH={quote}{value}{quote}")
    });

    Some(patched.into_owned())
}

/// Append ` <build_id>` to every `Description:` line of a control file
pub fn annotate_descriptions(control: &str, build_id: &str) -> String {
    let mut out = String::with_capacity(control.len() + 16);
    for line in control.split_inclusive('\n') {
        let (body, newline) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line, ""),
        };
        out.push_str(body);
        if body.starts_with("Description:") {
            out.push(' ');
            out.push_str(build_id);
        }
        out.push_str(newline);
    }
    out
}

/// Install lifecycle hooks from `hooks_dir` into `packaging_dir`
///
/// Each kind is handled independently: any stale script is removed first,
/// then the component's script (if it provides one) is copied in with mode
/// 0755. Returns the kinds that were installed.
pub fn install_hooks(hooks_dir: &Path, packaging_dir: &Path) -> Result<Vec<HookKind>, PatchError> {
    let mut installed = Vec::new();

    for kind in HookKind::ALL {
        let dest = packaging_dir.join(kind.file_name());
        let hook_error = |error: std::io::Error| PatchError::Hook {
            kind: kind.to_string(),
            path: dest.clone(),
            error: error.to_string(),
        };

        if dest.exists() {
            fs::remove_file(&dest).map_err(hook_error)?;
        }

        let source = hooks_dir.join(kind.file_name());
        if !source.is_file() {
            continue;
        }

        fs::copy(&source, &dest).map_err(hook_error)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dest, fs::Permissions::from_mode(0o755)).map_err(hook_error)?;
        }
        tracing::debug!("Installed {kind} hook from {}", source.display());
        installed.push(kind);
    }

    Ok(installed)
}

/// Applies all metadata patches to one packaging directory
#[derive(Debug, Clone)]
pub struct MetadataPatcher {
    install_dir: PathBuf,
    build_id: String,
}

impl MetadataPatcher {
    /// Create a patcher for the given install path and build identifier
    pub fn new(install_dir: impl Into<PathBuf>, build_id: impl Into<String>) -> Self {
        Self {
            install_dir: install_dir.into(),
            build_id: build_id.into(),
        }
    }

    /// Build identifier appended to descriptions
    pub fn build_id(&self) -> &str {
        &self.build_id
    }

    /// Patch `packaging_dir`, taking hooks from `hooks_dir`
    pub fn apply(&self, packaging_dir: &Path, hooks_dir: &Path) -> Result<(), PatchError> {
        let rules_path = packaging_dir.join(defaults::RULES_FILE);
        let rules = read(&rules_path)?;
        let install = self.install_dir.to_string_lossy();
        let rules = inject_prefix_path(&rules, &install).ok_or_else(|| {
            PatchError::PrefixPathNotFound {
                path: rules_path.clone(),
            }
        })?;
        write(&rules_path, &rules)?;

        let control_path = packaging_dir.join(defaults::CONTROL_FILE);
        let control = read(&control_path)?;
        write(&control_path, &annotate_descriptions(&control, &self.build_id))?;

        install_hooks(hooks_dir, packaging_dir)?;
        Ok(())
    }
}

fn read(path: &Path) -> Result<String, PatchError> {
    fs::read_to_string(path).map_err(|e| PatchError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

fn write(path: &Path, content: &str) -> Result<(), PatchError> {
    fs::write(path, content).map_err(|e| PatchError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}
