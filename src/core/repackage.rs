//! Aggregate repackager
//!
//! One-off correction for the aggregate component's artifact: unpack it,
//! drop one dependency from its control metadata, and repack it under a
//! name derived from the control fields. Triggered only when the selection
//! is exactly the aggregate component.

use std::path::{Path, PathBuf};

use super::component::Component;
use super::filter::Selection;
use super::settings::{AggregateConfig, RunConfig};
use crate::error::{FilesystemError, RepackError};
use crate::infra::filesystem;
use crate::infra::process::{CommandRunner, ToolCommand};

/// Check if the aggregate hook applies to this run
pub fn is_triggered(selection: Option<&Selection>, aggregate: &AggregateConfig) -> bool {
    selection.is_some_and(|s| s.is_exactly(&aggregate.component))
}

/// Value of a single-line control field
pub fn control_field(control: &str, field: &str) -> Option<String> {
    let prefix = format!("{field}:");
    control
        .lines()
        .find_map(|line| line.strip_prefix(&prefix))
        .map(|value| value.trim().to_string())
}

/// Remove `dependency` from the `Depends` field
///
/// Continuation lines are folded into the field. An entry is dropped when
/// its package name (ignoring version constraints) equals `dependency`; the
/// field itself is dropped if nothing remains.
pub fn strip_dependency(control: &str, dependency: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut lines = control.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(value) = line.strip_prefix("Depends:") else {
            out.push(line.to_string());
            continue;
        };

        let mut folded = value.to_string();
        while let Some(next) = lines.peek() {
            if !next.starts_with([' ', '\t']) {
                break;
            }
            folded.push(' ');
            folded.push_str(next.trim());
            lines.next();
        }

        let kept: Vec<&str> = folded
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter(|entry| package_token(entry) != dependency)
            .collect();

        if !kept.is_empty() {
            out.push(format!("Depends: {}", kept.join(", ")));
        }
    }

    let mut result = out.join("\n");
    if control.ends_with('\n') {
        result.push('\n');
    }
    result
}

fn package_token(entry: &str) -> &str {
    entry
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or(entry)
}

/// Find the aggregate component's artifact in `dir`
pub fn find_artifact(dir: &Path, debian_name: &str) -> Result<Option<PathBuf>, FilesystemError> {
    let prefix = format!("{debian_name}_");
    let found = filesystem::files_with_extensions(dir, &["deb".to_string()])?
        .into_iter()
        .find(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix))
        });
    Ok(found)
}

/// Repackage the aggregate component's collected artifact
///
/// Returns the path of the new artifact in the output directory.
pub fn repackage(
    component: &Component,
    aggregate: &AggregateConfig,
    config: &RunConfig,
    runner: &dyn CommandRunner,
) -> Result<PathBuf, RepackError> {
    let debian_name = component.debian_name(&config.target.distro);
    let artifact = find_artifact(&config.output_dir, &debian_name)?.ok_or_else(|| {
        RepackError::ArtifactNotFound {
            component: component.identity.clone(),
            dir: config.output_dir.clone(),
        }
    })?;

    let unpack_dir = config.repack_dir().join(&component.identity);
    filesystem::remove_dir_all(&unpack_dir)?;
    if let Some(parent) = unpack_dir.parent() {
        filesystem::create_dir_all(parent)?;
    }

    run_archive(
        runner,
        ToolCommand::new(&config.tools.archive)
            .arg("-R")
            .arg(artifact.to_string_lossy())
            .arg(unpack_dir.to_string_lossy()),
    )?;

    let control_path = unpack_dir.join("DEBIAN").join("control");
    let control = filesystem::read_file(&control_path)?;
    let control = strip_dependency(&control, &aggregate.drop_dependency);
    filesystem::write_file(&control_path, &control)?;

    let field = |name: &str| {
        control_field(&control, name).ok_or_else(|| RepackError::MissingField {
            path: control_path.clone(),
            field: name.to_string(),
        })
    };
    let package = field("Package")?;
    let version = field("Version")?;
    let arch = field("Architecture")?;
    let version = version.split_once(':').map_or(version.as_str(), |(_, v)| v);

    let repacked = config
        .output_dir
        .join(format!("{package}_{version}_{arch}.deb"));

    if repacked == artifact {
        filesystem::remove_file(&artifact)?;
    }

    run_archive(
        runner,
        ToolCommand::new(&config.tools.archive)
            .arg("-b")
            .arg(unpack_dir.to_string_lossy())
            .arg(repacked.to_string_lossy()),
    )?;

    if repacked != artifact {
        filesystem::remove_file(&artifact)?;
    }
    filesystem::remove_dir_all(&unpack_dir)?;

    tracing::info!(
        "Repackaged {} without {} as {}",
        component.identity,
        aggregate.drop_dependency,
        repacked.display()
    );
    Ok(repacked)
}

fn run_archive(runner: &dyn CommandRunner, command: ToolCommand) -> Result<(), RepackError> {
    let tool_error = |error: String| RepackError::ToolFailed {
        command: command.command_line(),
        error,
    };
    let output = runner.run(&command).map_err(|e| tool_error(e.to_string()))?;
    if !output.success() {
        return Err(tool_error(output.failure_reason()));
    }
    Ok(())
}
