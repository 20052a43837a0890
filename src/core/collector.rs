//! Artifact collector
//!
//! Runs once after every job has finished. For every discovered component,
//! selected or not, artifacts in its parent directory are moved into the
//! output directory (overwriting same-named files) and the generated
//! packaging directory is removed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::component::Component;
use super::settings::RunConfig;
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Move artifacts and clean per-component state
///
/// Returns the collected artifact paths inside the output directory.
pub fn collect(components: &[Component], config: &RunConfig) -> Result<Vec<PathBuf>, FilesystemError> {
    filesystem::create_dir_all(&config.output_dir)?;

    let source_dirs: BTreeSet<&Path> = components.iter().map(Component::artifact_dir).collect();
    let mut collected = Vec::new();

    for dir in source_dirs {
        if same_dir(dir, &config.output_dir) {
            continue;
        }
        for artifact in filesystem::files_with_extensions(dir, &config.layout.artifact_extensions)? {
            let Some(file_name) = artifact.file_name() else {
                continue;
            };
            let dest = config.output_dir.join(file_name);
            filesystem::move_file(&artifact, &dest)?;
            tracing::info!("Collected {}", dest.display());
            collected.push(dest);
        }
    }

    for component in components {
        filesystem::remove_dir_all(&component.packaging_dir(&config.layout))?;
        if !config.keep_scratch {
            filesystem::remove_dir_all(&config.build_dir(&component.identity))?;
            filesystem::remove_dir_all(&config.tmp_dir(&component.identity))?;
        }
    }

    collected.sort();
    Ok(collected)
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
