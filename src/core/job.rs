//! Component build job
//!
//! Packages one component end to end: run the generator, patch the
//! generated metadata, run the packaging build in identity-keyed scratch
//! directories, and report the outcome. Failures are caught here and turned
//! into a [`JobOutcome`] so sibling jobs keep running.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;

use super::component::Component;
use super::notify::{self, JobEvent, Notification, Notifier};
use super::patcher::MetadataPatcher;
use super::settings::RunConfig;
use crate::error::PackagingError;
use crate::infra::filesystem;
use crate::infra::git;
use crate::infra::process::{CommandRunner, ToolCommand};

/// Outcome of one component job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Artifacts were produced
    Succeeded,
    /// Generator, patch or packaging build failed
    Failed {
        /// First line is the error, followed by a log tail when available
        reason: String,
    },
    /// Component was not selected
    Skipped,
}

impl JobOutcome {
    /// Check if the job succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Check if the job failed
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-component job descriptor
///
/// Built at job start from the shared [`RunConfig`] and dropped at job end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob {
    /// Component being packaged
    pub component: Component,
    /// Target OS name
    pub os_name: String,
    /// Target OS codename
    pub os_codename: String,
    /// Distribution channel
    pub distro: String,
    /// Isolated build directory
    pub build_dir: PathBuf,
    /// Isolated tmp directory
    pub tmp_dir: PathBuf,
    /// Tool log directory
    pub log_dir: PathBuf,
    /// Extra library search paths for shlibdeps
    pub library_paths: Vec<PathBuf>,
    /// Generated packaging directory
    pub packaging_dir: PathBuf,
    /// Lifecycle hook source directory
    pub hooks_dir: PathBuf,
}

impl BuildJob {
    /// Describe the job for `component` under `config`
    pub fn new(component: Component, config: &RunConfig) -> Self {
        let identity = component.identity.clone();
        let install = config.workspace.install_dir();
        Self {
            os_name: config.target.os_name.clone(),
            os_codename: config.target.os_codename.clone(),
            distro: config.target.distro.clone(),
            build_dir: config.build_dir(&identity),
            tmp_dir: config.tmp_dir(&identity),
            log_dir: config.log_dir(&identity),
            library_paths: vec![install.join("lib"), install.join("lib").join(&identity)],
            packaging_dir: component.packaging_dir(&config.layout),
            hooks_dir: component.hooks_dir(&config.layout),
            component,
        }
    }

    /// Packaging generator invocation
    pub fn generator_command(&self, config: &RunConfig) -> ToolCommand {
        ToolCommand::from_argv(&config.tools.generator)
            .args([
                "--os-name".to_string(),
                self.os_name.clone(),
                "--os-version".to_string(),
                self.os_codename.clone(),
                "--ros-distro".to_string(),
                self.distro.clone(),
                self.component.path.to_string_lossy().into_owned(),
            ])
            .current_dir(&self.component.path)
            .log_to(self.log_dir.join("generate.log"))
    }

    /// Packaging build invocation
    pub fn packaging_command(&self, config: &RunConfig) -> ToolCommand {
        let mut shlibdeps = String::from("--dpkg-shlibdeps-params=--ignore-missing-info");
        for path in &self.library_paths {
            shlibdeps.push_str(" -l");
            shlibdeps.push_str(&path.to_string_lossy());
        }

        let mut command = ToolCommand::from_argv(&config.tools.packaging)
            .args([
                "--buildsystem=cmake".to_string(),
                "--parallel".to_string(),
                format!("--sourcedirectory={}", self.component.path.display()),
                format!("--builddirectory={}", self.build_dir.display()),
                format!("--tmpdir={}", self.tmp_dir.display()),
                shlibdeps,
            ])
            .current_dir(&self.component.path)
            .log_to(self.log_dir.join("package.log"));

        if let Some(pin) = config.compiler_pins.get(&self.component.identity) {
            tracing::info!("Pinning compilers for {}", self.component.identity);
            for (key, value) in pin.env() {
                command = command.env(key, value);
            }
        }
        command
    }

    /// Run the job synchronously
    ///
    /// Any stale packaging directory is removed first so the generator
    /// always starts from scratch.
    pub fn execute(&self, config: &RunConfig, runner: &dyn CommandRunner) -> Result<(), PackagingError> {
        let identity = &self.component.identity;
        let scratch_error = |e: crate::error::FilesystemError| PackagingError::Scratch {
            component: identity.clone(),
            error: e.to_string(),
        };

        for dir in [&self.build_dir, &self.tmp_dir, &self.log_dir] {
            filesystem::create_dir_all(dir).map_err(scratch_error)?;
        }
        filesystem::remove_dir_all(&self.packaging_dir).map_err(scratch_error)?;

        tracing::info!("Generating packaging metadata");
        let generator = self.generator_command(config);
        let output = runner
            .run(&generator)
            .map_err(|e| PackagingError::GeneratorFailed {
                component: identity.clone(),
                error: e.to_string(),
            })?;
        if !output.success() {
            return Err(PackagingError::GeneratorFailed {
                component: identity.clone(),
                error: output.failure_reason(),
            });
        }
        if !self.packaging_dir.is_dir() {
            return Err(PackagingError::NoPackagingDir {
                component: identity.clone(),
                path: self.packaging_dir.clone(),
            });
        }

        let build_id = config
            .build_id
            .clone()
            .unwrap_or_else(|| git::build_id(&self.component.path));
        MetadataPatcher::new(config.workspace.install_dir(), build_id)
            .apply(&self.packaging_dir, &self.hooks_dir)?;

        tracing::info!("Running packaging build");
        let output = runner
            .run(&self.packaging_command(config))
            .map_err(|e| PackagingError::PackagingFailed {
                component: identity.clone(),
                error: e.to_string(),
            })?;
        if !output.success() {
            return Err(PackagingError::PackagingFailed {
                component: identity.clone(),
                error: output.failure_reason(),
            });
        }

        Ok(())
    }
}

/// Report of one finished job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    /// Component identity
    pub identity: String,
    /// Component version
    pub version: String,
    /// Outcome
    pub outcome: JobOutcome,
}

/// Everything a job needs, shared across concurrent jobs
#[derive(Clone)]
pub struct JobContext {
    /// Immutable run configuration
    pub config: Arc<RunConfig>,
    /// External command runner
    pub runner: Arc<dyn CommandRunner>,
    /// Optional notification sink
    pub notifier: Option<Arc<dyn Notifier>>,
}

/// Run the job for one component and notify about its outcome
///
/// Components outside the selection are reported as skipped without running
/// anything. The notification carries the packaging result captured right
/// after the job finished.
pub async fn run_job(component: Component, ctx: JobContext) -> JobReport {
    let span = tracing::info_span!("job", component = %component.identity);
    async move {
        let identity = component.identity.clone();
        let version = component.version.clone();

        if let Some(ref selection) = ctx.config.selection {
            if !selection.includes(&identity) {
                tracing::info!("Skipping {identity} (not selected)");
                return JobReport {
                    identity,
                    version,
                    outcome: JobOutcome::Skipped,
                };
            }
        }

        let job = BuildJob::new(component, &ctx.config);
        let config = Arc::clone(&ctx.config);
        let runner = Arc::clone(&ctx.runner);
        let current = tracing::Span::current();
        let result = tokio::task::spawn_blocking(move || {
            let _entered = current.enter();
            job.execute(&config, runner.as_ref())
        })
        .await;

        let outcome = match result {
            Ok(Ok(())) => {
                tracing::info!("Packaged {identity} {version}");
                JobOutcome::Succeeded
            }
            Ok(Err(e)) => {
                tracing::warn!("{e}");
                JobOutcome::Failed {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                tracing::error!("Job for {identity} panicked: {e}");
                JobOutcome::Failed {
                    reason: format!("job aborted: {e}"),
                }
            }
        };

        let event = Notification::Job(JobEvent {
            component: identity.clone(),
            version: version.clone(),
            target: ctx.config.target.describe(),
            outcome: outcome.clone(),
        });
        notify::dispatch(ctx.notifier.as_deref(), event).await;

        JobReport {
            identity,
            version,
            outcome,
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::{MatchMode, Selection};
    use crate::core::settings::{BuildRequest, FileConfig};
    use crate::error::ProcessError;
    use crate::infra::dirs::DebsmithDirs;
    use crate::infra::process::ToolOutput;
    use std::path::Path;
    use tempfile::TempDir;

    fn config(temp: &TempDir) -> RunConfig {
        std::fs::write(temp.path().join(".catkin_workspace"), "").unwrap();
        std::fs::create_dir_all(temp.path().join("src/nav")).unwrap();
        let mut file = FileConfig::default();
        file.compiler_pins.insert(
            "nav".to_string(),
            crate::core::settings::CompilerPin {
                cc: Some("gcc-8".to_string()),
                cxx: None,
            },
        );
        RunConfig::resolve(
            BuildRequest {
                workspace: Some(temp.path().to_path_buf()),
                output: Some(temp.path().join("out")),
                scratch_dir: Some(temp.path().join("scratch")),
                ..BuildRequest::default()
            },
            file,
            &DebsmithDirs::new(),
        )
        .unwrap()
    }

    fn component(config: &RunConfig) -> Component {
        Component {
            path: config.workspace.scan_root().join("nav"),
            identity: "nav".to_string(),
            name: "nav".to_string(),
            version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn test_descriptor_uses_identity_keyed_scratch() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let job = BuildJob::new(component(&config), &config);

        assert!(job.build_dir.ends_with("scratch/build/nav"));
        assert!(job.tmp_dir.ends_with("scratch/tmp/nav"));
        assert_eq!(
            job.library_paths,
            vec![
                config.workspace.install_dir().join("lib"),
                config.workspace.install_dir().join("lib/nav"),
            ]
        );
        assert!(job.packaging_dir.ends_with("src/nav/debian"));
    }

    #[test]
    fn test_generator_command_arguments() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let job = BuildJob::new(component(&config), &config);
        let cmd = job.generator_command(&config);

        assert_eq!(cmd.program, "bloom-generate");
        assert_eq!(
            &cmd.args[..7],
            &[
                "rosdebian",
                "--os-name",
                "ubuntu",
                "--os-version",
                "focal",
                "--ros-distro",
                "noetic"
            ]
        );
        assert_eq!(cmd.cwd.as_deref(), Some(job.component.path.as_path()));
    }

    #[test]
    fn test_packaging_command_arguments() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let job = BuildJob::new(component(&config), &config);
        let cmd = job.packaging_command(&config);

        assert_eq!(cmd.program, "fakeroot");
        assert!(cmd.args.contains(&"--buildsystem=cmake".to_string()));
        assert!(cmd.args.contains(&"--parallel".to_string()));
        assert!(cmd
            .args
            .contains(&format!("--builddirectory={}", job.build_dir.display())));
        let shlibdeps = cmd
            .args
            .iter()
            .find(|a| a.starts_with("--dpkg-shlibdeps-params="))
            .unwrap();
        assert!(shlibdeps.contains("--ignore-missing-info"));
        assert!(shlibdeps.ends_with("install/lib/nav"));
        assert_eq!(cmd.env, vec![("CC".to_string(), "gcc-8".to_string())]);
    }

    #[test]
    fn test_relative_scratch_yields_absolute_job_dirs() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".catkin_workspace"), "").unwrap();
        let config = RunConfig::resolve(
            BuildRequest {
                workspace: Some(temp.path().to_path_buf()),
                output: Some(PathBuf::from("out")),
                scratch_dir: Some(PathBuf::from("scratch")),
                ..BuildRequest::default()
            },
            FileConfig::default(),
            &DebsmithDirs::new(),
        )
        .unwrap();
        let job = BuildJob::new(component(&config), &config);

        assert!(job.build_dir.is_absolute());
        assert!(job.tmp_dir.is_absolute());
        let cmd = job.packaging_command(&config);
        let builddir = cmd
            .args
            .iter()
            .find_map(|a| a.strip_prefix("--builddirectory="))
            .unwrap();
        assert!(Path::new(builddir).is_absolute());
        let tmpdir = cmd
            .args
            .iter()
            .find_map(|a| a.strip_prefix("--tmpdir="))
            .unwrap();
        assert!(Path::new(tmpdir).is_absolute());
    }

    struct RefusingRunner;

    impl CommandRunner for RefusingRunner {
        fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ProcessError> {
            panic!("unexpected command: {}", command.program);
        }
    }

    #[tokio::test]
    async fn test_unselected_component_is_skipped_without_commands() {
        let temp = TempDir::new().unwrap();
        let mut config = config(&temp);
        config.selection = Some(Selection::parse("other", MatchMode::Exact));
        let ctx = JobContext {
            config: Arc::new(config.clone()),
            runner: Arc::new(RefusingRunner),
            notifier: None,
        };

        let report = run_job(component(&config), ctx).await;

        assert_eq!(report.identity, "nav");
        assert_eq!(report.outcome, JobOutcome::Skipped);
        assert!(!config.workspace.scan_root().join("nav/debian").exists());
    }

    #[test]
    fn test_outcome_predicates() {
        assert!(JobOutcome::Succeeded.is_success());
        assert!(JobOutcome::Failed {
            reason: String::new()
        }
        .is_failure());
        assert!(!JobOutcome::Skipped.is_failure());
    }
}
