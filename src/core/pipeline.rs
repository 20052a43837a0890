//! Build pipeline
//!
//! Scan → resolve dependencies (optional) → workspace build → component
//! jobs (each skips itself when outside the selection) → collect →
//! aggregate repackage (optional) → publish (optional).
//!
//! The workspace build is a barrier: it completes exactly once before any
//! job starts, and its failure aborts the run. The collector is the barrier
//! after the job phase.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use super::collector;
use super::component::Component;
use super::job::{JobContext, JobOutcome, JobReport};
use super::notify::Notifier;
use super::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use super::publish::{self, PublishReport};
use super::repackage;
use super::scanner;
use super::scheduler;
use super::settings::RunConfig;
use crate::error::{BuildError, DebsmithError, ProcessError};
use crate::infra::process::{CommandRunner, ToolCommand, ToolOutput};

/// A failed component job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedJob {
    /// Component identity
    pub identity: String,
    /// Failure reason
    pub reason: String,
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Number of discovered components
    pub discovered: usize,
    /// Components packaged successfully
    pub built: Vec<String>,
    /// Components whose job failed
    pub failed: Vec<FailedJob>,
    /// Components outside the selection
    pub skipped: Vec<String>,
    /// Artifacts in the output directory
    pub artifacts: Vec<PathBuf>,
    /// Artifact produced by the aggregate repackager
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repackaged: Option<PathBuf>,
    /// Publish result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishReport>,
}

impl RunSummary {
    fn record(&mut self, report: JobReport) {
        match report.outcome {
            JobOutcome::Succeeded => self.built.push(report.identity),
            JobOutcome::Failed { reason } => self.failed.push(FailedJob {
                identity: report.identity,
                reason,
            }),
            JobOutcome::Skipped => self.skipped.push(report.identity),
        }
    }

    /// Number of jobs that ran
    pub fn attempted(&self) -> usize {
        self.built.len() + self.failed.len()
    }

    /// Check if any job failed
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Final status of the run
    ///
    /// Failed jobs are only an error in strict mode.
    pub fn status(&self, strict: bool) -> Result<(), DebsmithError> {
        if strict && self.has_failures() {
            return Err(DebsmithError::JobsFailed {
                failed: self.failed.len(),
                total: self.attempted(),
            });
        }
        Ok(())
    }
}

/// Drives one complete run
pub struct Orchestrator {
    config: Arc<RunConfig>,
    runner: Arc<dyn CommandRunner>,
    notifier: Option<Arc<dyn Notifier>>,
    progress: Arc<dyn ProgressHandler>,
}

impl Orchestrator {
    /// Create an orchestrator without notifications or progress output
    pub fn new(config: RunConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config: Arc::new(config),
            runner,
            notifier: None,
            progress: Arc::new(NoOpHandler),
        }
    }

    /// Send notifications to `notifier`
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Report progress to `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    /// Run configuration
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run the pipeline
    ///
    /// Failed component jobs are recorded in the summary, not returned as
    /// errors; see [`RunSummary::status`].
    pub async fn run(&self) -> Result<RunSummary, DebsmithError> {
        let config = &self.config;
        let components = scanner::scan(config.workspace.scan_root(), &config.layout)?;
        self.progress.on_progress(&ProgressEvent::Scanned {
            components: components.len(),
        });

        if config.resolve_deps {
            self.resolve_dependencies().await?;
        }
        self.build_workspace().await?;

        let mut summary = RunSummary {
            discovered: components.len(),
            ..RunSummary::default()
        };

        let ctx = JobContext {
            config: Arc::clone(config),
            runner: Arc::clone(&self.runner),
            notifier: self.notifier.clone(),
        };
        let reports = scheduler::run_all(
            components.clone(),
            config.execution,
            &ctx,
            Arc::clone(&self.progress),
        )
        .await;
        for report in reports {
            summary.record(report);
        }

        summary.artifacts = collector::collect(&components, config)?;
        self.progress.on_progress(&ProgressEvent::Collected {
            artifacts: summary.artifacts.len(),
        });

        if let Some(repacked) = self.repackage_aggregate(&components, &summary)? {
            summary.artifacts.retain(|path| path.exists());
            if !summary.artifacts.contains(&repacked) {
                summary.artifacts.push(repacked.clone());
                summary.artifacts.sort();
            }
            summary.repackaged = Some(repacked);
        }

        if let Some(ref remote) = config.publish {
            self.progress.on_progress(&ProgressEvent::Publishing {
                artifacts: summary.artifacts.len(),
            });
            summary.publish = Some(
                publish::publish(
                    summary.artifacts.clone(),
                    remote.clone(),
                    config.tools.clone(),
                    Arc::clone(&self.runner),
                    self.notifier.as_deref(),
                )
                .await,
            );
        }

        tracing::info!(
            "Run complete: {} built, {} failed, {} skipped, {} artifacts",
            summary.built.len(),
            summary.failed.len(),
            summary.skipped.len(),
            summary.artifacts.len()
        );

        Ok(summary)
    }

    async fn resolve_dependencies(&self) -> Result<(), DebsmithError> {
        let config = &self.config;
        self.progress.on_progress(&ProgressEvent::ResolvingDependencies);
        let command = ToolCommand::from_argv(&config.tools.resolver)
            .args([
                "--from-paths".to_string(),
                config.workspace.scan_root().to_string_lossy().into_owned(),
                "--ignore-src".to_string(),
                "--rosdistro".to_string(),
                config.target.distro.clone(),
                format!("--os={}:{}", config.target.os_name, config.target.os_codename),
                "-y".to_string(),
            ])
            .current_dir(config.workspace.root())
            .log_to(config.scratch_root.join("logs").join("resolve-deps.log"));

        let output = self.run_tool(command).await.map_err(|e| {
            BuildError::DependencyResolutionFailed {
                error: e.to_string(),
            }
        })?;
        if !output.success() {
            return Err(BuildError::DependencyResolutionFailed {
                error: output.failure_reason(),
            }
            .into());
        }
        Ok(())
    }

    async fn build_workspace(&self) -> Result<(), DebsmithError> {
        let config = &self.config;
        self.progress.on_progress(&ProgressEvent::WorkspaceBuildStarted);
        let started = Instant::now();

        let command = ToolCommand::from_argv(&config.tools.workspace_build)
            .current_dir(config.workspace.root())
            .log_to(config.scratch_root.join("logs").join("workspace-build.log"));
        let output = self
            .run_tool(command)
            .await
            .map_err(|e| BuildError::WorkspaceBuildFailed {
                error: e.to_string(),
            })?;
        if !output.success() {
            return Err(BuildError::WorkspaceBuildFailed {
                error: output.failure_reason(),
            }
            .into());
        }

        self.progress.on_progress(&ProgressEvent::WorkspaceBuildComplete {
            elapsed: started.elapsed(),
        });
        Ok(())
    }

    fn repackage_aggregate(
        &self,
        components: &[Component],
        summary: &RunSummary,
    ) -> Result<Option<PathBuf>, DebsmithError> {
        let config = &self.config;
        let Some(ref aggregate) = config.aggregate else {
            return Ok(None);
        };
        if !repackage::is_triggered(config.selection.as_ref(), aggregate) {
            return Ok(None);
        }
        if !summary.built.contains(&aggregate.component) {
            tracing::warn!(
                "Aggregate component {} was not packaged; skipping repackaging",
                aggregate.component
            );
            return Ok(None);
        }
        let Some(component) = components.iter().find(|c| c.identity == aggregate.component) else {
            return Ok(None);
        };

        let repacked = repackage::repackage(component, aggregate, config, self.runner.as_ref())?;
        Ok(Some(repacked))
    }

    async fn run_tool(&self, command: ToolCommand) -> Result<ToolOutput, ProcessError> {
        let runner = Arc::clone(&self.runner);
        let program = command.program.clone();
        tokio::task::spawn_blocking(move || runner.run(&command))
            .await
            .map_err(|e| ProcessError::Spawn {
                program,
                error: e.to_string(),
            })?
    }
}
