//! Execution scheduler
//!
//! Runs component jobs sequentially or with bounded concurrency. Jobs are
//! isolated by their identity-keyed scratch directories, so the only shared
//! state is the read-only [`JobContext`]. Reports come back in the order the
//! components were given, whatever order the jobs finish in.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use super::component::Component;
use super::job::{run_job, JobContext, JobOutcome, JobReport};
use super::progress::{ProgressEvent, ProgressHandler};
use super::settings::ExecutionMode;

/// Run a job for every component according to `mode`
pub async fn run_all(
    components: Vec<Component>,
    mode: ExecutionMode,
    ctx: &JobContext,
    progress: Arc<dyn ProgressHandler>,
) -> Vec<JobReport> {
    progress.on_progress(&ProgressEvent::JobsPlanned {
        count: components.len(),
    });

    match mode {
        ExecutionMode::Sequential => run_sequential(components, ctx, progress.as_ref()).await,
        ExecutionMode::Parallel { jobs } => run_parallel(components, jobs, ctx, progress).await,
    }
}

async fn run_sequential(
    components: Vec<Component>,
    ctx: &JobContext,
    progress: &dyn ProgressHandler,
) -> Vec<JobReport> {
    let mut reports = Vec::with_capacity(components.len());
    for component in components {
        let report = run_job(component, ctx.clone()).await;
        progress.on_progress(&ProgressEvent::JobFinished {
            report: report.clone(),
        });
        reports.push(report);
    }
    reports
}

async fn run_parallel(
    components: Vec<Component>,
    max_parallel: usize,
    ctx: &JobContext,
    progress: Arc<dyn ProgressHandler>,
) -> Vec<JobReport> {
    tracing::info!(
        "Running {} jobs with up to {} in parallel",
        components.len(),
        max_parallel.max(1)
    );
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));

    let handles: Vec<_> = components
        .into_iter()
        .map(|component| {
            let sem = Arc::clone(&semaphore);
            let ctx = ctx.clone();
            let progress = Arc::clone(&progress);
            let identity = component.identity.clone();
            let version = component.version.clone();

            let handle = tokio::spawn(async move {
                let _permit = sem.acquire().await.ok();
                let report = run_job(component, ctx).await;
                progress.on_progress(&ProgressEvent::JobFinished {
                    report: report.clone(),
                });
                report
            });
            (identity, version, handle)
        })
        .collect();

    join_all(handles.into_iter().map(|(identity, version, handle)| async move {
        handle.await.unwrap_or_else(|e| JobReport {
            identity,
            version,
            outcome: JobOutcome::Failed {
                reason: format!("job aborted: {e}"),
            },
        })
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::progress::NoOpHandler;
    use crate::core::settings::{BuildRequest, FileConfig, RunConfig};
    use crate::error::ProcessError;
    use crate::infra::dirs::DebsmithDirs;
    use crate::infra::process::{CommandRunner, ToolCommand, ToolOutput};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Generator that always fails, tracking peak concurrency
    #[derive(Default)]
    struct SlowFailingRunner {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl CommandRunner for SlowFailingRunner {
        fn run(&self, _command: &ToolCommand) -> Result<ToolOutput, ProcessError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(ToolOutput::failed(1, "generator unavailable"))
        }
    }

    fn context(temp: &TempDir, runner: Arc<SlowFailingRunner>) -> JobContext {
        std::fs::write(temp.path().join(".catkin_workspace"), "").unwrap();
        let config = RunConfig::resolve(
            BuildRequest {
                workspace: Some(temp.path().to_path_buf()),
                output: Some(temp.path().join("out")),
                scratch_dir: Some(temp.path().join("scratch")),
                build_id: Some("0000000".to_string()),
                ..BuildRequest::default()
            },
            FileConfig::default(),
            &DebsmithDirs::new(),
        )
        .unwrap();
        JobContext {
            config: Arc::new(config),
            runner,
            notifier: None,
        }
    }

    fn components(temp: &TempDir, ids: &[&str]) -> Vec<Component> {
        ids.iter()
            .map(|id| Component {
                path: temp.path().join(id),
                identity: (*id).to_string(),
                name: (*id).to_string(),
                version: "0.1.0".to_string(),
            })
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_respects_bound_and_order() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(SlowFailingRunner::default());
        let ctx = context(&temp, Arc::clone(&runner));

        let reports = run_all(
            components(&temp, &["a", "b", "c", "d"]),
            ExecutionMode::Parallel { jobs: 2 },
            &ctx,
            Arc::new(NoOpHandler),
        )
        .await;

        let ids: Vec<_> = reports.iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert!(reports.iter().all(|r| r.outcome.is_failure()));
        assert!(runner.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_sequential_runs_one_at_a_time() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(SlowFailingRunner::default());
        let ctx = context(&temp, Arc::clone(&runner));

        let reports = run_all(
            components(&temp, &["x", "y"]),
            ExecutionMode::Sequential,
            &ctx,
            Arc::new(NoOpHandler),
        )
        .await;

        assert_eq!(reports.len(), 2);
        assert_eq!(runner.peak.load(Ordering::SeqCst), 1);
    }
}
