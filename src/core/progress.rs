//! Pipeline progress events

use std::time::Duration;

use super::job::JobReport;

/// Events emitted while the pipeline runs
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Scan finished
    Scanned { components: usize },

    /// Dependency resolution started
    ResolvingDependencies,

    /// Workspace-wide build started
    WorkspaceBuildStarted,

    /// Workspace-wide build finished
    WorkspaceBuildComplete { elapsed: Duration },

    /// Job phase is about to start
    JobsPlanned { count: usize },

    /// One job finished
    JobFinished { report: JobReport },

    /// Artifacts were moved into the output directory
    Collected { artifacts: usize },

    /// Publishing started
    Publishing { artifacts: usize },
}

/// Observer for pipeline progress
pub trait ProgressHandler: Send + Sync {
    /// Called for each event
    fn on_progress(&self, event: &ProgressEvent);
}

/// Handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::job::JobOutcome;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FinishedCounter(AtomicUsize);

    impl ProgressHandler for FinishedCounter {
        fn on_progress(&self, event: &ProgressEvent) {
            if matches!(event, ProgressEvent::JobFinished { .. }) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_handler_receives_events() {
        let counter = FinishedCounter::default();
        let report = JobReport {
            identity: "nav".to_string(),
            version: "1.0.0".to_string(),
            outcome: JobOutcome::Succeeded,
        };

        counter.on_progress(&ProgressEvent::JobsPlanned { count: 1 });
        counter.on_progress(&ProgressEvent::JobFinished { report });

        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_noop_handler() {
        NoOpHandler.on_progress(&ProgressEvent::Collected { artifacts: 3 });
    }
}
