//! Fire-and-forget notifications
//!
//! Notifications are modeled as an injectable [`Notifier`] capability so the
//! pipeline never depends on a concrete transport. Delivery failures are
//! logged and dropped; there is no retry.

use async_trait::async_trait;
use serde::Serialize;

use super::job::JobOutcome;
use crate::config::defaults::status;
use crate::error::TransportError;

/// Outcome report for one component job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobEvent {
    /// Component identity
    pub component: String,
    /// Component version from its manifest
    pub version: String,
    /// Target OS description, e.g. "ubuntu focal (noetic)"
    pub target: String,
    /// Job outcome
    pub outcome: JobOutcome,
}

/// Something worth telling the outside world about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A component job finished
    Job(JobEvent),
    /// Artifacts were pushed to the remote repository host
    Published {
        /// Number of artifacts pushed
        artifacts: usize,
        /// Remote host
        host: String,
        /// Whether copy and remote install both succeeded
        success: bool,
    },
}

impl Notification {
    /// Render the single-line text sent to the sink
    pub fn text(&self) -> String {
        match self {
            Self::Job(event) => match &event.outcome {
                JobOutcome::Succeeded => format!(
                    "{} {} {} packaged for {}",
                    status::SUCCESS,
                    event.component,
                    event.version,
                    event.target
                ),
                JobOutcome::Failed { reason } => format!(
                    "{} {} {} failed to package for {}: {}",
                    status::ERROR,
                    event.component,
                    event.version,
                    event.target,
                    reason.lines().next().unwrap_or_default()
                ),
                JobOutcome::Skipped => format!(
                    "{} {} {} skipped",
                    status::INFO,
                    event.component,
                    event.version
                ),
            },
            Self::Published {
                artifacts,
                host,
                success: true,
            } => format!("{} Published {artifacts} artifacts to {host}", status::SUCCESS),
            Self::Published {
                artifacts,
                host,
                success: false,
            } => format!(
                "{} Publishing {artifacts} artifacts to {host} failed",
                status::ERROR
            ),
        }
    }
}

/// Delivers notifications to an external sink
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification
    async fn notify(&self, notification: &Notification) -> Result<(), TransportError>;
}

/// Deliver a notification if a sink is configured, logging failures
pub async fn dispatch(notifier: Option<&dyn Notifier>, notification: Notification) {
    let Some(notifier) = notifier else {
        return;
    };
    if let Err(e) = notifier.notify(&notification).await {
        tracing::warn!("Notification not delivered: {e}");
    }
}
