//! Publisher
//!
//! Copies collected artifacts to the repository host and triggers the
//! remote install command. No retry; failures are reported in the run
//! summary.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use super::notify::{self, Notification, Notifier};
use super::settings::{PublishConfig, ToolsConfig};
use crate::error::TransportError;
use crate::infra::process::{CommandRunner, ToolCommand};

/// Result of a publish attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// Remote host
    pub host: String,
    /// Number of artifacts pushed
    pub artifacts: usize,
    /// Whether copy and remote command both succeeded
    pub success: bool,
    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Copy `artifacts` to the host, then run the remote command
pub fn push(
    artifacts: &[PathBuf],
    publish: &PublishConfig,
    tools: &ToolsConfig,
    runner: &dyn CommandRunner,
) -> Result<(), TransportError> {
    let destination = format!("{}:{}", publish.host, publish.remote_path);
    let copy = ToolCommand::new(&tools.copy)
        .args(artifacts.iter().map(|p| p.to_string_lossy().into_owned()))
        .arg(&destination);

    let output = runner.run(&copy).map_err(|e| TransportError::CopyFailed {
        destination: destination.clone(),
        error: e.to_string(),
    })?;
    if !output.success() {
        return Err(TransportError::CopyFailed {
            destination,
            error: output.failure_reason(),
        });
    }

    let remote = ToolCommand::new(&tools.remote_shell)
        .arg(&publish.host)
        .arg(&publish.remote_command);
    let output = runner
        .run(&remote)
        .map_err(|e| TransportError::RemoteCommandFailed {
            host: publish.host.clone(),
            error: e.to_string(),
        })?;
    if !output.success() {
        return Err(TransportError::RemoteCommandFailed {
            host: publish.host.clone(),
            error: output.failure_reason(),
        });
    }

    Ok(())
}

/// Publish artifacts and notify about the result
pub async fn publish(
    artifacts: Vec<PathBuf>,
    publish: PublishConfig,
    tools: ToolsConfig,
    runner: Arc<dyn CommandRunner>,
    notifier: Option<&dyn Notifier>,
) -> PublishReport {
    let count = artifacts.len();
    let host = publish.host.clone();

    if artifacts.is_empty() {
        tracing::warn!("Nothing to publish to {host}");
        return PublishReport {
            host,
            artifacts: 0,
            success: true,
            error: None,
        };
    }

    tracing::info!("Publishing {count} artifacts to {host}");
    let result = tokio::task::spawn_blocking(move || {
        push(&artifacts, &publish, &tools, runner.as_ref())
    })
    .await;

    let error = match result {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(e) => Some(format!("publish aborted: {e}")),
    };
    if let Some(ref e) = error {
        tracing::error!("{e}");
    }

    let report = PublishReport {
        host: host.clone(),
        artifacts: count,
        success: error.is_none(),
        error,
    };

    notify::dispatch(
        notifier,
        Notification::Published {
            artifacts: count,
            host,
            success: report.success,
        },
    )
    .await;

    report
}
