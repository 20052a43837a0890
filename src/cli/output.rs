//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress bars,
//! formatted messages, and errors to the user.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

pub use crate::config::defaults::status;
use crate::core::progress::{ProgressEvent, ProgressHandler};
use crate::error::{
    BuildError, ConfigError, DebsmithError, WorkspaceError, EXIT_BUILD, EXIT_CONFIG,
    EXIT_ENVIRONMENT, EXIT_UNEXPECTED,
};

/// Global output settings from the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Suppress everything but errors
    pub quiet: bool,
    /// Machine-readable output
    pub json: bool,
    /// Verbosity level (0 = default, 1 = info, 2+ = debug)
    pub verbose: u8,
}

impl OutputConfig {
    /// Create output settings
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Log filter directives for these settings
    pub fn filter_directives(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn,debsmith=info",
            1 => "info",
            _ => "debug",
        }
    }

    /// Check if spinners and progress bars should be drawn
    pub fn shows_progress(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Install the global tracing subscriber
    ///
    /// `RUST_LOG` takes precedence over the command-line verbosity.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.filter_directives()));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}

/// Create a spinner for operations with unknown duration
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.blue} {msg}")
            .expect("Invalid spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Create a progress bar over component jobs
pub fn create_build_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} components ({msg})")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░"),
    );
    pb
}

/// Progress handler drawing a spinner and a job progress bar
#[derive(Debug, Default)]
pub struct TerminalProgress {
    spinner: Mutex<Option<ProgressBar>>,
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalProgress {
    /// Create a handler with nothing drawn yet
    pub fn new() -> Self {
        Self::default()
    }

    fn with_bar(slot: &Mutex<Option<ProgressBar>>, f: impl FnOnce(&mut Option<ProgressBar>)) {
        if let Ok(mut guard) = slot.lock() {
            f(&mut guard);
        }
    }
}

impl ProgressHandler for TerminalProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::ResolvingDependencies => {
                Self::with_bar(&self.spinner, |slot| {
                    *slot = Some(create_spinner("Resolving system dependencies"));
                });
            }
            ProgressEvent::WorkspaceBuildStarted => {
                Self::with_bar(&self.spinner, |slot| {
                    if let Some(old) = slot.take() {
                        old.finish_and_clear();
                    }
                    *slot = Some(create_spinner("Building workspace"));
                });
            }
            ProgressEvent::WorkspaceBuildComplete { elapsed } => {
                Self::with_bar(&self.spinner, |slot| {
                    if let Some(pb) = slot.take() {
                        pb.finish_with_message(format!(
                            "{} Workspace built in {:.1}s",
                            status::SUCCESS,
                            elapsed.as_secs_f64()
                        ));
                    }
                });
            }
            ProgressEvent::JobsPlanned { count } => {
                Self::with_bar(&self.bar, |slot| {
                    *slot = Some(create_build_bar(*count as u64));
                });
            }
            ProgressEvent::JobFinished { report } => {
                Self::with_bar(&self.bar, |slot| {
                    if let Some(pb) = slot.as_ref() {
                        if report.outcome.is_failure() {
                            pb.println(format!("{} {}", status::ERROR, report.identity));
                        }
                        pb.set_message(report.identity.clone());
                        pb.inc(1);
                    }
                });
            }
            ProgressEvent::Collected { .. } => {
                Self::with_bar(&self.bar, |slot| {
                    if let Some(pb) = slot.take() {
                        pb.finish_and_clear();
                    }
                });
            }
            ProgressEvent::Scanned { .. } | ProgressEvent::Publishing { .. } => {}
        }
    }
}

/// Print an error and its causes to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} Error: {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  Caused by: {cause}");
    }
}

/// Process exit code for an error returned by a command
pub fn exit_code(error: &anyhow::Error) -> i32 {
    if let Some(e) = error.downcast_ref::<DebsmithError>() {
        return e.exit_code();
    }
    if error.downcast_ref::<ConfigError>().is_some() {
        return EXIT_CONFIG;
    }
    if error.downcast_ref::<WorkspaceError>().is_some() {
        return EXIT_ENVIRONMENT;
    }
    if error.downcast_ref::<BuildError>().is_some() {
        return EXIT_BUILD;
    }
    EXIT_UNEXPECTED
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_filter_directives() {
        assert_eq!(OutputConfig::new(true, false, 2).filter_directives(), "error");
        assert_eq!(OutputConfig::new(false, false, 0).filter_directives(), "warn,debsmith=info");
        assert_eq!(OutputConfig::new(false, false, 1).filter_directives(), "info");
        assert_eq!(OutputConfig::new(false, false, 3).filter_directives(), "debug");
    }

    #[test]
    fn test_progress_hidden_for_json_and_quiet() {
        assert!(OutputConfig::default().shows_progress());
        assert!(!OutputConfig::new(false, true, 0).shows_progress());
        assert!(!OutputConfig::new(true, false, 0).shows_progress());
    }

    #[test]
    fn test_exit_code_sees_through_context() {
        let err: anyhow::Error = Err::<(), _>(WorkspaceError::ToolNotFound {
            tool: "bloom-generate".to_string(),
        })
        .context("preflight failed")
        .unwrap_err();
        assert_eq!(exit_code(&err), EXIT_ENVIRONMENT);

        let err = anyhow::Error::new(DebsmithError::JobsFailed { failed: 1, total: 2 });
        assert_eq!(exit_code(&err), crate::error::EXIT_JOBS_FAILED);

        assert_eq!(exit_code(&anyhow::anyhow!("boom")), EXIT_UNEXPECTED);
    }
}
