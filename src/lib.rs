//! Debsmith - workspace package build orchestrator
//!
//! Discovers the components of a catkin workspace, builds the workspace once,
//! then generates, patches and builds a Debian package for every component,
//! collecting the artifacts into one output directory.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Orchestration logic
//! - [`infra`] - Infrastructure layer (filesystem, git, processes, webhooks)
//! - [`config`] - Built-in defaults
//! - [`error`] - Error types and exit codes

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
