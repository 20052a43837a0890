//! Core orchestration logic
//!
//! External processes are reached only through
//! [`crate::infra::process::CommandRunner`] and notifications only through
//! [`notify::Notifier`], so everything here can run against fakes.
//!
//! # Submodules
//!
//! - [`settings`] - Run configuration (CLI + file + defaults)
//! - [`workspace`] - Workspace root validation
//! - [`component`] - Component metadata
//! - [`scanner`] - Component discovery
//! - [`filter`] - Component selection
//! - [`patcher`] - Packaging metadata patches and lifecycle hooks
//! - [`job`] - Per-component build job
//! - [`scheduler`] - Sequential and bounded-parallel job execution
//! - [`collector`] - Artifact collection and cleanup
//! - [`repackage`] - Aggregate component repackaging
//! - [`publish`] - Remote repository publishing
//! - [`notify`] - Notification events and sinks
//! - [`progress`] - Progress events
//! - [`pipeline`] - The complete build run
//! - [`preflight`] - External tool checks
//! - [`rosdep`] - rosdep key generation

pub mod collector;
pub mod component;
pub mod filter;
pub mod job;
pub mod notify;
pub mod patcher;
pub mod pipeline;
pub mod preflight;
pub mod progress;
pub mod publish;
pub mod repackage;
pub mod rosdep;
pub mod scanner;
pub mod scheduler;
pub mod settings;
pub mod workspace;
