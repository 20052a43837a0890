//! Infrastructure layer
//!
//! Handles all I/O operations: filesystem, git, HTTP, and external processes.

pub mod dirs;
pub mod filesystem;
pub mod git;
pub mod process;
pub mod webhook;
