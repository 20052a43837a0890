//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod clean;
pub mod publish;
pub mod rosdep;
pub mod scan;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::output::OutputConfig;
use crate::core::settings::{FileConfig, LayoutConfig};
use crate::core::workspace::Workspace;
use crate::error::{ConfigError, DebsmithError};
use crate::infra::dirs::DebsmithDirs;

/// Workspace and configuration file location, shared by all commands
#[derive(Args, Debug, Clone, Default)]
pub struct WorkspaceArgs {
    /// Workspace root (directory containing .catkin_workspace)
    #[arg(short, long, env = "DEBSMITH_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Configuration file (default: <workspace>/debsmith.toml, then the global config)
    #[arg(short, long, env = "DEBSMITH_CONFIG")]
    pub config: Option<PathBuf>,
}

impl WorkspaceArgs {
    /// Load the configuration file for these arguments
    pub fn file_config(&self, dirs: &DebsmithDirs) -> Result<FileConfig, DebsmithError> {
        Ok(FileConfig::locate(
            self.config.as_deref(),
            self.workspace.as_deref(),
            dirs,
        )?)
    }

    /// Open the workspace with the configured layout
    pub fn open(&self, layout: &LayoutConfig) -> Result<Workspace, DebsmithError> {
        let root = self.workspace.as_deref().ok_or_else(|| ConfigError::Missing {
            name: "workspace".to_string(),
        })?;
        Ok(Workspace::open(root, layout)?)
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and package every selected component
    Build(build::BuildArgs),

    /// List the components of a workspace
    Scan {
        #[command(flatten)]
        location: WorkspaceArgs,

        /// Only list these components (comma, semicolon or space separated)
        #[arg(short, long)]
        packages: Option<String>,
    },

    /// Remove generated packaging directories and scratch space
    Clean {
        #[command(flatten)]
        location: WorkspaceArgs,
    },

    /// Write rosdep keys for the workspace components
    Rosdep(rosdep::RosdepArgs),

    /// Push collected artifacts to the repository host
    Publish(publish::PublishArgs),
}

impl Commands {
    /// Execute the command
    pub async fn run(self, output: OutputConfig) -> Result<()> {
        match self {
            Self::Build(args) => build::execute(args, output).await,
            Self::Scan { location, packages } => scan::execute(&location, packages.as_deref(), output),
            Self::Clean { location } => clean::execute(&location, output),
            Self::Rosdep(args) => rosdep::execute(&args, output),
            Self::Publish(args) => publish::execute(args, output).await,
        }
    }
}
