//! Error types for debsmith
//!
//! Domain-specific error types using thiserror. Each fatal class maps to a
//! distinct process exit code through [`DebsmithError::exit_code`].

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for a run that completed normally
pub const EXIT_OK: i32 = 0;
/// Exit code for unexpected failures
pub const EXIT_UNEXPECTED: i32 = 1;
/// Exit code for missing or contradictory configuration
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for an invalid workspace or missing external tools
pub const EXIT_ENVIRONMENT: i32 = 3;
/// Exit code for a failed workspace-wide build
pub const EXIT_BUILD: i32 = 4;
/// Exit code for a completed run with failed jobs (`--strict` only)
pub const EXIT_JOBS_FAILED: i32 = 5;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting was not supplied
    #[error("Missing required setting '{name}'")]
    Missing { name: String },

    /// Two settings contradict each other
    #[error("Contradictory configuration: {message}")]
    Contradictory { message: String },

    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: PathBuf, error: String },
}

/// Workspace (environment) errors
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// Workspace root does not exist
    #[error("Workspace root not found: {path}")]
    NotFound { path: PathBuf },

    /// Workspace marker file is missing
    #[error("'{path}' is not a workspace: marker file '{marker}' not found")]
    MissingMarker { path: PathBuf, marker: String },

    /// A subtree could not be read while scanning
    #[error("Failed to scan '{path}': {error}")]
    ScanFailed { path: PathBuf, error: String },

    /// A component has neither a project identifier nor a manifest name
    #[error("Component at '{path}' declares no project identifier")]
    MissingIdentity { path: PathBuf },

    /// Two components declare the same project identifier
    #[error("Project identifier '{identity}' declared by both '{first}' and '{second}'")]
    DuplicateIdentity {
        identity: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Component manifest could not be parsed
    #[error("Failed to parse manifest '{path}': {error}")]
    InvalidManifest { path: PathBuf, error: String },

    /// External tool not found on PATH
    #[error("Required tool '{tool}' not found in PATH")]
    ToolNotFound { tool: String },
}

/// Workspace-wide build errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// The workspace build command failed
    #[error("Workspace build failed: {error}")]
    WorkspaceBuildFailed { error: String },

    /// The dependency resolver failed
    #[error("Dependency resolution failed: {error}")]
    DependencyResolutionFailed { error: String },
}

/// Per-component packaging errors
#[derive(Error, Debug)]
pub enum PackagingError {
    /// The packaging generator failed
    #[error("Packaging generator failed for '{component}': {error}")]
    GeneratorFailed { component: String, error: String },

    /// The generator ran but produced no packaging directory
    #[error("Packaging generator produced no '{path}' for '{component}'")]
    NoPackagingDir { component: String, path: PathBuf },

    /// The packaging build failed
    #[error("Packaging build failed for '{component}': {error}")]
    PackagingFailed { component: String, error: String },

    /// Scratch directory setup failed
    #[error("Scratch setup failed for '{component}': {error}")]
    Scratch { component: String, error: String },

    /// Metadata patching failed
    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// Packaging metadata patch errors
#[derive(Error, Debug)]
pub enum PatchError {
    /// Failed to read a packaging file
    #[error("Failed to read '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to write a packaging file
    #[error("Failed to write '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// The build-rules descriptor has no prefix path assignment
    #[error("No CMAKE_PREFIX_PATH assignment found in '{path}'")]
    PrefixPathNotFound { path: PathBuf },

    /// Installing a lifecycle hook failed
    #[error("Failed to install {kind} hook into '{path}': {error}")]
    Hook {
        kind: String,
        path: PathBuf,
        error: String,
    },
}

/// Aggregate repackaging errors
#[derive(Error, Debug)]
pub enum RepackError {
    /// No artifact matched the aggregate component
    #[error("No artifact found for aggregate component '{component}' in '{dir}'")]
    ArtifactNotFound { component: String, dir: PathBuf },

    /// Control metadata lacks a field
    #[error("Control file '{path}' has no '{field}' field")]
    MissingField { path: PathBuf, field: String },

    /// dpkg-deb invocation failed
    #[error("'{command}' failed: {error}")]
    ToolFailed { command: String, error: String },

    /// Filesystem error while repacking
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Publish and notification transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Copying artifacts to the remote host failed
    #[error("Copy to '{destination}' failed: {error}")]
    CopyFailed { destination: String, error: String },

    /// The remote install command failed
    #[error("Remote command on '{host}' failed: {error}")]
    RemoteCommandFailed { host: String, error: String },

    /// Webhook delivery failed
    #[error("Webhook delivery to '{url}' failed: {error}")]
    Webhook { url: String, error: String },
}

/// External process errors
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The program could not be started
    #[error("Failed to start '{program}': {error}")]
    Spawn { program: String, error: String },

    /// The log file could not be opened
    #[error("Failed to open log file '{path}': {error}")]
    LogFile { path: PathBuf, error: String },
}

/// Git errors
#[derive(Error, Debug)]
pub enum GitError {
    /// No repository contains the path
    #[error("No git repository found for '{path}': {error}")]
    NotARepository { path: PathBuf, error: String },

    /// HEAD could not be resolved
    #[error("Failed to resolve HEAD in '{path}': {error}")]
    HeadUnresolved { path: PathBuf, error: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to remove file
    #[error("Failed to remove file '{path}': {error}")]
    RemoveFile { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to move a file
    #[error("Failed to move '{from}' to '{to}': {error}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// Failed to list a directory
    #[error("Failed to list directory '{path}': {error}")]
    ReadDir { path: PathBuf, error: String },
}

/// Top-level debsmith error type
#[derive(Error, Debug)]
pub enum DebsmithError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Workspace error
    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// Build error
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// Repack error
    #[error("Repack error: {0}")]
    Repack(#[from] RepackError),

    /// Some component jobs failed and strict mode was requested
    #[error("{failed} of {total} component jobs failed")]
    JobsFailed { failed: usize, total: usize },
}

impl DebsmithError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => EXIT_CONFIG,
            Self::Workspace(_) => EXIT_ENVIRONMENT,
            Self::Build(_) => EXIT_BUILD,
            Self::JobsFailed { .. } => EXIT_JOBS_FAILED,
            Self::Transport(_) | Self::Filesystem(_) | Self::Repack(_) => EXIT_UNEXPECTED,
        }
    }
}
