//! Run configuration
//!
//! Settings come from three places: CLI flags (a [`BuildRequest`]), an
//! optional `debsmith.toml` ([`FileConfig`]) and built-in defaults. They are
//! merged once into an immutable [`RunConfig`] that every job receives
//! explicitly.
//!
//! Precedence: CLI flag > config file > default.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::filter::{MatchMode, Selection};
use super::workspace::Workspace;
use crate::config::defaults;
use crate::error::{ConfigError, DebsmithError};
use crate::infra::dirs::DebsmithDirs;
use crate::infra::filesystem;

/// Target platform for the generated packages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPlatform {
    /// Operating system name, e.g. "ubuntu"
    pub os_name: String,
    /// Operating system codename, e.g. "focal"
    pub os_codename: String,
    /// Distribution channel, e.g. "noetic"
    pub distro: String,
}

impl TargetPlatform {
    /// Human-readable target description
    pub fn describe(&self) -> String {
        format!("{} {} ({})", self.os_name, self.os_codename, self.distro)
    }
}

impl Default for TargetPlatform {
    fn default() -> Self {
        Self {
            os_name: defaults::OS_NAME.to_string(),
            os_codename: defaults::OS_CODENAME.to_string(),
            distro: defaults::DISTRO.to_string(),
        }
    }
}

/// How component jobs are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One job at a time, in discovery order
    Sequential,
    /// At most `jobs` concurrent jobs
    Parallel { jobs: usize },
}

impl ExecutionMode {
    /// Derive the mode from an optional parallelism request
    ///
    /// `None` is sequential; `Some(0)` means one job per processor.
    pub fn from_request(parallel: Option<usize>) -> Self {
        match parallel {
            None => Self::Sequential,
            Some(0) => Self::Parallel {
                jobs: num_cpus::get(),
            },
            Some(jobs) => Self::Parallel { jobs },
        }
    }
}

/// External tool invocations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Workspace-wide install build
    pub workspace_build: Vec<String>,
    /// Packaging generator (target arguments are appended)
    pub generator: Vec<String>,
    /// Packaging build (build arguments are appended)
    pub packaging: Vec<String>,
    /// Dependency resolver (resolver arguments are appended)
    pub resolver: Vec<String>,
    /// Package archive tool used by the aggregate repackager
    pub archive: String,
    /// Secure copy program
    pub copy: String,
    /// Remote shell program
    pub remote_shell: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            workspace_build: defaults::workspace_build_command(),
            generator: defaults::generator_command(),
            packaging: defaults::packaging_command(),
            resolver: defaults::resolver_command(),
            archive: defaults::archive_tool(),
            copy: "scp".to_string(),
            remote_shell: "ssh".to_string(),
        }
    }
}

/// Workspace and packaging file layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Marker file identifying the workspace root
    pub marker: String,
    /// Subdirectory scanned for components
    pub source_subdir: String,
    /// Install tree produced by the workspace build
    pub install_subdir: String,
    /// Component manifest file
    pub manifest_file: String,
    /// Component build descriptor file
    pub build_descriptor_file: String,
    /// Files that exclude a directory subtree from scanning
    pub ignore_markers: Vec<String>,
    /// Generated packaging directory inside a component
    pub packaging_dir: String,
    /// Lifecycle hook source directory inside a component
    pub hooks_dir: String,
    /// Collected artifact extensions
    pub artifact_extensions: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            marker: defaults::WORKSPACE_MARKER.to_string(),
            source_subdir: defaults::SOURCE_SUBDIR.to_string(),
            install_subdir: defaults::INSTALL_SUBDIR.to_string(),
            manifest_file: defaults::MANIFEST_FILE.to_string(),
            build_descriptor_file: defaults::BUILD_DESCRIPTOR_FILE.to_string(),
            ignore_markers: vec!["CATKIN_IGNORE".to_string(), "COLCON_IGNORE".to_string()],
            packaging_dir: defaults::PACKAGING_DIR.to_string(),
            hooks_dir: defaults::HOOKS_DIR.to_string(),
            artifact_extensions: defaults::ARTIFACT_EXTENSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

/// Remote repository host settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Remote host (`user@host` accepted)
    pub host: String,
    /// Remote directory receiving the artifacts
    pub remote_path: String,
    /// Command run on the host after the copy
    pub remote_command: String,
}

/// Aggregate repackaging hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// Component identity that triggers the hook
    pub component: String,
    /// Dependency removed from the artifact's control metadata
    pub drop_dependency: String,
}

/// Compiler override for a single component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerPin {
    /// C compiler
    pub cc: Option<String>,
    /// C++ compiler
    pub cxx: Option<String>,
}

impl CompilerPin {
    /// Environment variables exported for the packaging build
    pub fn env(&self) -> Vec<(String, String)> {
        let mut env = Vec::new();
        if let Some(ref cc) = self.cc {
            env.push(("CC".to_string(), cc.clone()));
        }
        if let Some(ref cxx) = self.cxx {
            env.push(("CXX".to_string(), cxx.clone()));
        }
        env
    }
}

/// Contents of `debsmith.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Output directory
    pub output: Option<PathBuf>,
    /// Scratch root
    pub scratch_dir: Option<PathBuf>,
    /// Target OS name
    pub os_name: Option<String>,
    /// Target OS codename
    pub os_codename: Option<String>,
    /// Distribution channel
    pub distro: Option<String>,
    /// Parallel jobs (0 = processor count)
    pub parallel: Option<usize>,
    /// Selection matching semantics
    pub selection_match: Option<MatchMode>,
    /// Webhook URL for notifications
    pub webhook_url: Option<String>,
    /// Tool invocations
    pub tools: ToolsConfig,
    /// File layout
    pub layout: LayoutConfig,
    /// Remote publishing
    pub publish: Option<PublishConfig>,
    /// Aggregate repackaging hook
    pub aggregate: Option<AggregateConfig>,
    /// Per-component compiler pins
    pub compiler_pins: BTreeMap<String, CompilerPin>,
}

impl FileConfig {
    /// Load from a path; a missing file yields defaults
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Find and load the configuration file
    ///
    /// Looks at `explicit`, then `<workspace>/debsmith.toml`, then the global
    /// config file. An explicit path that does not exist is an error.
    pub fn locate(
        explicit: Option<&Path>,
        workspace: Option<&Path>,
        dirs: &DebsmithDirs,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::ReadError {
                    path: path.to_path_buf(),
                    error: "file does not exist".to_string(),
                });
            }
            return Self::load_from_path(path);
        }

        if let Some(ws) = workspace {
            let local = ws.join(defaults::WORKSPACE_CONFIG_FILE);
            if local.exists() {
                return Self::load_from_path(&local);
            }
        }

        Self::load_from_path(&dirs.global_config_path())
    }
}

/// Settings supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// Workspace root
    pub workspace: Option<PathBuf>,
    /// Output directory
    pub output: Option<PathBuf>,
    /// Parallel jobs (`Some(0)` = processor count)
    pub parallel: Option<usize>,
    /// Inclusion specification
    pub packages: Option<String>,
    /// Resolve system dependencies before building
    pub resolve_deps: bool,
    /// Publish collected artifacts
    pub publish: bool,
    /// Webhook URL for notifications
    pub notify_url: Option<String>,
    /// Scratch root override
    pub scratch_dir: Option<PathBuf>,
    /// Target OS name override
    pub os_name: Option<String>,
    /// Target OS codename override
    pub os_codename: Option<String>,
    /// Distribution channel override
    pub distro: Option<String>,
    /// Fixed build identifier instead of the git revision
    pub build_id: Option<String>,
    /// Fail the run when any job fails
    pub strict: bool,
    /// Keep scratch directories after collection
    pub keep_scratch: bool,
}

/// Fully resolved configuration for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Validated workspace
    pub workspace: Workspace,
    /// Artifact output directory
    pub output_dir: PathBuf,
    /// Root of the per-component scratch directories
    pub scratch_root: PathBuf,
    /// Target platform
    pub target: TargetPlatform,
    /// Optional component selection
    pub selection: Option<Selection>,
    /// Scheduling mode
    pub execution: ExecutionMode,
    /// Resolve system dependencies before the workspace build
    pub resolve_deps: bool,
    /// Remote publishing (present only when requested)
    pub publish: Option<PublishConfig>,
    /// Notification webhook
    pub webhook_url: Option<String>,
    /// Tool invocations
    pub tools: ToolsConfig,
    /// File layout
    pub layout: LayoutConfig,
    /// Aggregate repackaging hook
    pub aggregate: Option<AggregateConfig>,
    /// Per-component compiler pins
    pub compiler_pins: BTreeMap<String, CompilerPin>,
    /// Fixed build identifier
    pub build_id: Option<String>,
    /// Fail the run when any job fails
    pub strict: bool,
    /// Keep scratch directories after collection
    pub keep_scratch: bool,
}

impl RunConfig {
    /// Merge CLI request, file config and defaults, validating the result
    pub fn resolve(
        request: BuildRequest,
        file: FileConfig,
        dirs: &DebsmithDirs,
    ) -> Result<Self, DebsmithError> {
        let workspace_root = request.workspace.ok_or_else(|| ConfigError::Missing {
            name: "workspace".to_string(),
        })?;
        let output_dir = request
            .output
            .or(file.output)
            .ok_or_else(|| ConfigError::Missing {
                name: "output".to_string(),
            })?;

        validate_tools(&file.tools)?;

        let publish = if request.publish {
            Some(file.publish.ok_or_else(|| ConfigError::Contradictory {
                message: "--publish requires a [publish] section with host, remote_path \
                          and remote_command"
                    .to_string(),
            })?)
        } else {
            None
        };

        if let Some(ref aggregate) = file.aggregate {
            if aggregate.component.trim().is_empty() {
                return Err(ConfigError::Contradictory {
                    message: "[aggregate] component must not be empty".to_string(),
                }
                .into());
            }
        }

        let workspace = Workspace::open(&workspace_root, &file.layout)?;

        let target = TargetPlatform {
            os_name: request
                .os_name
                .or(file.os_name)
                .unwrap_or_else(|| defaults::OS_NAME.to_string()),
            os_codename: request
                .os_codename
                .or(file.os_codename)
                .unwrap_or_else(|| defaults::OS_CODENAME.to_string()),
            distro: request
                .distro
                .or(file.distro)
                .unwrap_or_else(|| defaults::DISTRO.to_string()),
        };

        let match_mode = file.selection_match.unwrap_or_default();
        let selection = request
            .packages
            .as_deref()
            .map(|spec| Selection::parse(spec, match_mode))
            .filter(|selection| !selection.is_empty());

        let output_dir = filesystem::absolute(&output_dir)?;
        let scratch_root = filesystem::absolute(
            &request
                .scratch_dir
                .or(file.scratch_dir)
                .unwrap_or_else(|| dirs.scratch_root()),
        )?;

        Ok(Self {
            workspace,
            output_dir,
            scratch_root,
            target,
            selection,
            execution: ExecutionMode::from_request(request.parallel.or(file.parallel)),
            resolve_deps: request.resolve_deps,
            publish,
            webhook_url: request.notify_url.or(file.webhook_url),
            tools: file.tools,
            layout: file.layout,
            aggregate: file.aggregate,
            compiler_pins: file.compiler_pins,
            build_id: request.build_id,
            strict: request.strict,
            keep_scratch: request.keep_scratch,
        })
    }

    /// Isolated build directory for a component identity
    pub fn build_dir(&self, identity: &str) -> PathBuf {
        self.scratch_root.join("build").join(identity)
    }

    /// Isolated tmp directory for a component identity
    pub fn tmp_dir(&self, identity: &str) -> PathBuf {
        self.scratch_root.join("tmp").join(identity)
    }

    /// Tool log directory for a component identity
    pub fn log_dir(&self, identity: &str) -> PathBuf {
        self.scratch_root.join("logs").join(identity)
    }

    /// Scratch directory used by the aggregate repackager
    pub fn repack_dir(&self) -> PathBuf {
        self.scratch_root.join("repack")
    }
}

fn validate_tools(tools: &ToolsConfig) -> Result<(), ConfigError> {
    let commands = [
        ("tools.workspace_build", &tools.workspace_build),
        ("tools.generator", &tools.generator),
        ("tools.packaging", &tools.packaging),
        ("tools.resolver", &tools.resolver),
    ];
    for (name, argv) in commands {
        if argv.first().map_or(true, |program| program.trim().is_empty()) {
            return Err(ConfigError::Contradictory {
                message: format!("{name} must name a program"),
            });
        }
    }
    Ok(())
}
