//! Common test utilities and helpers
//!
//! This module provides a throwaway workspace on disk and a fake command
//! runner that imitates the external packaging tools.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use debsmith::core::notify::{Notification, Notifier};
use debsmith::core::settings::{BuildRequest, FileConfig, RunConfig};
use debsmith::error::{ProcessError, TransportError};
use debsmith::infra::dirs::DebsmithDirs;
use debsmith::infra::process::{CommandRunner, ToolCommand, ToolOutput};
use tempfile::TempDir;

/// Build identifier used by every test run
pub const BUILD_ID: &str = "abc1234";

/// Prefix path the fake generator writes into `debian/rules`
pub const SYSTEM_PREFIX: &str = "/opt/ros/noetic";

/// Test workspace context
///
/// Creates a temporary catkin workspace with a `src/` tree.
pub struct TestProject {
    /// Temporary directory holding the workspace, output and scratch dirs
    pub dir: TempDir,
}

impl TestProject {
    /// Create an empty workspace in a temporary directory
    pub fn new() -> Self {
        let project = Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        };
        project.create_file("ws/.catkin_workspace", "");
        project.create_dir("ws/src");
        project
    }

    /// Path of the temporary directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Workspace root
    pub fn workspace(&self) -> PathBuf {
        self.dir.path().join("ws")
    }

    /// Artifact output directory
    pub fn output(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    /// Scratch root
    pub fn scratch(&self) -> PathBuf {
        self.dir.path().join("scratch")
    }

    /// Create a file relative to the temporary directory
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory relative to the temporary directory
    pub fn create_dir(&self, name: &str) {
        std::fs::create_dir_all(self.dir.path().join(name)).expect("Failed to create directory");
    }

    /// Add a component under `ws/src/<rel>` declaring `identity` and `version`
    pub fn add_component(&self, rel: &str, identity: &str, version: &str) -> PathBuf {
        let base = format!("ws/src/{rel}");
        self.create_file(
            &format!("{base}/package.xml"),
            &format!(
                "<?xml version=\"1.0\"?>\n<package format=\"2\">\n  <name>{identity}</name>\n  \
                 <version>{version}</version>\n  <description>{identity}</description>\n</package>\n"
            ),
        );
        self.create_file(
            &format!("{base}/CMakeLists.txt"),
            &format!("cmake_minimum_required(VERSION 3.0.2)\nproject({identity})\n"),
        );
        self.workspace().join("src").join(rel)
    }

    /// Add a lifecycle hook script to a component
    pub fn add_hook(&self, rel: &str, hook: &str, body: &str) {
        self.create_file(&format!("ws/src/{rel}/debian_hooks/{hook}"), body);
    }

    /// Write `ws/debsmith.toml`
    pub fn write_config(&self, content: &str) {
        self.create_file("ws/debsmith.toml", content);
    }

    /// Artifact file names in the output directory, sorted
    pub fn output_files(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.output()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Resolve a run configuration for this workspace
    ///
    /// `adjust` can change the request and file settings before resolution.
    pub fn run_config(&self, adjust: impl FnOnce(&mut BuildRequest, &mut FileConfig)) -> RunConfig {
        let mut request = BuildRequest {
            workspace: Some(self.workspace()),
            output: Some(self.output()),
            scratch_dir: Some(self.scratch()),
            build_id: Some(BUILD_ID.to_string()),
            ..BuildRequest::default()
        };
        let mut file = FileConfig::default();
        adjust(&mut request, &mut file);
        RunConfig::resolve(request, file, &DebsmithDirs::new()).expect("Failed to resolve config")
    }

    /// Command for the debsmith binary with isolated global directories
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_debsmith"));
        cmd.env("DEBSMITH_CONFIG_DIR", self.dir.path().join("global-config"))
            .env("DEBSMITH_CACHE_DIR", self.dir.path().join("global-cache"))
            .env_remove("DEBSMITH_WORKSPACE")
            .env_remove("DEBSMITH_OUTPUT")
            .env_remove("DEBSMITH_CONFIG")
            .env_remove("DEBSMITH_WEBHOOK_URL")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Packaging directory contents observed when the packaging build started
#[derive(Debug, Clone)]
pub struct PackagingSnapshot {
    /// Component directory name
    pub component: String,
    /// `debian/rules` after patching
    pub rules: String,
    /// `debian/control` after patching
    pub control: String,
    /// Hook scripts present in `debian/`
    pub hooks: Vec<String>,
}

/// Fake runner standing in for catkin, bloom, dh, dpkg-deb, scp and ssh
///
/// Tools behave just enough like the real ones for the pipeline to progress:
/// the generator writes a packaging directory, the packaging build drops a
/// `.deb` next to the component, and `dpkg-deb -b` copies the edited control
/// file into the rebuilt archive so tests can inspect it.
#[derive(Default)]
pub struct FakeRunner {
    invocations: Mutex<Vec<ToolCommand>>,
    snapshots: Mutex<Vec<PackagingSnapshot>>,
    fail_workspace_build: bool,
    fail_packaging: BTreeSet<String>,
    fail_copy: bool,
    packaging_delay: Option<Duration>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeRunner {
    /// Runner where every tool succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the workspace build fail
    #[must_use]
    pub fn failing_workspace_build(mut self) -> Self {
        self.fail_workspace_build = true;
        self
    }

    /// Make the packaging build fail for the component in directory `name`
    #[must_use]
    pub fn failing_packaging(mut self, name: &str) -> Self {
        self.fail_packaging.insert(name.to_string());
        self
    }

    /// Make the artifact copy to the remote host fail
    #[must_use]
    pub fn failing_copy(mut self) -> Self {
        self.fail_copy = true;
        self
    }

    /// Hold each packaging build open for `delay`
    #[must_use]
    pub fn with_packaging_delay(mut self, delay: Duration) -> Self {
        self.packaging_delay = Some(delay);
        self
    }

    /// Every command run so far
    pub fn invocations(&self) -> Vec<ToolCommand> {
        self.invocations.lock().unwrap().clone()
    }

    /// Commands run for `program`
    pub fn invocations_of(&self, program: &str) -> Vec<ToolCommand> {
        self.invocations()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }

    /// Packaging snapshots in the order the builds started
    pub fn snapshots(&self) -> Vec<PackagingSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    /// Highest number of packaging builds running at once
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn generate(command: &ToolCommand) -> ToolOutput {
        let Some(dir) = command.cwd.as_ref() else {
            return ToolOutput::failed(1, "no working directory");
        };
        let debian = dir.join("debian");
        std::fs::create_dir_all(&debian).unwrap();
        std::fs::write(
            debian.join("rules"),
            format!(
                "#!/usr/bin/make -f\noverride_dh_auto_configure:\n\
                 \tdh_auto_configure -- -DCMAKE_PREFIX_PATH=\"{SYSTEM_PREFIX}\" \\\n\
                 \t\t-DCATKIN_BUILD_BINARY_PACKAGE=\"1\"\n"
            ),
        )
        .unwrap();
        std::fs::write(
            debian.join("control"),
            "Source: fake\nPackage: fake\nDescription: Generated package\n",
        )
        .unwrap();
        ToolOutput::ok("")
    }

    fn package(&self, command: &ToolCommand) -> ToolOutput {
        let Some(dir) = command.cwd.as_ref() else {
            return ToolOutput::failed(1, "no working directory");
        };
        let name = dir_name(dir);

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.packaging_delay {
            std::thread::sleep(delay);
        }

        let debian = dir.join("debian");
        let mut hooks: Vec<String> = ["preinst", "postinst", "prerm", "postrm"]
            .iter()
            .filter(|h| debian.join(h).is_file())
            .map(|h| (*h).to_string())
            .collect();
        hooks.sort();
        self.snapshots.lock().unwrap().push(PackagingSnapshot {
            component: name.clone(),
            rules: std::fs::read_to_string(debian.join("rules")).unwrap_or_default(),
            control: std::fs::read_to_string(debian.join("control")).unwrap_or_default(),
            hooks,
        });

        let output = if self.fail_packaging.contains(&name) {
            ToolOutput::failed(2, "dh: error: cmake failed")
        } else {
            let manifest = std::fs::read_to_string(dir.join("package.xml")).unwrap_or_default();
            let version = debsmith::core::component::parse_manifest(&manifest)
                .ok()
                .and_then(|m| m.version)
                .unwrap_or_else(|| "0.0.0".to_string());
            let artifact = dir.parent().unwrap().join(format!(
                "ros-noetic-{}_{version}-0focal_amd64.deb",
                name.replace('_', "-")
            ));
            std::fs::write(artifact, format!("deb {name}")).unwrap();
            ToolOutput::ok("")
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        output
    }

    fn archive(command: &ToolCommand) -> ToolOutput {
        match command.args.first().map(String::as_str) {
            Some("-R") => {
                let artifact = PathBuf::from(&command.args[1]);
                let dest = PathBuf::from(&command.args[2]);
                let file_name = dir_name(&artifact);
                let mut parts = file_name.trim_end_matches(".deb").split('_');
                let package = parts.next().unwrap_or_default().to_string();
                let version = parts.next().unwrap_or_default().to_string();
                std::fs::create_dir_all(dest.join("DEBIAN")).unwrap();
                std::fs::write(
                    dest.join("DEBIAN/control"),
                    format!(
                        "Package: {package}\nVersion: 1:{version}\nArchitecture: amd64\n\
                         Depends: ros-noetic-nav-core (>= 1.0), ros-noetic-robot-sim,\n \
                         ros-noetic-rviz\nDescription: Bringup {BUILD_ID}\n"
                    ),
                )
                .unwrap();
                ToolOutput::ok("")
            }
            Some("-b") => {
                let dir = PathBuf::from(&command.args[1]);
                let out = PathBuf::from(&command.args[2]);
                std::fs::copy(dir.join("DEBIAN/control"), out).unwrap();
                ToolOutput::ok("")
            }
            _ => ToolOutput::failed(2, "dpkg-deb: unknown action"),
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ProcessError> {
        self.invocations.lock().unwrap().push(command.clone());
        let output = match command.program.as_str() {
            "catkin_make" if self.fail_workspace_build => {
                ToolOutput::failed(2, "CMake Error: could not find package")
            }
            "catkin_make" | "rosdep" | "ssh" => ToolOutput::ok(""),
            "bloom-generate" => Self::generate(command),
            "fakeroot" => self.package(command),
            "dpkg-deb" => Self::archive(command),
            "scp" if self.fail_copy => ToolOutput::failed(1, "scp: connection refused"),
            "scp" => ToolOutput::ok(""),
            other => {
                return Err(ProcessError::Spawn {
                    program: other.to_string(),
                    error: "not found".to_string(),
                })
            }
        };
        Ok(output)
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Notifier that keeps every notification in memory
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Notifications delivered so far
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
