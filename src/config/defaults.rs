//! Default configuration values

/// Marker file identifying a workspace root
pub const WORKSPACE_MARKER: &str = ".catkin_workspace";

/// Source subdirectory scanned for components
pub const SOURCE_SUBDIR: &str = "src";

/// Install tree produced by the workspace build
pub const INSTALL_SUBDIR: &str = "install";

/// Component manifest file
pub const MANIFEST_FILE: &str = "package.xml";

/// Component build descriptor file
pub const BUILD_DESCRIPTOR_FILE: &str = "CMakeLists.txt";

/// Directory the packaging generator creates inside a component
pub const PACKAGING_DIR: &str = "debian";

/// Build-rules descriptor inside the packaging directory
pub const RULES_FILE: &str = "rules";

/// Control metadata inside the packaging directory
pub const CONTROL_FILE: &str = "control";

/// Directory inside a component holding lifecycle hook scripts
pub const HOOKS_DIR: &str = "debian_hooks";

/// Artifact file extensions collected after packaging
pub const ARTIFACT_EXTENSIONS: &[&str] = &["deb", "ddeb"];

/// Length of the build identifier appended to descriptions
pub const BUILD_ID_LEN: usize = 7;

/// Build identifier used when no revision can be resolved
pub const UNKNOWN_BUILD_ID: &str = "0000000";

/// Default target operating system
pub const OS_NAME: &str = "ubuntu";

/// Default target operating system codename
pub const OS_CODENAME: &str = "focal";

/// Default distribution channel
pub const DISTRO: &str = "noetic";

/// Name of the per-workspace configuration file
pub const WORKSPACE_CONFIG_FILE: &str = "debsmith.toml";

/// Webhook request timeout in seconds
pub const WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Number of log lines quoted in tool failure messages
pub const LOG_TAIL_LINES: usize = 20;

/// Default workspace build command
pub fn workspace_build_command() -> Vec<String> {
    to_argv(&["catkin_make", "install"])
}

/// Default packaging generator command (target arguments are appended)
pub fn generator_command() -> Vec<String> {
    to_argv(&["bloom-generate", "rosdebian"])
}

/// Default packaging build command (build arguments are appended)
pub fn packaging_command() -> Vec<String> {
    to_argv(&["fakeroot", "dh", "binary"])
}

/// Default dependency resolver command (resolver arguments are appended)
pub fn resolver_command() -> Vec<String> {
    to_argv(&["rosdep", "install"])
}

/// Default archive tool used by the aggregate repackager
pub fn archive_tool() -> String {
    "dpkg-deb".to_string()
}

/// Status message prefixes shared by terminal output and notifications
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

fn to_argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_string()).collect()
}
