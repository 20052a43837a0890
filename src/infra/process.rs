//! External process execution
//!
//! Every external collaborator (workspace build, packaging generator,
//! packaging build, dpkg-deb, scp, ssh) is invoked through the
//! [`CommandRunner`] trait so the orchestration can be exercised with a
//! fake runner in tests.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::defaults;
use crate::error::ProcessError;

/// A fully described external command invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCommand {
    /// Program name or path
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Working directory
    pub cwd: Option<PathBuf>,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
    /// File receiving combined stdout/stderr
    pub log_file: Option<PathBuf>,
}

impl ToolCommand {
    /// Create a command for a program
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Create a command from a configured argv (program followed by arguments)
    pub fn from_argv(argv: &[String]) -> Self {
        let mut command = Self::new(argv.first().cloned().unwrap_or_default());
        command.args.extend(argv.iter().skip(1).cloned());
        command
    }

    /// Append an argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Add an environment variable
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Redirect output into a log file
    #[must_use]
    pub fn log_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Human-readable command line
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a finished external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code (None when terminated by a signal)
    pub code: Option<i32>,
    /// Captured stdout (empty when logged to a file)
    pub stdout: String,
    /// Captured stderr, or the tail of the log file
    pub stderr: String,
}

impl ToolOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with status 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Short description of why the command failed
    pub fn failure_reason(&self) -> String {
        let status = match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            status
        } else {
            format!("{status}\n{stderr}")
        }
    }
}

/// Executes external commands
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ProcessError>;
}

/// Runs commands as real OS processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ProcessError> {
        tracing::debug!("Running: {}", command.command_line());

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args).stdin(Stdio::null());
        if let Some(ref cwd) = command.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &command.env {
            cmd.env(key, value);
        }

        let spawn_error = |e: std::io::Error| ProcessError::Spawn {
            program: command.program.clone(),
            error: e.to_string(),
        };

        let Some(ref log_path) = command.log_file else {
            let output = cmd.output().map_err(spawn_error)?;
            return Ok(ToolOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        };

        let (stdout, stderr) = open_log(log_path)?;
        let status = cmd
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .map_err(spawn_error)?;

        let stderr = if status.success() {
            String::new()
        } else {
            std::fs::read_to_string(log_path)
                .map(|log| tail_lines(&log, defaults::LOG_TAIL_LINES))
                .unwrap_or_default()
        };

        Ok(ToolOutput {
            code: status.code(),
            stdout: String::new(),
            stderr,
        })
    }
}

fn open_log(path: &Path) -> Result<(Stdio, Stdio), ProcessError> {
    let log_error = |e: std::io::Error| ProcessError::LogFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(log_error)?;
    }
    let file = File::create(path).map_err(log_error)?;
    let clone = file.try_clone().map_err(log_error)?;
    Ok((Stdio::from(file), Stdio::from(clone)))
}

/// Last `count` lines of `text`
pub fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_argv_splits_program_and_args() {
        let argv = vec!["fakeroot".to_string(), "dh".to_string(), "binary".to_string()];
        let cmd = ToolCommand::from_argv(&argv).arg("--parallel");
        assert_eq!(cmd.program, "fakeroot");
        assert_eq!(cmd.args, vec!["dh", "binary", "--parallel"]);
        assert_eq!(cmd.command_line(), "fakeroot dh binary --parallel");
    }

    #[test]
    fn test_failure_reason_includes_code_and_stderr() {
        let out = ToolOutput::failed(2, "boom\n");
        assert!(!out.success());
        assert_eq!(out.failure_reason(), "exit code 2\nboom");

        let signalled = ToolOutput {
            code: None,
            ..ToolOutput::default()
        };
        assert_eq!(signalled.failure_reason(), "terminated by signal");
    }

    #[test]
    fn test_tail_lines() {
        assert_eq!(tail_lines("a\nb\nc\nd", 2), "c\nd");
        assert_eq!(tail_lines("a", 5), "a");
        assert_eq!(tail_lines("", 5), "");
    }

    #[test]
    fn test_system_runner_captures_output() {
        let out = SystemRunner
            .run(&ToolCommand::new("sh").args(["-c", "echo hello; exit 3"]))
            .unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[test]
    fn test_system_runner_writes_log_file() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("logs/step.log");
        let out = SystemRunner
            .run(
                &ToolCommand::new("sh")
                    .args(["-c", "echo to-log; echo failing >&2; exit 1"])
                    .log_to(&log),
            )
            .unwrap();

        assert!(!out.success());
        let content = std::fs::read_to_string(&log).unwrap();
        assert!(content.contains("to-log"));
        assert!(out.stderr.contains("failing"));
    }

    #[test]
    fn test_system_runner_reports_missing_program() {
        let result = SystemRunner.run(&ToolCommand::new("definitely-not-a-real-tool-xyz"));
        assert!(matches!(result, Err(ProcessError::Spawn { .. })));
    }
}
