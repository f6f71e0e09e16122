//! External tool execution
//!
//! Both renderers go through `run_tool`: spawn, suspend the caller until the
//! process exits, hand back its status and stderr. The child is killed when
//! the awaiting future is dropped or the timeout fires.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::debug;

use super::RenderError;

/// A fully described tool invocation
#[derive(Debug, Clone)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>, working_dir: &Path, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.to_path_buf(),
            timeout,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Name used in logs and errors
    pub fn display_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// Outcome of a tool that exited successfully
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Run a tool to completion
///
/// Returns `Launch` when the process cannot be started, `ToolFailed` for a
/// non-zero exit (or death by signal) and `Timeout` when it outlives
/// `command.timeout`.
pub async fn run_tool(command: &ToolCommand) -> Result<ToolOutput, RenderError> {
    let tool = command.display_name();
    debug!(
        "Running {} {:?} in {}",
        tool,
        command.args,
        command.working_dir.display()
    );

    let child = Command::new(&command.program)
        .args(&command.args)
        .current_dir(&command.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| RenderError::Launch {
            tool: tool.clone(),
            source,
        })?;

    let started = Instant::now();
    // Dropping the wait future on timeout drops the child, which kills it
    let output = match tokio::time::timeout(command.timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| RenderError::Launch {
            tool: tool.clone(),
            source,
        })?,
        Err(_) => {
            return Err(RenderError::Timeout {
                tool,
                timeout: command.timeout,
            })
        }
    };
    let elapsed = started.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        return Err(RenderError::ToolFailed {
            tool,
            exit_code: output.status.code(),
            stderr,
        });
    }

    debug!("{} finished in {:?}", tool, elapsed);
    Ok(ToolOutput {
        stdout,
        stderr,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_utils::fake_tool;

    fn command(program: &Path, dir: &Path) -> ToolCommand {
        ToolCommand::new(program, dir, Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_successful_run_captures_output() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), "ok", "echo hello; echo warn >&2; exit 0");

        let output = run_tool(&command(&tool, dir.path())).await.unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr, "warn");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), "fail", "echo 'bad input' >&2; exit 3");

        let err = run_tool(&command(&tool, dir.path())).await.unwrap_err();
        match err {
            RenderError::ToolFailed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr, "bad input");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_launch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-tool");

        let err = run_tool(&command(&missing, dir.path())).await.unwrap_err();
        assert!(matches!(err, RenderError::Launch { .. }));
    }

    #[tokio::test]
    async fn test_timeout_kills_tool() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), "slow", "sleep 5");
        let cmd = ToolCommand::new(&tool, dir.path(), Duration::from_millis(200));

        let started = Instant::now();
        let err = run_tool(&cmd).await.unwrap_err();
        assert!(matches!(err, RenderError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), "touch", "touch marker");

        run_tool(&command(&tool, work.path())).await.unwrap();
        assert!(work.path().join("marker").exists());
    }

    #[test]
    fn test_display_name() {
        let cmd = ToolCommand::new("/usr/local/bin/mmdc", Path::new("/tmp"), Duration::ZERO);
        assert_eq!(cmd.display_name(), "mmdc");
    }
}
