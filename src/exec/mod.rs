use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

use crate::workflow::{ToolCommand, ToolRunner, WorkflowError};

/// Runs tool commands through `sh -c`, streaming their output into the log.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

#[async_trait]
impl ToolRunner for ShellRunner {
    async fn run(&self, command: &ToolCommand) -> Result<i32, WorkflowError> {
        run_command(&command.render()).await
    }
}

/// Run a shell command line to completion and return its exit code.
pub async fn run_command(cmd: &str) -> Result<i32, WorkflowError> {
    let spawn_error = |source| WorkflowError::Spawn {
        command: cmd.to_string(),
        source,
    };

    let mut child = TokioCommand::new("sh")
        .arg("-c")
        .arg(cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_handle = tokio::spawn(async move {
        if let Some(stdout) = stdout {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(target: "rnavar::tool", stream = "stdout", "{line}");
            }
        }
    });

    let stderr_handle = tokio::spawn(async move {
        if let Some(stderr) = stderr {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(target: "rnavar::tool", stream = "stderr", "{line}");
            }
        }
    });

    let status = child.wait().await.map_err(spawn_error)?;

    if let Err(error) = stdout_handle.await {
        warn!(%error, "failed to drain tool stdout");
    }
    if let Err(error) = stderr_handle.await {
        warn!(%error, "failed to drain tool stderr");
    }

    let code = exit_code(status);
    debug!(command = cmd, exit_code = code, "command finished");
    Ok(code)
}

/// Exit code, or `128 + signal` when the process was killed by a signal.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
