// subprocess.rs — The Subprocess capability.
//
// The runner never spawns processes directly; it goes through this trait
// so tests can script exit codes, output, and hangs. The tokio-backed
// implementation clears the inherited environment and enforces the
// wall-clock timeout by killing the child.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::SandboxError;

/// Captured output of a completed subprocess.
#[derive(Debug, Clone)]
pub struct SubprocessOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Executes an argv with a working directory, an explicit environment,
/// and a hard timeout.
#[async_trait]
pub trait Subprocess: Send + Sync {
    async fn run(
        &self,
        argv: &[String],
        cwd: &Path,
        env: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<SubprocessOutput, SandboxError>;
}

/// Real subprocess execution on the tokio runtime.
pub struct TokioSubprocess;

#[async_trait]
impl Subprocess for TokioSubprocess {
    async fn run(
        &self,
        argv: &[String],
        cwd: &Path,
        env: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<SubprocessOutput, SandboxError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| SandboxError::CommandNotAllowed("(empty argv)".to_string()))?;

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(cwd)
            .env_clear()
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn()?;

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| SandboxError::Timeout {
                seconds: timeout.as_secs(),
            })??;

        Ok(SubprocessOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
