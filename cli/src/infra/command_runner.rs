//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation that uses tokio
//! for async process execution with guaranteed timeout and kill on all platforms.

use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use crate::application::ports::CommandRunner;

/// Default timeout for provider CLI calls (create, get, list, delete).
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(120);

/// Default timeout for remote commands; the setup script upgrades packages.
pub const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Production `CommandRunner`; uses tokio for async process execution
/// with guaranteed timeout and kill on all platforms.
///
/// `tokio::time::timeout` around `.output().await` only drops the future;
/// this implementation uses `tokio::select!` with an explicit `child.kill()`
/// so the process is terminated.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        tracing::debug!(program, ?args, "running");
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        tokio::select! {
            result = async {
                let (status, stdout, stderr) = tokio::join!(
                    child.wait(),
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stdout_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stderr_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                );
                let status = status.with_context(|| format!("waiting for {program}"))?;
                tracing::debug!(program, code = ?status.code(), "finished");
                Ok::<_, anyhow::Error>(Output { status, stdout, stderr })
            } => result,
            () = tokio::time::sleep(timeout) => {
                let _ = child.kill().await;
                anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
            }
        }
    }

    async fn run_until_interrupted(
        &self,
        program: &str,
        args: &[&str],
    ) -> Result<Option<ExitStatus>> {
        tracing::debug!(program, ?args, "running in foreground");
        let mut command = tokio::process::Command::new(program);
        command.args(args).stdin(Stdio::null()).kill_on_drop(true);
        // Own process group: the terminal's SIGINT reaches only us, and the
        // child is killed below instead of racing us to exit.
        #[cfg(unix)]
        command.process_group(0);
        let mut child = command
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        tokio::select! {
            status = child.wait() => {
                Ok(Some(status.with_context(|| format!("waiting for {program}"))?))
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for Ctrl-C")?;
                let _ = child.kill().await;
                Ok(None)
            }
        }
    }
}
