//! OpenSSH implementation of the `RemoteExecutor` and `PortForwarder` ports.
//!
//! Host keys are not checked: instances are short-lived and their addresses
//! are recycled, so `StrictHostKeyChecking` is off and nothing is written to
//! `known_hosts`. `forget_host` still purges stale entries left by other tools.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, PortForwarder, RemoteExecutor};
use crate::infra::command_runner::{DEFAULT_EXEC_TIMEOUT, TokioCommandRunner};

/// Options shared by every `ssh`/`scp` invocation.
pub const SSH_OPTS: [&str; 6] = [
    "-o",
    "StrictHostKeyChecking=no",
    "-o",
    "UserKnownHostsFile=/dev/null",
    "-o",
    "ConnectTimeout=10",
];

/// Copies of a whole workspace can take a long time on slow links.
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(4 * 60 * 60);

/// SSH transport to the instance, generic over the process runner.
pub struct SshRemote<R: CommandRunner> {
    runner: R,
    user: String,
    known_hosts: PathBuf,
}

impl<R: CommandRunner> SshRemote<R> {
    pub fn new(runner: R, user: &str, known_hosts: PathBuf) -> Self {
        Self {
            runner,
            user: user.to_string(),
            known_hosts,
        }
    }

    fn target(&self, address: &str) -> String {
        format!("{}@{address}", self.user)
    }

    async fn scp(&self, source: &str, dest: &str, recursive: bool) -> Result<Output> {
        let mut args: Vec<&str> = SSH_OPTS.to_vec();
        if recursive {
            args.push("-r");
        }
        args.extend([source, dest]);
        self.runner
            .run_with_timeout("scp", &args, TRANSFER_TIMEOUT)
            .await
            .context("scp")
    }
}

impl SshRemote<TokioCommandRunner> {
    /// Production transport using `~/.ssh/known_hosts`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_runner(user: &str) -> Result<Self> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::new(
            TokioCommandRunner::new(DEFAULT_EXEC_TIMEOUT),
            user,
            home.join(".ssh").join("known_hosts"),
        ))
    }
}

impl<R: CommandRunner> RemoteExecutor for SshRemote<R> {
    async fn execute(&self, address: &str, command: &str) -> Result<Output> {
        let target = self.target(address);
        let mut args: Vec<&str> = SSH_OPTS.to_vec();
        args.extend([target.as_str(), command]);
        self.runner.run("ssh", &args).await.context("ssh")
    }

    async fn copy_to(
        &self,
        local: &Path,
        remote: &str,
        address: &str,
        recursive: bool,
    ) -> Result<Output> {
        let source = local.to_string_lossy();
        let dest = format!("{}:{remote}", self.target(address));
        self.scp(&source, &dest, recursive).await
    }

    async fn copy_from(
        &self,
        remote: &str,
        local: &Path,
        address: &str,
        recursive: bool,
    ) -> Result<Output> {
        let source = format!("{}:{remote}", self.target(address));
        let dest = local.to_string_lossy();
        self.scp(&source, &dest, recursive).await
    }

    async fn forget_host(&self, address: &str) -> Result<()> {
        if !self.known_hosts.exists() {
            return Ok(());
        }
        let known_hosts = self.known_hosts.to_string_lossy();
        let output = self
            .runner
            .run("ssh-keygen", &["-R", address, "-f", &known_hosts])
            .await
            .context("ssh-keygen -R")?;
        anyhow::ensure!(
            output.status.success(),
            "ssh-keygen -R {address} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        tracing::debug!(address, "removed from known_hosts");
        Ok(())
    }
}

impl<R: CommandRunner> PortForwarder for SshRemote<R> {
    async fn forward(&self, address: &str, local_port: u16, remote_port: u16) -> Result<()> {
        let spec = format!("{local_port}:localhost:{remote_port}");
        let target = self.target(address);
        let mut args = vec!["-N", "-L", spec.as_str()];
        args.extend(SSH_OPTS);
        args.push(&target);
        match self.runner.run_until_interrupted("ssh", &args).await? {
            None => Ok(()),
            Some(status) if status.success() => Ok(()),
            Some(status) => anyhow::bail!("ssh tunnel exited with {status}"),
        }
    }
}
