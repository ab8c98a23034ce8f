use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

use crate::config::Config;
use crate::models::SshTarget;

/// Exit status ssh uses for its own failures (connect, auth, host key).
const SSH_TRANSPORT_EXIT: i32 = 255;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to spawn ssh: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("remote command timed out after {0:?}")]
    Timeout(Duration),

    #[error("ssh transport failed (exit {code:?}): {stderr}")]
    Transport { code: Option<i32>, stderr: String },
}

/// Result of a remote command that reached the remote shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RemoteOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

#[async_trait]
pub trait RemoteRunner: Send + Sync {
    /// Runs `command` on `target`, bounded by `timeout` overall.
    ///
    /// Transport problems are errors; a command that ran and exited non-zero
    /// is an `Ok` with its status.
    async fn run(
        &self,
        target: &SshTarget,
        command: &str,
        timeout: Duration,
    ) -> Result<RemoteOutput, RemoteError>;
}

#[derive(Debug, Clone)]
pub struct SshRunner {
    connect_timeout: Duration,
    program: String,
    /// Arguments placed before the generated ssh arguments.
    leading_args: Vec<String>,
}

impl SshRunner {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            program: "ssh".to_string(),
            leading_args: Vec::new(),
        }
    }

    /// Swaps the ssh binary for another program, e.g. a shell stand-in.
    #[cfg(test)]
    pub fn with_program(mut self, program: &str, leading_args: &[&str]) -> Self {
        self.program = program.to_string();
        self.leading_args = leading_args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.timeouts.connect())
    }

    pub fn ssh_args(&self, target: &SshTarget, command: &str) -> Vec<String> {
        vec![
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-p".to_string(),
            target.port.to_string(),
            "-i".to_string(),
            target.identity_file.display().to_string(),
            target.destination(),
            command.to_string(),
        ]
    }
}

impl Default for SshRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl RemoteRunner for SshRunner {
    async fn run(
        &self,
        target: &SshTarget,
        command: &str,
        timeout: Duration,
    ) -> Result<RemoteOutput, RemoteError> {
        let child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(self.ssh_args(target, command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| RemoteError::Timeout(timeout))??;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        match output.status.code() {
            Some(SSH_TRANSPORT_EXIT) | None => Err(RemoteError::Transport {
                code: output.status.code(),
                stderr,
            }),
            Some(status) => Ok(RemoteOutput {
                status,
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr,
            }),
        }
    }
}
