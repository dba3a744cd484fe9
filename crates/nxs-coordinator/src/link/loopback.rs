//! Same-machine link: re-run this binary in the remote role

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use nxs_core::NxError;
use nxs_protocol::Handshake;

use super::{first_line, LinkPolicy, RemoteInvocation, RemoteLink};

/// Runs the remote role as a child process of the local role
#[derive(Debug, Clone)]
pub struct LoopbackLink {
    exe: PathBuf,
    config_path: Option<PathBuf>,
    timeout: Duration,
}

impl LoopbackLink {
    pub fn new(exe: PathBuf, config_path: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            exe,
            config_path,
            timeout,
        }
    }

    /// Link re-executing the running binary
    pub fn current_exe(config_path: Option<PathBuf>, timeout: Duration) -> Result<Self, NxError> {
        Ok(Self::new(std::env::current_exe()?, config_path, timeout))
    }

    pub fn command(&self, invocation: &RemoteInvocation) -> Command {
        let mut command = Command::new(&self.exe);
        command.args(invocation.remote_args());
        if let Some(path) = &self.config_path {
            command.arg("--config").arg(path);
        }
        command
    }
}

#[async_trait]
impl RemoteLink for LoopbackLink {
    fn policy(&self) -> LinkPolicy {
        LinkPolicy::Lan
    }

    async fn connect_remote(&self, invocation: &RemoteInvocation) -> Result<Handshake, NxError> {
        tracing::debug!("Starting remote role locally for display {}", invocation.display);
        let program = self.exe.display().to_string();
        first_line(self.command(invocation), &program, self.timeout).await
    }
}
