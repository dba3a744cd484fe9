//! Tunnelled link: run the remote role over a secure-shell client
//!
//! The client forwards the local control port to the same port on the
//! remote host and runs the remote coordinator as its one-shot command. The
//! remote role lingers after announcing, long enough for the proxy to
//! connect through the forward; the client then stays up as long as that
//! connection does.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use nxs_core::config::PortLayout;
use nxs_core::NxError;
use nxs_protocol::Handshake;

use super::{first_line, LinkPolicy, RemoteInvocation, RemoteLink};

/// Runs the remote role on `host` through the secure-shell client
#[derive(Debug, Clone)]
pub struct SshLink {
    ssh: String,
    host: String,
    ssh_options: Vec<String>,
    remote_command: String,
    ports: PortLayout,
    timeout: Duration,
}

impl SshLink {
    pub fn new(
        ssh: impl Into<String>,
        host: impl Into<String>,
        ssh_options: Vec<String>,
        remote_command: impl Into<String>,
        ports: PortLayout,
        timeout: Duration,
    ) -> Self {
        Self {
            ssh: ssh.into(),
            host: host.into(),
            ssh_options,
            remote_command: remote_command.into(),
            ports,
            timeout,
        }
    }

    /// Full client argument list for one invocation
    pub fn ssh_args(&self, invocation: &RemoteInvocation) -> Result<Vec<String>, NxError> {
        let control = self.ports.ports(invocation.display)?.control;

        let mut args = self.ssh_options.clone();
        args.extend([
            "-o".to_string(),
            "ExitOnForwardFailure=yes".to_string(),
            "-L".to_string(),
            format!("{}:localhost:{}", control, control),
            self.host.clone(),
            self.remote_command.clone(),
        ]);
        args.extend(invocation.remote_args());
        Ok(args)
    }
}

#[async_trait]
impl RemoteLink for SshLink {
    fn policy(&self) -> LinkPolicy {
        LinkPolicy::Wan
    }

    async fn connect_remote(&self, invocation: &RemoteInvocation) -> Result<Handshake, NxError> {
        tracing::info!(
            "Connecting to {} for display {}",
            self.host,
            invocation.display
        );

        let mut command = Command::new(&self.ssh);
        command.args(self.ssh_args(invocation)?);
        first_line(command, &self.ssh, self.timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxs_core::options::OptionEntry;
    use nxs_core::DisplayId;

    #[test]
    fn test_ssh_args() {
        let link = SshLink::new(
            "ssh",
            "user@example.org",
            vec!["-p".to_string(), "2222".to_string()],
            "nxsession",
            PortLayout::default(),
            Duration::from_secs(60),
        );
        let invocation = RemoteInvocation {
            display: DisplayId::new(5).unwrap(),
            force: false,
            extra: OptionEntry::parse_list("link=wan"),
        };

        assert_eq!(
            link.ssh_args(&invocation).unwrap(),
            vec![
                "-p",
                "2222",
                "-o",
                "ExitOnForwardFailure=yes",
                "-L",
                "4005:localhost:4005",
                "user@example.org",
                "nxsession",
                "5",
                "-C",
                "-o",
                "link=wan",
            ]
        );
    }
}
