//! Links from the local role to a remote coordinator
//!
//! A link starts the remote role (on this machine, or at the far end of a
//! secure-shell tunnel) and blocks until its first output line is available.
//! That line is the whole synchronization contract between the two machines.

mod loopback;
mod ssh;

pub use loopback::LoopbackLink;
pub use ssh::SshLink;

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::BufReader;
use tokio::process::Command;

use nxs_core::options::{OptionEntry, LINK_LAN, LINK_WAN};
use nxs_core::{DisplayId, NxError, SessionError};
use nxs_protocol::{read_handshake, Handshake};

/// Connection policy the remote agent is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPolicy {
    /// Same machine or local network
    Lan,
    /// Tunnelled over a wide-area link
    Wan,
}

impl LinkPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkPolicy::Lan => LINK_LAN,
            LinkPolicy::Wan => LINK_WAN,
        }
    }
}

/// Arguments for one remote coordinator invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteInvocation {
    pub display: DisplayId,
    pub force: bool,
    pub extra: Vec<OptionEntry>,
}

impl RemoteInvocation {
    /// Command-line arguments selecting the remote role
    pub fn remote_args(&self) -> Vec<String> {
        let mut args = vec![self.display.to_string(), "-C".to_string()];
        if self.force {
            args.push("-f".to_string());
        }
        if !self.extra.is_empty() {
            let joined: Vec<String> = self.extra.iter().map(ToString::to_string).collect();
            args.push("-o".to_string());
            args.push(joined.join(","));
        }
        args
    }
}

/// Starts the remote role and returns its first output line
#[async_trait]
pub trait RemoteLink: Send + Sync {
    fn policy(&self) -> LinkPolicy;

    /// Block until the remote role reports readiness or an error
    async fn connect_remote(&self, invocation: &RemoteInvocation) -> Result<Handshake, NxError>;
}

/// Spawn `command` and read only its first stdout line
///
/// On readiness the child is left running: for a tunnel it carries the
/// forwarded port. On failure or timeout it is killed.
pub(crate) async fn first_line(
    mut command: Command,
    program: &str,
    timeout: Duration,
) -> Result<Handshake, NxError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());

    let mut child = command.spawn().map_err(|source| NxError::Launch {
        program: program.to_string(),
        source,
    })?;
    let stdout = child.stdout.take().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::BrokenPipe, "remote coordinator has no stdout")
    })?;
    let mut reader = BufReader::new(stdout);

    match read_handshake(&mut reader, timeout).await? {
        Some(Handshake::Ready(cookie)) => {
            tracing::info!("Remote coordinator ready via {} (PID: {:?})", program, child.id());
            Ok(Handshake::Ready(cookie))
        }
        Some(Handshake::Failed(message)) => {
            let _ = child.start_kill();
            Ok(Handshake::Failed(message))
        }
        None => {
            let _ = child.start_kill();
            Err(SessionError::HandshakeTimeout(timeout).into())
        }
    }
}
