//! Local role command

use std::path::Path;

use anyhow::Result;

use nxs_coordinator::{
    LocalCoordinator, LocalOutcome, LocalRequest, LoopbackLink, RemoteLink, SessionContext,
    SshLink,
};
use nxs_core::config::NxConfig;

use crate::output::{print_info, print_success};

/// Where the remote role runs
#[derive(Debug, Clone, Default)]
pub struct RemoteTarget {
    pub host: Option<String>,
    pub ssh_options: Vec<String>,
}

/// Execute the local role
pub async fn local_command(
    config_path: Option<&Path>,
    target: RemoteTarget,
    request: LocalRequest,
) -> Result<()> {
    let config = NxConfig::load(config_path)?;
    let timeout = config.timing.handshake_timeout;

    let link: Box<dyn RemoteLink> = match target.host {
        Some(host) => Box::new(SshLink::new(
            config.binaries.ssh.clone(),
            host,
            target.ssh_options,
            config.binaries.remote_command.clone(),
            config.ports,
            timeout,
        )),
        None => Box::new(LoopbackLink::current_exe(
            config_path.map(Path::to_path_buf),
            timeout,
        )?),
    };

    let coordinator = LocalCoordinator::new(SessionContext::from_config(config)?, link);
    let display = request.display;

    match coordinator.run(&request).await? {
        LocalOutcome::Connected { proxy_pid, .. } => {
            print_success(&format!(
                "Connected to display {} (proxy PID {})",
                display, proxy_pid
            ));
        }
        LocalOutcome::Suspended { pid } => {
            print_success(&format!(
                "Suspended display {} (proxy PID {} stopped)",
                display, pid
            ));
        }
        LocalOutcome::AlreadySuspended => {
            print_info(&format!("Display {} is already suspended", display));
        }
    }

    Ok(())
}
