//! Remote role command
//!
//! Standard output carries exactly one meaningful line for a start request:
//! the readiness line, or `Error: <message>` on failure.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use nxs_coordinator::{
    failure_line, RemoteCoordinator, RemoteOutcome, RemoteRequest, SessionContext,
};
use nxs_core::config::NxConfig;
use nxs_core::NxError;

use crate::output::{print_info, print_success};

/// Execute the remote role and report the outcome
pub async fn remote_command(config_path: Option<&Path>, request: RemoteRequest) -> ExitCode {
    let mut stdout = std::io::stdout();

    match run(config_path, &request, &mut stdout).await {
        Ok(RemoteOutcome::Ready { created, .. }) => {
            tracing::debug!(
                "Display {} ready ({})",
                request.display,
                if created { "created" } else { "resumed" }
            );
            ExitCode::SUCCESS
        }
        Ok(RemoteOutcome::Suspended { pid }) => {
            print_success(&format!(
                "Suspended display {} (agent PID {})",
                request.display, pid
            ));
            ExitCode::SUCCESS
        }
        Ok(RemoteOutcome::AlreadySuspended) => {
            print_info(&format!("Display {} is already suspended", request.display));
            ExitCode::SUCCESS
        }
        Ok(RemoteOutcome::Terminated { pid }) => {
            print_success(&format!(
                "Terminated display {} (agent PID {})",
                request.display, pid
            ));
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!("Remote role failed: {:?}", e);
            let _ = writeln!(stdout, "{}", failure_line(&e));
            let _ = stdout.flush();
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(
    config_path: Option<&Path>,
    request: &RemoteRequest,
    out: &mut (dyn Write + Send),
) -> Result<RemoteOutcome, NxError> {
    let config = NxConfig::load(config_path)?;
    let coordinator = RemoteCoordinator::new(SessionContext::from_config(config)?);
    coordinator.run(request, out).await
}
