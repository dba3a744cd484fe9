//! nxsession CLI
//!
//! One binary for both sides of an NX session:
//! - `nxsession <display> -C ...` runs the remote role next to the agent
//! - `nxsession <display> [-h host] ...` runs the local role and the proxy
//! - `nxsession --list` shows every recorded session
//! - `nxsession --init-config` writes the default configuration

use std::process::ExitCode;

use clap::error::ErrorKind;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nxs_coordinator::{LocalRequest, RemoteRequest};
use nxsession::cli::Cli;
use nxsession::commands::{self, RemoteTarget};
use nxsession::output::print_error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    // stdout is reserved for the readiness line, so logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_level().into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config_path = cli.config.as_deref();

    if cli.list {
        return report(commands::list_command(config_path, cli.json));
    }
    if cli.init_config {
        return report(commands::config_init(config_path, cli.force));
    }

    let Some(display) = cli.display else {
        print_error("A display number is required");
        return ExitCode::from(1);
    };

    if cli.remote {
        let request = RemoteRequest {
            display,
            action: cli.remote_action(),
            force: cli.force,
            extra: cli.extra_options(),
        };
        return commands::remote_command(config_path, request).await;
    }

    let target = RemoteTarget {
        host: cli.host.clone(),
        ssh_options: cli.ssh_options(),
    };
    let request = LocalRequest {
        display,
        force: cli.force,
        suspend: cli.suspend,
        extra: cli.extra_options(),
    };
    report(commands::local_command(config_path, target, request).await)
}

fn report(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&format!("{:#}", e));
            ExitCode::from(1)
        }
    }
}
