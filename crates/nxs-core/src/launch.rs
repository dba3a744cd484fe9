//! Detached launches of the external collaborators
//!
//! Children get their own process group, a null stdin and their combined
//! output redirected to a log in the session directory. They must never
//! inherit our stdout: in the remote role that is the handoff pipe, and a
//! child holding it open would keep the transport alive forever.

use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::{BinaryConfig, NxConfig};
use crate::error::NxError;
use crate::traits::{AgentLaunch, Launcher, ProxyLaunch, StartupLaunch};

/// Shell used to run the startup action
const STARTUP_SHELL: &str = "sh";

/// Launcher backed by `std::process::Command`
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    binaries: BinaryConfig,
    agent_args: Vec<String>,
}

impl CommandLauncher {
    pub fn new(binaries: BinaryConfig, agent_args: Vec<String>) -> Self {
        Self {
            binaries,
            agent_args,
        }
    }

    pub fn from_config(config: &NxConfig) -> Self {
        Self::new(config.binaries.clone(), config.agent_args.clone())
    }

    /// Arguments for the display agent
    pub fn agent_args(&self, launch: &AgentLaunch) -> Vec<String> {
        let mut args = self.agent_args.clone();
        args.push("-display".to_string());
        args.push(format!(
            "nx/nx,options={}:{}",
            launch.options_path.display(),
            launch.display
        ));
        args.push(format!(":{}", launch.display));
        args
    }

    /// Arguments for the local proxy
    pub fn proxy_args(&self, launch: &ProxyLaunch) -> Vec<String> {
        vec![
            format!("options={}", launch.options_path.display()),
            "-S".to_string(),
            format!("localhost:{}", launch.display),
        ]
    }

    fn spawn(mut command: Command, program: &str, log_path: &Path) -> Result<u32, NxError> {
        let log = File::create(log_path)?;
        let log_err = log.try_clone()?;

        command
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command.spawn().map_err(|source| NxError::Launch {
            program: program.to_string(),
            source,
        })?;

        tracing::info!("Started {} (PID: {}), output in {:?}", program, child.id(), log_path);
        Ok(child.id())
    }
}

impl Launcher for CommandLauncher {
    fn spawn_agent(&self, launch: &AgentLaunch) -> Result<u32, NxError> {
        let mut command = Command::new(&self.binaries.agent);
        command.args(self.agent_args(launch));
        Self::spawn(command, &self.binaries.agent, &launch.log_path)
    }

    fn spawn_proxy(&self, launch: &ProxyLaunch) -> Result<u32, NxError> {
        let mut command = Command::new(&self.binaries.proxy);
        command.args(self.proxy_args(launch));
        Self::spawn(command, &self.binaries.proxy, &launch.log_path)
    }

    fn spawn_startup(&self, launch: &StartupLaunch) -> Result<u32, NxError> {
        let mut command = Command::new(STARTUP_SHELL);
        command
            .arg("-c")
            .arg(&launch.command)
            .env("DISPLAY", format!(":{}", launch.display));
        Self::spawn(command, STARTUP_SHELL, &launch.log_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DisplayId;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn launcher() -> CommandLauncher {
        CommandLauncher::from_config(&NxConfig::default())
    }

    #[test]
    fn test_agent_args() {
        let launch = AgentLaunch {
            display: DisplayId::new(5).unwrap(),
            options_path: PathBuf::from("/home/u/.nx/C-5/options"),
            log_path: PathBuf::from("/home/u/.nx/C-5/session"),
        };
        assert_eq!(
            launcher().agent_args(&launch),
            vec![
                "-R",
                "-display",
                "nx/nx,options=/home/u/.nx/C-5/options:5",
                ":5"
            ]
        );
    }

    #[test]
    fn test_proxy_args() {
        let launch = ProxyLaunch {
            display: DisplayId::new(5).unwrap(),
            options_path: PathBuf::from("/home/u/.nx/S-5/options"),
            log_path: PathBuf::from("/home/u/.nx/S-5/session"),
        };
        assert_eq!(
            launcher().proxy_args(&launch),
            vec!["options=/home/u/.nx/S-5/options", "-S", "localhost:5"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_startup_action_sees_display_and_logs() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("x_session");
        let launch = StartupLaunch {
            display: DisplayId::new(7).unwrap(),
            command: "echo display=$DISPLAY".to_string(),
            log_path: log_path.clone(),
        };

        let pid = launcher().spawn_startup(&launch).unwrap();
        assert!(pid > 0);

        let mut contents = String::new();
        for _ in 0..50 {
            contents = std::fs::read_to_string(&log_path).unwrap();
            if !contents.is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
        assert_eq!(contents.trim(), "display=:7");
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let dir = TempDir::new().unwrap();
        let mut binaries = BinaryConfig::default();
        binaries.proxy = "/nonexistent/nxproxy-for-tests".to_string();
        let launcher = CommandLauncher::new(binaries, vec![]);

        let result = launcher.spawn_proxy(&ProxyLaunch {
            display: DisplayId::new(1).unwrap(),
            options_path: dir.path().join("options"),
            log_path: dir.path().join("session"),
        });
        assert!(matches!(result, Err(NxError::Launch { .. })));
    }
}
