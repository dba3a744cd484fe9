//! External process launch trait

use std::path::PathBuf;

use crate::error::NxError;
use crate::types::DisplayId;

/// Display agent to start
#[derive(Debug, Clone)]
pub struct AgentLaunch {
    pub display: DisplayId,
    pub options_path: PathBuf,
    pub log_path: PathBuf,
}

/// Local proxy to start
#[derive(Debug, Clone)]
pub struct ProxyLaunch {
    pub display: DisplayId,
    pub options_path: PathBuf,
    pub log_path: PathBuf,
}

/// Startup action to run against a new display
#[derive(Debug, Clone)]
pub struct StartupLaunch {
    pub display: DisplayId,
    pub command: String,
    pub log_path: PathBuf,
}

/// Starts detached external processes and reports their pids
pub trait Launcher: Send + Sync {
    fn spawn_agent(&self, launch: &AgentLaunch) -> Result<u32, NxError>;

    fn spawn_proxy(&self, launch: &ProxyLaunch) -> Result<u32, NxError>;

    fn spawn_startup(&self, launch: &StartupLaunch) -> Result<u32, NxError>;
}
