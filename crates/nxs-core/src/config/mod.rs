//! Configuration management for nxsession

mod serde_utils;
mod timing;

pub use timing::TimingConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, SessionError};
use crate::types::{DisplayId, Ports};

/// Name of the per-user state directory under `$HOME`
const STATE_DIR_NAME: &str = ".nx";

/// Get the default session root (`$HOME/.nx`)
pub fn default_session_root() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(STATE_DIR_NAME))
        .ok_or(ConfigError::NoHomeDir)
}

/// Get the default configuration file path
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(default_session_root()?.join("config.toml"))
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to a file
pub fn save_config<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError::Invalid(format!("Failed to create config dir: {}", e)))?;
    }

    std::fs::write(path, content)
        .map_err(|e| ConfigError::Invalid(format!("Failed to write config: {}", e)))?;

    Ok(())
}

/// Top-level nxsession configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NxConfig {
    /// Root of the per-display session directories (defaults to `$HOME/.nx`)
    pub session_root: Option<PathBuf>,

    /// External programs
    pub binaries: BinaryConfig,

    /// Fixed flags passed to the display agent before `-display`
    pub agent_args: Vec<String>,

    /// Shell command run against a freshly started display (empty disables)
    pub startup_action: String,

    /// Port offsets
    pub ports: PortLayout,

    /// Grace intervals and timeouts
    pub timing: TimingConfig,
}

impl Default for NxConfig {
    fn default() -> Self {
        Self {
            session_root: None,
            binaries: BinaryConfig::default(),
            agent_args: vec!["-R".to_string()],
            startup_action: "xterm".to_string(),
            ports: PortLayout::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl NxConfig {
    /// Load from an explicit path, or from the default path if it exists
    ///
    /// A missing explicit file is an error; a missing default file yields
    /// the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return load_config(path);
        }

        let default_path = default_config_path()?;
        if default_path.exists() {
            load_config(&default_path)
        } else {
            tracing::debug!("No config at {:?}, using defaults", default_path);
            Ok(Self::default())
        }
    }

    /// Resolve the session root
    pub fn session_root(&self) -> Result<PathBuf, ConfigError> {
        match &self.session_root {
            Some(root) => Ok(root.clone()),
            None => default_session_root(),
        }
    }

    /// Startup action, if one is configured
    pub fn startup_action(&self) -> Option<&str> {
        let action = self.startup_action.trim();
        (!action.is_empty()).then_some(action)
    }
}

/// Paths (or `$PATH` names) of the external collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryConfig {
    /// Display agent
    pub agent: String,
    /// Local proxy
    pub proxy: String,
    /// Secure-shell client
    pub ssh: String,
    /// Authentication database utility
    pub xauth: String,
    /// Program invoked on the far end of the tunnel
    pub remote_command: String,
}

impl Default for BinaryConfig {
    fn default() -> Self {
        Self {
            agent: "nxagent".to_string(),
            proxy: "nxproxy".to_string(),
            ssh: "ssh".to_string(),
            xauth: "xauth".to_string(),
            remote_command: "nxsession".to_string(),
        }
    }
}

/// Process name expected for a configured program
///
/// The basename of the configured path, which is what the OS reports.
pub fn program_identity(program: &str) -> String {
    Path::new(program)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string())
}

/// Fixed offsets from which per-display ports are derived
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PortLayout {
    /// Control port = `control_base + display`
    pub control_base: u16,
    /// Display port = `display_base + display`
    pub display_base: u16,
}

impl Default for PortLayout {
    fn default() -> Self {
        Self {
            control_base: 4000,
            display_base: 6000,
        }
    }
}

impl PortLayout {
    /// Derive the ports for a display
    pub fn ports(&self, display: DisplayId) -> Result<Ports, SessionError> {
        let offset = |base: u16| {
            u16::try_from(display.as_u32())
                .ok()
                .and_then(|d| base.checked_add(d))
                .ok_or_else(|| SessionError::InvalidDisplay {
                    display: display.as_u32(),
                    reason: format!("port {} + {} is out of range", base, display),
                })
        };

        Ok(Ports {
            control: offset(self.control_base)?,
            display: offset(self.display_base)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_ports_for_display() {
        let layout = PortLayout::default();
        let ports = layout.ports(DisplayId::new(5).unwrap()).unwrap();
        assert_eq!(ports.control, 4005);
        assert_eq!(ports.display, 6005);
    }

    #[test]
    fn test_ports_out_of_range() {
        let layout = PortLayout::default();
        assert!(layout.ports(DisplayId::new(65000).unwrap()).is_err());
    }

    #[test]
    fn test_program_identity() {
        assert_eq!(program_identity("/usr/bin/nxagent"), "nxagent");
        assert_eq!(program_identity("nxproxy"), "nxproxy");
    }

    #[test]
    fn test_startup_action_empty_disables() {
        let mut config = NxConfig::default();
        assert_eq!(config.startup_action(), Some("xterm"));
        config.startup_action = "  ".to_string();
        assert_eq!(config.startup_action(), None);
    }

    #[test]
    fn test_partial_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
startup_action = "xfce4-session"

[binaries]
agent = "/opt/nx/bin/nxagent"

[timing]
agent_start_timeout = 5000
"#,
        )
        .unwrap();

        let config = NxConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.binaries.agent, "/opt/nx/bin/nxagent");
        assert_eq!(config.binaries.proxy, "nxproxy");
        assert_eq!(config.startup_action, "xfce4-session");
        assert_eq!(config.timing.agent_start_timeout, Duration::from_secs(5));
        assert_eq!(config.ports.control_base, 4000);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = TempDir::new().unwrap();
        let result = NxConfig::load(Some(dir.path().join("missing.toml").as_path()));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = NxConfig::default();
        config.session_root = Some(dir.path().join("sessions"));
        save_config(&path, &config).unwrap();

        let loaded = NxConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(loaded.session_root().unwrap(), dir.path().join("sessions"));
        assert_eq!(loaded.agent_args, vec!["-R".to_string()]);
    }
}
