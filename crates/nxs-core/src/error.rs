//! Core error types for nxsession

use std::path::PathBuf;
use std::time::Duration;

use nxs_protocol::ProtocolError;
use thiserror::Error;

use crate::types::DisplayId;

/// Top-level error type for nxsession
#[derive(Error, Debug)]
pub enum NxError {
    /// Session lifecycle error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Authentication database error
    #[error("Authentication database error: {0}")]
    Auth(#[from] AuthError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Handoff protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// External program could not be started
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NxError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// Session lifecycle errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// Display number does not map to valid ports
    #[error("Invalid display {display}: {reason}")]
    InvalidDisplay { display: u32, reason: String },

    /// Control port bound by someone else
    #[error("Control port {port} for display {display} is already in use")]
    ControlPortInUse { display: DisplayId, port: u16 },

    /// Display port bound by someone else
    #[error("Display port {port} for display {display} is already in use")]
    DisplayPortInUse { display: DisplayId, port: u16 },

    /// Session is active and no force flag was given
    #[error("Session on display {0} is active; run again with -f to take it over")]
    Refused(DisplayId),

    /// Terminate requested but nothing is running
    #[error("No session to terminate on display {0}")]
    NothingToTerminate(DisplayId),

    /// Agent never bound its control port
    #[error("Agent for display {display} did not bind port {port} within {timeout:?}")]
    AgentStartTimeout {
        display: DisplayId,
        port: u16,
        timeout: Duration,
    },

    /// Agent died while we were waiting for it
    #[error("Agent for display {display} exited; see {}", log.display())]
    AgentExited { display: DisplayId, log: PathBuf },

    /// Forced suspend did not release the control port
    #[error("Session on display {0} is still active after takeover")]
    TakeoverFailed(DisplayId),

    /// No cookie registered for a session that should have one
    #[error("No cookie registered for display {0}")]
    MissingCookie(DisplayId),

    /// First line from the remote coordinator was not the readiness marker
    #[error("{0}")]
    RemoteFailure(String),

    /// Remote coordinator said nothing in time
    #[error("Remote coordinator did not answer within {0:?}")]
    HandshakeTimeout(Duration),
}

/// Authentication database (xauth) errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Utility could not be run
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Utility ran but reported failure
    #[error("`{command}` failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// HOME could not be determined
    #[error("Could not determine home directory")]
    NoHomeDir,
}
