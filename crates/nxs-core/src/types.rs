//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SessionError;

/// Identifier of one remote graphical session
///
/// Always positive. Accepts `5` or `:5` when parsed from a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DisplayId(u32);

impl DisplayId {
    /// Create a display ID, rejecting zero
    pub fn new(id: u32) -> Result<Self, SessionError> {
        if id == 0 {
            return Err(SessionError::InvalidDisplay {
                display: id,
                reason: "display must be a positive integer".to_string(),
            });
        }
        Ok(Self(id))
    }

    /// Get the raw display number
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DisplayId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().trim_start_matches(':');
        let id = raw
            .parse::<u32>()
            .map_err(|_| format!("'{}' is not a display number", s))?;
        Self::new(id).map_err(|e| e.to_string())
    }
}

/// Which side of the session a coordinator invocation is acting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Owns the display agent
    Remote,
    /// Owns the proxy the user views through
    Local,
}

impl Role {
    /// Directory prefix keeping the two roles in disjoint namespaces
    pub fn prefix(&self) -> &'static str {
        match self {
            Role::Remote => "C",
            Role::Local => "S",
        }
    }

    /// Parse a directory prefix back into a role
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "C" => Some(Role::Remote),
            "S" => Some(Role::Local),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Remote => write!(f, "remote"),
            Role::Local => write!(f, "local"),
        }
    }
}

/// Ports derived from a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ports {
    /// Bound by the agent while actively serving
    pub control: u16,
    /// X display port
    pub display: u16,
}

/// Observed state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No session directory or no recorded process
    Absent,
    /// Process alive and its control port is bound
    Active,
    /// Process alive but the control port is released
    Suspended,
    /// A process was recorded but is no longer alive
    Terminated,
}

impl SessionState {
    /// Whether a new session may be created from this state
    pub fn is_vacant(&self) -> bool {
        matches!(self, SessionState::Absent | SessionState::Terminated)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Absent => write!(f, "absent"),
            SessionState::Active => write!(f, "active"),
            SessionState::Suspended => write!(f, "suspended"),
            SessionState::Terminated => write!(f, "terminated"),
        }
    }
}
