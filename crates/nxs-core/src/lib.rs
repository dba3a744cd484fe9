//! nxs-core: Session state, supervision and probing for nxsession
//!
//! This crate provides the pieces both coordinator roles are built from:
//! the per-display `SessionStore`, the options blob handed to the agent and
//! proxy, secret generation, the port probe, the process supervisor and the
//! authentication-database adapter.

pub mod config;
pub mod error;
pub mod launch;
pub mod options;
pub mod probe;
pub mod process;
pub mod secret;
pub mod store;
pub mod time;
pub mod traits;
pub mod types;
pub mod xauth;

pub use error::{AuthError, ConfigError, NxError, SessionError};
pub use nxs_protocol::Cookie;
pub use store::SessionStore;
pub use types::{DisplayId, Ports, Role, SessionState};
