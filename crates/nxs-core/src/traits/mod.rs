//! Core trait definitions
//!
//! The coordinators only touch the OS through these seams, so the session
//! state machine can be driven against in-memory fakes.

mod auth;
mod launch;
mod process;

pub use auth::AuthDatabase;
pub use launch::{AgentLaunch, Launcher, ProxyLaunch, StartupLaunch};
pub use process::{PortProbe, ProcessTable, Signal};
