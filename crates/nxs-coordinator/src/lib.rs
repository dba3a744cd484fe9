//! nxs-coordinator: Session coordinators for nxsession
//!
//! The remote role owns the display agent and runs the session state
//! machine. The local role fetches the session cookie from it over a
//! [`link::RemoteLink`] and starts the proxy.

pub mod link;
pub mod local;
pub mod remote;
pub mod state;

#[cfg(test)]
mod testing;

pub use link::{LinkPolicy, LoopbackLink, RemoteInvocation, RemoteLink, SshLink};
pub use local::{LocalCoordinator, LocalOutcome, LocalRequest};
pub use remote::{failure_line, RemoteAction, RemoteCoordinator, RemoteOutcome, RemoteRequest};
pub use state::{Inspection, SessionContext};
