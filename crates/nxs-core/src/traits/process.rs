//! Process and port inspection traits

use std::fmt;

/// Signals the supervisor sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Ask the agent to release its control port and keep the session
    Suspend,
    /// Ask the agent to re-read its options and reattach
    Resume,
    /// Graceful stop
    Terminate,
    /// Unconditional stop
    Kill,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Suspend => write!(f, "suspend"),
            Signal::Resume => write!(f, "resume"),
            Signal::Terminate => write!(f, "terminate"),
            Signal::Kill => write!(f, "kill"),
        }
    }
}

/// Whether a TCP port is currently bound by any process
pub trait PortProbe: Send + Sync {
    fn is_bound(&self, port: u16) -> bool;
}

/// OS process inspection and signalling
///
/// Every operation is best-effort: a vanished process is reported as
/// absent (`None` / `false`), never as an error.
pub trait ProcessTable: Send + Sync {
    /// Name of the live process with this pid
    fn identity(&self, pid: u32) -> Option<String>;

    /// Deliver a signal; returns whether it was deliverable
    fn signal(&self, pid: u32, signal: Signal) -> bool;

    /// A direct child of `pid`, if one can be found
    fn child_of(&self, pid: u32) -> Option<u32>;
}
