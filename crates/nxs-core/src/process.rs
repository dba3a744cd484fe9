//! Process supervisor
//!
//! `OsProcessTable` answers liveness and parent/child questions from the OS
//! process table and delivers signals with `kill(2)`. `SupervisedProcess`
//! wraps one recorded pid together with the program name it must bear, so a
//! recycled pid belonging to something else is never mistaken for our agent.

use std::io;
use std::time::Duration;

use sysinfo::{Pid, ProcessStatus, System};

use crate::time::wait_until;
use crate::traits::{ProcessTable, Signal};

/// Longest process name the kernel reports before truncating
const COMM_NAME_MAX: usize = 15;

/// Check if a process with the given PID is still alive
///
/// On Unix, uses kill(pid, 0) to check if the process exists.
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    let Ok(raw_pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if raw_pid <= 0 {
        return false;
    }

    // ESRCH means no such process; EPERM means it exists but isn't ours
    unsafe {
        if libc::kill(raw_pid, 0) == 0 {
            return true;
        }
        io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }
}

#[cfg(not(unix))]
pub fn is_process_alive(_pid: u32) -> bool {
    false
}

/// Whether a reported process name belongs to the expected program
pub fn identity_matches(actual: &str, expected: &str) -> bool {
    actual == expected || (actual.len() >= COMM_NAME_MAX && expected.starts_with(actual))
}

#[cfg(unix)]
fn raw_signal(signal: Signal) -> libc::c_int {
    match signal {
        // The agent toggles between serving and suspended on HUP
        Signal::Suspend | Signal::Resume => libc::SIGHUP,
        Signal::Terminate => libc::SIGTERM,
        Signal::Kill => libc::SIGKILL,
    }
}

/// Process table backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct OsProcessTable;

impl OsProcessTable {
    fn snapshot() -> System {
        System::new_all()
    }
}

impl ProcessTable for OsProcessTable {
    fn identity(&self, pid: u32) -> Option<String> {
        if !is_process_alive(pid) {
            return None;
        }

        let system = Self::snapshot();
        let process = system.process(Pid::from_u32(pid))?;
        if matches!(process.status(), ProcessStatus::Zombie) {
            return None;
        }
        Some(process.name().to_string_lossy().into_owned())
    }

    #[cfg(unix)]
    fn signal(&self, pid: u32, signal: Signal) -> bool {
        let Ok(raw_pid) = libc::pid_t::try_from(pid) else {
            return false;
        };
        if raw_pid <= 0 {
            return false;
        }

        let result = unsafe { libc::kill(raw_pid, raw_signal(signal)) };
        if result == 0 {
            tracing::debug!("Sent {} to pid {}", signal, pid);
            return true;
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            tracing::debug!("Pid {} already stopped; {} not delivered", pid, signal);
        } else {
            tracing::warn!("Failed to send {} to pid {}: {}", signal, pid, err);
        }
        false
    }

    #[cfg(not(unix))]
    fn signal(&self, pid: u32, signal: Signal) -> bool {
        tracing::warn!("Cannot send {} to pid {} on this platform", signal, pid);
        false
    }

    fn child_of(&self, pid: u32) -> Option<u32> {
        let system = Self::snapshot();
        let parent = Pid::from_u32(pid);

        system
            .processes()
            .values()
            .filter(|p| p.parent() == Some(parent))
            .filter(|p| p.thread_kind().is_none())
            .filter(|p| !matches!(p.status(), ProcessStatus::Zombie))
            .map(|p| p.pid().as_u32())
            .min()
    }
}

/// A recorded process under supervision
pub struct SupervisedProcess<'a> {
    pid: u32,
    identity: String,
    table: &'a dyn ProcessTable,
}

impl<'a> SupervisedProcess<'a> {
    /// Supervise `pid`, which must bear the program name `identity`
    pub fn new(pid: u32, identity: impl Into<String>, table: &'a dyn ProcessTable) -> Self {
        Self {
            pid,
            identity: identity.into(),
            table,
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Alive and still the program we launched
    pub fn is_alive(&self) -> bool {
        match self.table.identity(self.pid) {
            Some(name) if identity_matches(&name, &self.identity) => true,
            Some(name) => {
                tracing::debug!(
                    "Pid {} now belongs to {:?}, not {:?}",
                    self.pid,
                    name,
                    self.identity
                );
                false
            }
            None => false,
        }
    }

    pub fn request_suspend(&self) -> bool {
        self.table.signal(self.pid, Signal::Suspend)
    }

    pub fn request_resume(&self) -> bool {
        self.table.signal(self.pid, Signal::Resume)
    }

    /// Direct child of this process (the agent's watchdog)
    pub fn watchdog(&self) -> Option<u32> {
        self.table.child_of(self.pid)
    }

    /// Stop the watchdog, if there is one
    ///
    /// A missing watchdog is expected and not an error.
    pub fn signal_watchdog(&self) -> bool {
        match self.watchdog() {
            Some(child) => self.table.signal(child, Signal::Terminate),
            None => {
                tracing::debug!("No watchdog found for pid {}", self.pid);
                false
            }
        }
    }

    /// Poll until `reached` holds for this process, bounded by `timeout`
    pub async fn await_state_change<F>(&self, timeout: Duration, poll: Duration, mut reached: F) -> bool
    where
        F: FnMut(&Self) -> bool,
    {
        wait_until(timeout, poll, || reached(self)).await
    }

    /// Wait for the process to go away
    pub async fn await_exit(&self, timeout: Duration, poll: Duration) -> bool {
        self.await_state_change(timeout, poll, |p| !p.is_alive()).await
    }

    /// Stop the process: TERM, falling back to KILL
    ///
    /// KILL is sent immediately if TERM is undeliverable, and again if the
    /// process outlives `timeout`. Returns whether the process is gone.
    pub async fn request_terminate(&self, timeout: Duration, poll: Duration) -> bool {
        if !self.is_alive() {
            return true;
        }

        if !self.table.signal(self.pid, Signal::Terminate) {
            self.table.signal(self.pid, Signal::Kill);
        }
        if self.await_exit(timeout, poll).await {
            return true;
        }

        tracing::warn!("Pid {} survived terminate; killing", self.pid);
        self.table.signal(self.pid, Signal::Kill);
        self.await_exit(timeout, poll).await
    }
}
