//! Shared coordinator state
//!
//! `SessionContext` bundles the configuration, the session store and the OS
//! seams. Both roles inspect sessions through it, so "what state is this
//! display in" has exactly one answer.

use std::sync::Arc;

use serde::Serialize;

use nxs_core::config::{program_identity, NxConfig};
use nxs_core::launch::CommandLauncher;
use nxs_core::probe::SocketProbe;
use nxs_core::process::{OsProcessTable, SupervisedProcess};
use nxs_core::traits::{AuthDatabase, Launcher, PortProbe, ProcessTable};
use nxs_core::xauth::Xauth;
use nxs_core::{DisplayId, NxError, Ports, Role, SessionState, SessionStore};

/// Result of inspecting one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Inspection {
    pub role: Role,
    pub display: DisplayId,
    pub state: SessionState,
    /// Recorded pid, live or stale
    pub pid: Option<u32>,
    pub ports: Ports,
}

impl Inspection {
    /// Pid of the live supervised process, if any
    pub fn live_pid(&self) -> Option<u32> {
        match self.state {
            SessionState::Active | SessionState::Suspended => self.pid,
            SessionState::Absent | SessionState::Terminated => None,
        }
    }
}

/// Configuration, store and OS seams shared by both coordinators
pub struct SessionContext {
    pub config: NxConfig,
    pub store: SessionStore,
    pub probe: Arc<dyn PortProbe>,
    pub processes: Arc<dyn ProcessTable>,
    pub auth: Arc<dyn AuthDatabase>,
    pub launcher: Arc<dyn Launcher>,
}

impl SessionContext {
    /// Context backed by the real OS and external programs
    pub fn from_config(config: NxConfig) -> Result<Self, NxError> {
        let store = SessionStore::new(config.session_root()?);
        Ok(Self {
            store,
            probe: Arc::new(SocketProbe),
            processes: Arc::new(OsProcessTable),
            auth: Arc::new(Xauth::new(config.binaries.xauth.clone())),
            launcher: Arc::new(CommandLauncher::from_config(&config)),
            config,
        })
    }

    /// Program name a supervised process of `role` must bear
    pub fn identity(&self, role: Role) -> String {
        match role {
            Role::Remote => program_identity(&self.config.binaries.agent),
            Role::Local => program_identity(&self.config.binaries.proxy),
        }
    }

    /// Handle on a recorded process of `role`
    pub fn supervised(&self, role: Role, pid: u32) -> SupervisedProcess<'_> {
        SupervisedProcess::new(pid, self.identity(role), self.processes.as_ref())
    }

    pub fn ports(&self, display: DisplayId) -> Result<Ports, NxError> {
        Ok(self.config.ports.ports(display)?)
    }

    /// Determine the current state of a session
    ///
    /// Remote sessions are `Active` while the agent holds its control port
    /// and `Suspended` while it is alive without it. A local session is
    /// `Active` while its proxy is alive. A recorded pid that is no longer
    /// alive (or now belongs to another program) is `Terminated`.
    pub fn inspect(&self, role: Role, display: DisplayId) -> Result<Inspection, NxError> {
        let ports = self.ports(display)?;
        let pid = self.store.read_pid(role, display)?;

        let state = match pid {
            None => SessionState::Absent,
            Some(pid) if !self.supervised(role, pid).is_alive() => {
                let shown = display.to_string();
                tracing::debug!("Recorded pid {} for {} display {} is gone", pid, role, shown);
                SessionState::Terminated
            }
            Some(_) => match role {
                Role::Remote if self.probe.is_bound(ports.control) => SessionState::Active,
                Role::Remote => SessionState::Suspended,
                Role::Local => SessionState::Active,
            },
        };

        Ok(Inspection {
            role,
            display,
            state,
            pid,
            ports,
        })
    }

    /// Inspect every session directory under the store root
    pub fn list(&self) -> Result<Vec<Inspection>, NxError> {
        self.store
            .list()?
            .into_iter()
            .map(|stored| self.inspect(stored.role, stored.display))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeWorld, AGENT, PROXY};
    use tempfile::TempDir;

    fn display(n: u32) -> DisplayId {
        DisplayId::new(n).unwrap()
    }

    fn record(ctx: &SessionContext, role: Role, n: u32, pid: u32) {
        ctx.store.recreate(role, display(n)).unwrap();
        ctx.store.write_pid(role, display(n), pid).unwrap();
    }

    #[test]
    fn test_inspect_remote_states() {
        let dir = TempDir::new().unwrap();
        let world = FakeWorld::new();
        let ctx = world.context(dir.path());

        assert_eq!(
            ctx.inspect(Role::Remote, display(5)).unwrap().state,
            SessionState::Absent
        );

        let agent = world.world().insert_proc(AGENT, None);
        record(&ctx, Role::Remote, 5, agent);
        let inspection = ctx.inspect(Role::Remote, display(5)).unwrap();
        assert_eq!(inspection.state, SessionState::Suspended);
        assert_eq!(inspection.live_pid(), Some(agent));
        assert_eq!(inspection.ports, Ports { control: 4005, display: 6005 });

        world.bind(4005);
        assert_eq!(
            ctx.inspect(Role::Remote, display(5)).unwrap().state,
            SessionState::Active
        );

        world.world().procs.clear();
        let inspection = ctx.inspect(Role::Remote, display(5)).unwrap();
        assert_eq!(inspection.state, SessionState::Terminated);
        assert_eq!(inspection.pid, Some(agent));
        assert_eq!(inspection.live_pid(), None);
    }

    #[test]
    fn test_inspect_local_requires_proxy_identity() {
        let dir = TempDir::new().unwrap();
        let world = FakeWorld::new();
        let ctx = world.context(dir.path());

        let proxy = world.world().insert_proc(PROXY, None);
        record(&ctx, Role::Local, 2, proxy);
        assert_eq!(
            ctx.inspect(Role::Local, display(2)).unwrap().state,
            SessionState::Active
        );

        let agent = world.world().insert_proc(AGENT, None);
        record(&ctx, Role::Local, 3, agent);
        assert_eq!(
            ctx.inspect(Role::Local, display(3)).unwrap().state,
            SessionState::Terminated
        );
    }

    #[test]
    fn test_list_covers_both_roles() {
        let dir = TempDir::new().unwrap();
        let world = FakeWorld::new();
        let ctx = world.context(dir.path());

        let agent = world.world().insert_proc(AGENT, None);
        record(&ctx, Role::Remote, 7, agent);
        record(&ctx, Role::Local, 7, 99_999);

        let listed: Vec<(Role, SessionState)> = ctx
            .list()
            .unwrap()
            .into_iter()
            .map(|i| (i.role, i.state))
            .collect();
        assert_eq!(
            listed,
            vec![
                (Role::Remote, SessionState::Suspended),
                (Role::Local, SessionState::Terminated),
            ]
        );
    }
}
