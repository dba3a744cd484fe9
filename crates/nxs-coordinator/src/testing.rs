//! In-memory stand-ins for the OS seams
//!
//! `FakeWorld` plays the port table, process table, authentication database
//! and launcher at once. A fake agent binds `control_base + display` when it
//! starts, releases it on suspend and rebinds it on resume.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use nxs_core::config::NxConfig;
use nxs_core::traits::{
    AgentLaunch, AuthDatabase, Launcher, PortProbe, ProcessTable, ProxyLaunch, Signal,
    StartupLaunch,
};
use nxs_core::{AuthError, Cookie, DisplayId, NxError, SessionStore};
use nxs_protocol::{parse_first_line, Handshake};

use crate::link::{LinkPolicy, RemoteInvocation, RemoteLink};
use crate::remote::{failure_line, RemoteAction, RemoteCoordinator, RemoteRequest};
use crate::state::SessionContext;

pub(crate) const AGENT: &str = "nxagent";
pub(crate) const PROXY: &str = "nxproxy";

#[derive(Debug, Clone)]
pub(crate) struct FakeProc {
    pub name: String,
    pub parent: Option<u32>,
    pub control_port: Option<u16>,
    /// Survives TERM, only KILL removes it
    pub ignores_term: bool,
}

#[derive(Debug)]
pub(crate) struct World {
    pub bound: HashSet<u16>,
    pub procs: BTreeMap<u32, FakeProc>,
    pub cookies: HashMap<u32, Cookie>,
    pub signals: Vec<(u32, Signal)>,
    pub startups: Vec<StartupLaunch>,
    pub proxies: Vec<ProxyLaunch>,
    pub agents: Vec<AgentLaunch>,
    next_pid: u32,
    /// New agents get a watchdog child
    pub spawn_watchdog: bool,
    /// New agents bind their control port
    pub agent_binds: bool,
    /// New agents exit immediately
    pub agent_dies: bool,
    /// Agents keep their port on suspend
    pub agent_ignores_suspend: bool,
    /// The agent binary cannot be started
    pub agent_missing: bool,
}

impl Default for World {
    fn default() -> Self {
        Self {
            bound: HashSet::new(),
            procs: BTreeMap::new(),
            cookies: HashMap::new(),
            signals: Vec::new(),
            startups: Vec::new(),
            proxies: Vec::new(),
            agents: Vec::new(),
            next_pid: 1000,
            spawn_watchdog: true,
            agent_binds: true,
            agent_dies: false,
            agent_ignores_suspend: false,
            agent_missing: false,
        }
    }
}

impl World {
    fn alloc_pid(&mut self) -> u32 {
        self.next_pid += 1;
        self.next_pid
    }

    pub fn insert_proc(&mut self, name: &str, parent: Option<u32>) -> u32 {
        let pid = self.alloc_pid();
        self.procs.insert(
            pid,
            FakeProc {
                name: name.to_string(),
                parent,
                control_port: None,
                ignores_term: false,
            },
        );
        pid
    }

    fn remove_proc(&mut self, pid: u32) {
        if let Some(proc) = self.procs.remove(&pid) {
            if let Some(port) = proc.control_port {
                self.bound.remove(&port);
            }
        }
    }

    pub fn signals_to(&self, pid: u32) -> Vec<Signal> {
        self.signals
            .iter()
            .filter(|(p, _)| *p == pid)
            .map(|(_, s)| *s)
            .collect()
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakeWorld(Arc<Mutex<World>>);

impl FakeWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn world(&self) -> MutexGuard<'_, World> {
        self.0.lock().unwrap()
    }

    pub fn bind(&self, port: u16) {
        self.world().bound.insert(port);
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        self.world().procs.contains_key(&pid)
    }

    pub fn cookie(&self, display: DisplayId) -> Option<Cookie> {
        self.world().cookies.get(&display.as_u32()).cloned()
    }

    /// Context over this world with sessions rooted at `root`
    pub fn context(&self, root: &Path) -> SessionContext {
        let config = NxConfig {
            session_root: Some(root.to_path_buf()),
            ..NxConfig::default()
        };
        SessionContext {
            store: SessionStore::new(root),
            probe: Arc::new(self.clone()),
            processes: Arc::new(self.clone()),
            auth: Arc::new(self.clone()),
            launcher: Arc::new(self.clone()),
            config,
        }
    }
}

impl PortProbe for FakeWorld {
    fn is_bound(&self, port: u16) -> bool {
        self.world().bound.contains(&port)
    }
}

impl ProcessTable for FakeWorld {
    fn identity(&self, pid: u32) -> Option<String> {
        self.world().procs.get(&pid).map(|p| p.name.clone())
    }

    fn signal(&self, pid: u32, signal: Signal) -> bool {
        let mut world = self.world();
        world.signals.push((pid, signal));

        let Some(proc) = world.procs.get(&pid).cloned() else {
            return false;
        };
        match signal {
            Signal::Suspend if !world.agent_ignores_suspend => {
                if let Some(port) = proc.control_port {
                    world.bound.remove(&port);
                }
            }
            Signal::Suspend => {}
            Signal::Resume => {
                if let Some(port) = proc.control_port {
                    world.bound.insert(port);
                }
            }
            Signal::Terminate if proc.ignores_term => {}
            Signal::Terminate | Signal::Kill => world.remove_proc(pid),
        }
        true
    }

    fn child_of(&self, pid: u32) -> Option<u32> {
        self.world()
            .procs
            .iter()
            .find(|(_, p)| p.parent == Some(pid))
            .map(|(child, _)| *child)
    }
}

impl AuthDatabase for FakeWorld {
    fn add(&self, display: DisplayId, cookie: &Cookie) -> Result<(), AuthError> {
        self.world().cookies.insert(display.as_u32(), cookie.clone());
        Ok(())
    }

    fn remove(&self, display: DisplayId) -> Result<(), AuthError> {
        self.world().cookies.remove(&display.as_u32());
        Ok(())
    }

    fn extract(&self, display: DisplayId) -> Result<Option<Cookie>, AuthError> {
        Ok(self.cookie(display))
    }
}

impl Launcher for FakeWorld {
    fn spawn_agent(&self, launch: &AgentLaunch) -> Result<u32, NxError> {
        let mut world = self.world();
        if world.agent_missing {
            return Err(NxError::Launch {
                program: AGENT.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
        world.agents.push(launch.clone());

        let pid = world.alloc_pid();
        if world.agent_dies {
            return Ok(pid);
        }

        let port = 4000 + launch.display.as_u32() as u16;
        world.procs.insert(
            pid,
            FakeProc {
                name: AGENT.to_string(),
                parent: None,
                control_port: Some(port),
                ignores_term: false,
            },
        );
        if world.agent_binds {
            world.bound.insert(port);
        }
        if world.spawn_watchdog {
            world.insert_proc(AGENT, Some(pid));
        }
        Ok(pid)
    }

    fn spawn_proxy(&self, launch: &ProxyLaunch) -> Result<u32, NxError> {
        let mut world = self.world();
        world.proxies.push(launch.clone());
        Ok(world.insert_proc(PROXY, None))
    }

    fn spawn_startup(&self, launch: &StartupLaunch) -> Result<u32, NxError> {
        let mut world = self.world();
        world.startups.push(launch.clone());
        Ok(world.insert_proc("sh", None))
    }
}

/// Link answering with a fixed first line
pub(crate) struct FakeLink {
    pub handshake: Handshake,
    pub invocations: Arc<Mutex<Vec<RemoteInvocation>>>,
}

impl FakeLink {
    pub fn new(handshake: Handshake) -> Self {
        Self {
            handshake,
            invocations: Arc::default(),
        }
    }
}

#[async_trait]
impl RemoteLink for FakeLink {
    fn policy(&self) -> LinkPolicy {
        LinkPolicy::Wan
    }

    async fn connect_remote(&self, invocation: &RemoteInvocation) -> Result<Handshake, NxError> {
        self.invocations.lock().unwrap().push(invocation.clone());
        Ok(self.handshake.clone())
    }
}

/// Link running the remote coordinator in-process and reading its output
pub(crate) struct InProcessLink {
    pub remote: RemoteCoordinator,
}

#[async_trait]
impl RemoteLink for InProcessLink {
    fn policy(&self) -> LinkPolicy {
        LinkPolicy::Lan
    }

    async fn connect_remote(&self, invocation: &RemoteInvocation) -> Result<Handshake, NxError> {
        let request = RemoteRequest {
            display: invocation.display,
            action: RemoteAction::Start,
            force: invocation.force,
            extra: invocation.extra.clone(),
        };

        let mut out = Vec::new();
        if let Err(e) = self.remote.run(&request, &mut out).await {
            out.extend_from_slice(failure_line(&e).as_bytes());
            out.push(b'\n');
        }

        let output = String::from_utf8_lossy(&out);
        Ok(parse_first_line(output.lines().next().unwrap_or("")))
    }
}
