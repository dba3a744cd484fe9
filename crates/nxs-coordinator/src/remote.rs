//! Remote role coordinator
//!
//! Owns the display agent for one display. Every run inspects the session
//! first and only then acts:
//!
//! - vacant: start creates a new agent, suspend has nothing to do, terminate
//!   fails.
//! - active: refused unless forced or terminating; otherwise the agent is
//!   suspended first and the run carries on from the suspended state.
//! - suspended: start resumes, terminate stops the agent and drops its cookie.
//!
//! Inspection and action are not atomic across invocations; a concurrent
//! invocation on the same display can still slip in between the two.

use std::io::Write;

use nxs_core::options::{OptionEntry, SessionOptions};
use nxs_core::secret::generate_cookie;
use nxs_core::time::poll_until;
use nxs_core::traits::{AgentLaunch, StartupLaunch};
use nxs_core::{Cookie, DisplayId, NxError, Ports, Role, SessionError, SessionState};
use nxs_protocol::announce;

use crate::state::SessionContext;

const ROLE: Role = Role::Remote;

/// What the caller wants done with the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAction {
    /// Start a new session, or resume a suspended one
    Start,
    /// Leave the session suspended
    Suspend,
    /// Stop the agent and forget the cookie
    Terminate,
}

/// One remote coordinator invocation
#[derive(Debug, Clone)]
pub struct RemoteRequest {
    pub display: DisplayId,
    pub action: RemoteAction,
    /// Take over a session that is active elsewhere
    pub force: bool,
    /// Caller-supplied agent options
    pub extra: Vec<OptionEntry>,
}

/// How a remote run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// Session is serving; the cookie has been announced
    Ready { cookie: Cookie, created: bool },
    /// Session was suspended by this run
    Suspended { pid: u32 },
    /// Session was already suspended or not running
    AlreadySuspended,
    /// Agent stopped and cookie removed
    Terminated { pid: u32 },
}

/// First output line reporting a failed run
///
/// Anything not starting with the readiness marker is an error to the local
/// role, which shows it verbatim.
pub fn failure_line(err: &NxError) -> String {
    format!("Error: {}", err)
}

/// Observed state with the live pid attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observed {
    Vacant,
    Active(u32),
    Suspended(u32),
}

/// Session state machine for the remote role
pub struct RemoteCoordinator {
    ctx: SessionContext,
}

impl RemoteCoordinator {
    pub fn new(ctx: SessionContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    fn observe(&self, display: DisplayId) -> Result<(Observed, Ports), NxError> {
        let inspection = self.ctx.inspect(ROLE, display)?;
        let observed = match (inspection.state, inspection.live_pid()) {
            (SessionState::Active, Some(pid)) => Observed::Active(pid),
            (SessionState::Suspended, Some(pid)) => Observed::Suspended(pid),
            _ => Observed::Vacant,
        };
        let shown = display.to_string();
        tracing::info!("Display {} is {}", shown, inspection.state);
        Ok((observed, inspection.ports))
    }

    /// Run one request to completion
    ///
    /// On `Ready`, the readiness line has been written to `out` and the
    /// handoff linger has elapsed.
    pub async fn run(
        &self,
        request: &RemoteRequest,
        out: &mut (dyn Write + Send),
    ) -> Result<RemoteOutcome, NxError> {
        let display = request.display;
        let (mut observed, ports) = self.observe(display)?;
        let mut taken_over = false;

        if let Observed::Active(pid) = observed {
            if !request.force && request.action != RemoteAction::Terminate {
                return Err(SessionError::Refused(display).into());
            }
            observed = self.take_over(display, pid, ports).await?;
            taken_over = true;
        }

        match (observed, request.action) {
            (Observed::Vacant, RemoteAction::Start) => {
                let cookie = self.create(request, ports).await?;
                self.announce(display, &cookie, true, out).await?;
                Ok(RemoteOutcome::Ready {
                    cookie,
                    created: true,
                })
            }
            (Observed::Vacant, RemoteAction::Suspend) => Ok(RemoteOutcome::AlreadySuspended),
            (Observed::Vacant, RemoteAction::Terminate) => {
                Err(SessionError::NothingToTerminate(display).into())
            }
            (Observed::Suspended(pid), RemoteAction::Start) => {
                let cookie = self.resume(request, pid, ports).await?;
                self.announce(display, &cookie, false, out).await?;
                Ok(RemoteOutcome::Ready {
                    cookie,
                    created: false,
                })
            }
            (Observed::Suspended(pid), RemoteAction::Suspend) => {
                if taken_over {
                    Ok(RemoteOutcome::Suspended { pid })
                } else {
                    Ok(RemoteOutcome::AlreadySuspended)
                }
            }
            (Observed::Suspended(pid), RemoteAction::Terminate) => {
                self.terminate(display, pid).await?;
                Ok(RemoteOutcome::Terminated { pid })
            }
            (Observed::Active(_), _) => Err(SessionError::TakeoverFailed(display).into()),
        }
    }

    /// Force an active session into suspension
    ///
    /// Suspends the agent, then stops its watchdog if it has one, pausing
    /// after each. The session is inspected again afterwards: an agent that
    /// died meanwhile leaves the display vacant.
    async fn take_over(
        &self,
        display: DisplayId,
        pid: u32,
        ports: Ports,
    ) -> Result<Observed, NxError> {
        let timing = self.ctx.config.timing;
        let agent = self.ctx.supervised(ROLE, pid);
        let shown = display.to_string();
        tracing::info!("Taking over display {} from agent {}", shown, pid);

        agent.request_suspend();
        tokio::time::sleep(timing.grace).await;
        agent.signal_watchdog();
        tokio::time::sleep(timing.grace).await;

        let probe = self.ctx.probe.as_ref();
        let settled = agent
            .await_state_change(timing.state_change_timeout, timing.poll_interval, |p| {
                !probe.is_bound(ports.control) || !p.is_alive()
            })
            .await;
        if !settled {
            tracing::warn!("Agent {} still holds port {}", pid, ports.control);
        }

        let (observed, _) = self.observe(display)?;
        match observed {
            Observed::Active(_) => Err(SessionError::TakeoverFailed(display).into()),
            other => Ok(other),
        }
    }

    /// Start a fresh agent on a vacant display
    async fn create(&self, request: &RemoteRequest, ports: Ports) -> Result<Cookie, NxError> {
        let display = request.display;
        let ctx = &self.ctx;

        if ctx.probe.is_bound(ports.control) {
            return Err(SessionError::ControlPortInUse {
                display,
                port: ports.control,
            }
            .into());
        }
        if ctx.probe.is_bound(ports.display) {
            return Err(SessionError::DisplayPortInUse {
                display,
                port: ports.display,
            }
            .into());
        }

        ctx.store.recreate(ROLE, display)?;

        let cookie = generate_cookie();
        ctx.auth.add(display, &cookie)?;
        let pid = match self.launch_agent(request, &cookie) {
            Ok(pid) => pid,
            Err(e) => {
                self.forget_cookie(display);
                return Err(e);
            }
        };

        let recorded = ctx.store.write_pid(ROLE, display, pid).map_err(NxError::from);
        let ready = match recorded {
            Ok(()) => self.await_ready(display, pid, ports).await,
            Err(e) => Err(e),
        };
        if let Err(e) = ready {
            // A hung or unrecorded agent would otherwise outlive its cookie
            let timing = ctx.config.timing;
            ctx.supervised(ROLE, pid)
                .request_terminate(timing.state_change_timeout, timing.poll_interval)
                .await;
            self.forget_cookie(display);
            return Err(e);
        }

        let shown = display.to_string();
        tracing::info!("Created session on display {} (agent {})", shown, pid);
        Ok(cookie)
    }

    /// Write the agent's options and spawn it
    fn launch_agent(&self, request: &RemoteRequest, cookie: &Cookie) -> Result<u32, NxError> {
        let display = request.display;
        let options = SessionOptions::for_agent(display, cookie, &request.extra);
        let options_path = self.ctx.store.write_options(ROLE, display, &options)?;

        self.ctx.launcher.spawn_agent(&AgentLaunch {
            display,
            options_path,
            log_path: self.ctx.store.session_log_path(ROLE, display),
        })
    }

    /// Drop the display's cookie after a failed start
    fn forget_cookie(&self, display: DisplayId) {
        if let Err(e) = self.ctx.auth.remove(display) {
            let shown = display.to_string();
            tracing::warn!("Failed to remove cookie for display {}: {}", shown, e);
        }
    }

    /// Reattach a suspended agent with regenerated options
    async fn resume(
        &self,
        request: &RemoteRequest,
        pid: u32,
        ports: Ports,
    ) -> Result<Cookie, NxError> {
        let display = request.display;
        let ctx = &self.ctx;

        let cookie = ctx
            .auth
            .extract(display)?
            .ok_or(SessionError::MissingCookie(display))?;

        if let Some(previous) = ctx.store.read_options(ROLE, display)?.and_then(|o| o.cookie()) {
            if !previous.matches(&cookie) {
                let shown = display.to_string();
                tracing::warn!(
                    "Options cookie for display {} differs from the registered one; rewriting",
                    shown
                );
            }
        }

        let options = SessionOptions::for_agent(display, &cookie, &request.extra);
        ctx.store.write_options(ROLE, display, &options)?;

        if !ctx.supervised(ROLE, pid).request_resume() {
            return Err(SessionError::AgentExited {
                display,
                log: ctx.store.session_log_path(ROLE, display),
            }
            .into());
        }
        self.await_ready(display, pid, ports).await?;

        let shown = display.to_string();
        tracing::info!("Resumed session on display {} (agent {})", shown, pid);
        Ok(cookie)
    }

    /// Stop a suspended agent and drop its cookie
    ///
    /// The session directory is left in place for inspection.
    async fn terminate(&self, display: DisplayId, pid: u32) -> Result<(), NxError> {
        let timing = self.ctx.config.timing;
        let agent = self.ctx.supervised(ROLE, pid);

        if !agent
            .request_terminate(timing.state_change_timeout, timing.poll_interval)
            .await
        {
            let shown = display.to_string();
            tracing::warn!("Agent {} for display {} is still alive", pid, shown);
        }
        self.ctx.auth.remove(display)?;

        let shown = display.to_string();
        tracing::info!("Terminated session on display {}", shown);
        Ok(())
    }

    /// Wait for the agent to bind its control port
    async fn await_ready(&self, display: DisplayId, pid: u32, ports: Ports) -> Result<(), NxError> {
        let timing = self.ctx.config.timing;
        let agent = self.ctx.supervised(ROLE, pid);
        let probe = self.ctx.probe.as_ref();

        let ready = poll_until(timing.agent_start_timeout, timing.poll_interval, || {
            if probe.is_bound(ports.control) {
                Some(true)
            } else if !agent.is_alive() {
                Some(false)
            } else {
                None
            }
        })
        .await;

        match ready {
            Some(true) => Ok(()),
            Some(false) => Err(SessionError::AgentExited {
                display,
                log: self.ctx.store.session_log_path(ROLE, display),
            }
            .into()),
            None => Err(SessionError::AgentStartTimeout {
                display,
                port: ports.control,
                timeout: timing.agent_start_timeout,
            }
            .into()),
        }
    }

    /// Write the readiness line, start the startup action, then linger
    async fn announce(
        &self,
        display: DisplayId,
        cookie: &Cookie,
        created: bool,
        out: &mut (dyn Write + Send),
    ) -> Result<(), NxError> {
        announce(out, cookie)?;

        if created {
            if let Some(command) = self.ctx.config.startup_action() {
                let launch = StartupLaunch {
                    display,
                    command: command.to_string(),
                    log_path: self.ctx.store.startup_log_path(ROLE, display),
                };
                if let Err(e) = self.ctx.launcher.spawn_startup(&launch) {
                    let shown = display.to_string();
                    tracing::warn!("Startup action for display {} failed: {}", shown, e);
                }
            }
        }

        tokio::time::sleep(self.ctx.config.timing.handoff_linger).await;
        Ok(())
    }
}
