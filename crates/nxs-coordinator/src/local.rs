//! Local role coordinator
//!
//! Obtains the cookie from the remote role over a [`RemoteLink`] and starts
//! the proxy against it. Suspending the local side only stops the proxy; the
//! remote side is never contacted for that.

use nxs_core::options::{OptionEntry, SessionOptions};
use nxs_core::traits::ProxyLaunch;
use nxs_core::{Cookie, DisplayId, NxError, Role, SessionError};
use nxs_protocol::Handshake;

use crate::link::{RemoteInvocation, RemoteLink};
use crate::state::SessionContext;

const ROLE: Role = Role::Local;

/// One local coordinator invocation
#[derive(Debug, Clone)]
pub struct LocalRequest {
    pub display: DisplayId,
    /// Passed through to the remote role
    pub force: bool,
    /// Stop the local proxy instead of connecting
    pub suspend: bool,
    /// Caller-supplied agent options
    pub extra: Vec<OptionEntry>,
}

/// How a local run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalOutcome {
    /// Proxy started against the remote cookie
    Connected { cookie: Cookie, proxy_pid: u32 },
    /// Recorded proxy was stopped
    Suspended { pid: u32 },
    /// No live proxy was recorded
    AlreadySuspended,
}

pub struct LocalCoordinator {
    ctx: SessionContext,
    link: Box<dyn RemoteLink>,
}

impl LocalCoordinator {
    pub fn new(ctx: SessionContext, link: Box<dyn RemoteLink>) -> Self {
        Self { ctx, link }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub async fn run(&self, request: &LocalRequest) -> Result<LocalOutcome, NxError> {
        if request.suspend {
            return self.suspend(request.display).await;
        }
        self.connect(request).await
    }

    async fn connect(&self, request: &LocalRequest) -> Result<LocalOutcome, NxError> {
        let display = request.display;
        let ctx = &self.ctx;

        // Caller entries come later so an explicit link= wins
        let mut extra = vec![OptionEntry::new("link", self.link.policy().as_str())];
        extra.extend(request.extra.iter().cloned());
        let invocation = RemoteInvocation {
            display,
            force: request.force,
            extra,
        };

        let cookie = match self.link.connect_remote(&invocation).await? {
            Handshake::Ready(cookie) => cookie,
            Handshake::Failed(message) => return Err(SessionError::RemoteFailure(message).into()),
        };
        let shown = display.to_string();
        tracing::debug!("Remote role for display {} is ready", shown);

        self.retire_stale_proxy(display).await?;

        ctx.store.recreate(ROLE, display)?;
        let options = SessionOptions::for_proxy(display, &cookie);
        let options_path = ctx.store.write_options(ROLE, display, &options)?;

        let proxy_pid = ctx.launcher.spawn_proxy(&ProxyLaunch {
            display,
            options_path,
            log_path: ctx.store.session_log_path(ROLE, display),
        })?;
        ctx.store.write_pid(ROLE, display, proxy_pid)?;

        let shown = display.to_string();
        tracing::info!("Proxy {} connected to display {}", proxy_pid, shown);
        Ok(LocalOutcome::Connected { cookie, proxy_pid })
    }

    /// Stop a proxy left over from an earlier connection
    async fn retire_stale_proxy(&self, display: DisplayId) -> Result<(), NxError> {
        let inspection = self.ctx.inspect(ROLE, display)?;
        if let Some(pid) = inspection.live_pid() {
            let shown = display.to_string();
            tracing::info!("Stopping previous proxy {} for display {}", pid, shown);
            let timing = self.ctx.config.timing;
            self.ctx
                .supervised(ROLE, pid)
                .request_terminate(timing.state_change_timeout, timing.poll_interval)
                .await;
        }
        Ok(())
    }

    async fn suspend(&self, display: DisplayId) -> Result<LocalOutcome, NxError> {
        let inspection = self.ctx.inspect(ROLE, display)?;
        let Some(pid) = inspection.live_pid() else {
            return Ok(LocalOutcome::AlreadySuspended);
        };

        let timing = self.ctx.config.timing;
        let gone = self
            .ctx
            .supervised(ROLE, pid)
            .request_terminate(timing.state_change_timeout, timing.poll_interval)
            .await;
        if !gone {
            let shown = display.to_string();
            tracing::warn!("Proxy {} for display {} is still alive", pid, shown);
        }
        Ok(LocalOutcome::Suspended { pid })
    }
}
