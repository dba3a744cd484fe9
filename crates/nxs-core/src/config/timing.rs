//! Grace intervals and timeouts

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::duration_millis;

/// Timing knobs for supervision and the handoff
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause after each signal of a forced takeover
    #[serde(with = "duration_millis")]
    pub grace: Duration,

    /// Interval between port/process polls
    #[serde(with = "duration_millis")]
    pub poll_interval: Duration,

    /// Upper bound on waiting for the agent to bind its control port
    #[serde(with = "duration_millis")]
    pub agent_start_timeout: Duration,

    /// Upper bound on waiting for a signalled process to change state
    #[serde(with = "duration_millis")]
    pub state_change_timeout: Duration,

    /// How long the remote role keeps its output open after announcing
    #[serde(with = "duration_millis")]
    pub handoff_linger: Duration,

    /// Upper bound on waiting for the remote role's first line
    #[serde(with = "duration_millis")]
    pub handshake_timeout: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(1),
            poll_interval: Duration::from_millis(100),
            agent_start_timeout: Duration::from_secs(30),
            state_change_timeout: Duration::from_secs(10),
            handoff_linger: Duration::from_secs(2),
            handshake_timeout: Duration::from_secs(60),
        }
    }
}
