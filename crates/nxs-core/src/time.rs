//! Bounded polling
//!
//! Every wait in nxsession has an upper bound; these helpers are the only
//! place that sleeps between checks.

use std::time::Duration;

use tokio::time::Instant;

/// Smallest interval between two checks
const MIN_POLL: Duration = Duration::from_millis(1);

/// Poll `check` until it yields a value or `timeout` elapses
///
/// `check` runs at least once, even with a zero timeout.
pub async fn poll_until<T, F>(timeout: Duration, poll: Duration, mut check: F) -> Option<T>
where
    F: FnMut() -> Option<T>,
{
    let deadline = Instant::now() + timeout;
    let poll = poll.max(MIN_POLL);

    loop {
        if let Some(value) = check() {
            return Some(value);
        }

        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        tokio::time::sleep(poll.min(deadline - now)).await;
    }
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn wait_until<F>(timeout: Duration, poll: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    poll_until(timeout, poll, || condition().then_some(()))
        .await
        .is_some()
}
