use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Handle of one scheduled retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(pub u64);

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Schedules delivery retries for queued updates.
///
/// When a timer fires, the owner of the scheduler must call back into the
/// reconciliation context with the portfolio uuid and the `TimerId`; the
/// context ignores timers it no longer tracks.
pub trait RetryScheduler: Send + Sync {
    /// Arms a one-shot timer for `portfolio_uuid` after `delay`.
    fn schedule(&self, portfolio_uuid: &str, delay: Duration) -> TimerId;

    /// Disarms a timer. Cancelling a fired or unknown timer is a no-op.
    fn cancel(&self, timer: TimerId);
}
