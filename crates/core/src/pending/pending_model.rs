use serde::{Deserialize, Serialize};

use crate::positions::PositionRecord;
use crate::scheduler::TimerId;

/// Result of offering an update to the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Region present and visible; content written
    Applied,
    /// No region mounted for the portfolio
    Missing,
    /// Region mounted but collapsed
    Hidden,
}

impl DeliveryOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, DeliveryOutcome::Applied)
    }
}

/// Lifecycle of a queued entry.
///
/// ```text
/// Queued(attempts) ──timer──▶ Retrying ──▶ Applied        (entry removed)
///        ▲                       │    └──▶ Dropped        (ceiling reached, entry removed)
///        └───────────────────────┘ not ready: attempts + 1, timer re-armed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingState {
    Queued,
    Retrying,
}

/// An update the rendering surface could not take yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpdate {
    pub portfolio_uuid: String,
    pub positions: Vec<PositionRecord>,
    /// Upstream error to render instead of positions
    pub error: Option<String>,
    /// Failed retries so far
    pub attempts: u32,
    pub state: PendingState,
    pub timer: Option<TimerId>,
    pub last_outcome: DeliveryOutcome,
}

/// What a fired retry timer led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryResolution {
    Applied,
    Requeued { attempts: u32 },
    Dropped { attempts: u32 },
    /// The timer no longer matches a queued entry
    Stale,
}
