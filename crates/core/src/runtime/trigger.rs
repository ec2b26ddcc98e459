use serde_json::Value;

use crate::errors::Result;
use crate::messages::PortfolioPositionsMessage;
use crate::reconcile::FetchTicket;
use crate::scheduler::TimerId;

/// Everything that can wake the reconcile worker.
#[derive(Debug)]
pub enum Trigger {
    /// Raw push message from the transport
    Message(Value),
    /// A retry timer fired
    RetryDue {
        portfolio_uuid: String,
        timer: TimerId,
    },
    /// The user expanded a portfolio region
    RegionExpanded { portfolio_uuid: String },
    /// A region was (re)mounted
    SurfaceAttached { portfolio_uuid: String },
    /// A lazy-load fetch finished
    FetchCompleted {
        ticket: FetchTicket,
        response: Result<PortfolioPositionsMessage>,
    },
}
