use serde::{Deserialize, Serialize};

/// Identifies one lazy-load request for a portfolio's positions.
///
/// Only the ticket carrying the portfolio's current generation may write its
/// response; anything older lost the race to a newer request or re-attach.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTicket {
    pub portfolio_uuid: String,
    pub generation: u64,
}
