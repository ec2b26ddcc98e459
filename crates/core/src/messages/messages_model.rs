//! Inbound message models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::accounts::AccountRecord;
use crate::diagnostics::DiagnosticsSnapshot;
use crate::portfolios::PortfolioPatch;
use crate::positions::PositionPatch;

/// Transport envelope: `{ entry_id?, data_type, data }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub entry_id: Option<String>,
    pub data_type: String,
    #[serde(default)]
    pub data: Value,
}

/// A decoded push message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Full account list, replaces the cache
    Accounts(Vec<AccountRecord>),
    /// Portfolio rows to upsert
    PortfolioValues(Vec<PortfolioPatch>),
    /// One entry per portfolio carried by the message
    PortfolioPositions(Vec<PortfolioPositionsMessage>),
    LastFileUpdate(LastFileUpdate),
    /// Unrecognized `data_type`, ignored
    Unknown(String),
}

/// Positions (or an upstream error) for one portfolio, possibly one chunk of many.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortfolioPositionsMessage {
    pub portfolio_uuid: String,
    pub positions: Vec<PositionPatch>,
    /// Upstream failure; short-circuits merging
    pub error: Option<String>,
    /// 1-based
    pub chunk_index: Option<u32>,
    pub chunk_count: Option<u32>,
    pub coverage_ratio: Option<Decimal>,
    pub provenance: Option<String>,
    pub metric_run_uuid: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
}

impl PortfolioPositionsMessage {
    pub fn new(portfolio_uuid: impl Into<String>, positions: Vec<PositionPatch>) -> Self {
        Self {
            portfolio_uuid: portfolio_uuid.into(),
            positions,
            ..Self::default()
        }
    }

    pub fn failed(portfolio_uuid: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            portfolio_uuid: portfolio_uuid.into(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn diagnostics_snapshot(&self) -> Option<DiagnosticsSnapshot> {
        DiagnosticsSnapshot::from_parts(
            self.coverage_ratio,
            self.provenance.clone(),
            self.metric_run_uuid.clone(),
            self.generated_at,
        )
    }
}

/// Upstream file modification marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastFileUpdate {
    /// As received, for display
    pub raw: String,
    pub timestamp: Option<DateTime<Utc>>,
}
