//! Outbound event types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::FooterTotals;
use crate::diagnostics::{
    DiagnosticsChange, DiagnosticsField, DiagnosticsKind, DiagnosticsSnapshot, FieldChange,
};

/// Events broadcast by the reconciliation context after state changes.
///
/// Listeners use them to invalidate dependent caches (e.g. price history
/// keyed by security) and to refresh tables outside the per-portfolio
/// regions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ReconcileEvent {
    /// A non-error position update was merged into the cache.
    PositionsUpdated {
        portfolio_uuid: String,
        security_uuids: Vec<String>,
    },

    /// Provenance of an entity changed or was cleared.
    Diagnostics {
        kind: DiagnosticsKind,
        uuid: String,
        /// Message type that carried the change
        source: String,
        changed: BTreeMap<DiagnosticsField, FieldChange>,
        snapshot: Option<DiagnosticsSnapshot>,
        timestamp: DateTime<Utc>,
    },

    /// The account list was replaced.
    AccountsReplaced { account_uuids: Vec<String> },

    /// Portfolio rows were upserted.
    PortfoliosUpserted { portfolio_uuids: Vec<String> },

    /// Footer totals changed.
    FooterRecomputed { totals: FooterTotals },

    /// The backing file was updated upstream.
    LastFileUpdated {
        raw: String,
        timestamp: Option<DateTime<Utc>>,
    },
}

impl ReconcileEvent {
    /// Creates a PositionsUpdated event.
    pub fn positions_updated(portfolio_uuid: impl Into<String>, security_uuids: Vec<String>) -> Self {
        Self::PositionsUpdated {
            portfolio_uuid: portfolio_uuid.into(),
            security_uuids,
        }
    }

    /// Creates an AccountsReplaced event.
    pub fn accounts_replaced(account_uuids: Vec<String>) -> Self {
        Self::AccountsReplaced { account_uuids }
    }

    /// Creates a PortfoliosUpserted event.
    pub fn portfolios_upserted(portfolio_uuids: Vec<String>) -> Self {
        Self::PortfoliosUpserted { portfolio_uuids }
    }

    /// Creates a FooterRecomputed event.
    pub fn footer_recomputed(totals: FooterTotals) -> Self {
        Self::FooterRecomputed { totals }
    }

    /// Creates a LastFileUpdated event.
    pub fn last_file_updated(raw: impl Into<String>, timestamp: Option<DateTime<Utc>>) -> Self {
        Self::LastFileUpdated {
            raw: raw.into(),
            timestamp,
        }
    }
}

impl From<DiagnosticsChange> for ReconcileEvent {
    fn from(change: DiagnosticsChange) -> Self {
        Self::Diagnostics {
            kind: change.kind,
            uuid: change.uuid,
            source: change.source,
            changed: change.changed,
            snapshot: change.snapshot,
            timestamp: change.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_positions_updated_wire_shape() {
        let event = ReconcileEvent::positions_updated(
            "pf-1",
            vec!["sec-1".to_string(), "sec-2".to_string()],
        );

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "positions_updated",
                "portfolioUuid": "pf-1",
                "securityUuids": ["sec-1", "sec-2"]
            })
        );

        let back: ReconcileEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_diagnostics_event_from_change() {
        let timestamp = Utc::now();
        let mut changed = BTreeMap::new();
        changed.insert(
            DiagnosticsField::Provenance,
            FieldChange {
                previous: json!(null),
                current: json!("cache"),
            },
        );
        let event: ReconcileEvent = DiagnosticsChange {
            kind: DiagnosticsKind::Account,
            uuid: "acc-1".to_string(),
            source: "accounts".to_string(),
            changed,
            snapshot: None,
            timestamp,
        }
        .into();

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], json!("diagnostics"));
        assert_eq!(value["kind"], json!("account"));
        assert_eq!(value["changed"]["provenance"]["current"], json!("cache"));
        assert_eq!(value["snapshot"], json!(null));
    }
}
