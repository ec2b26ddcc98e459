//! Account domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticsSnapshot;

/// A cached account. Replaced wholesale on every accounts update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountRecord {
    pub uuid: String,
    pub name: String,
    pub currency: Option<String>,
    /// Balance in the dashboard's base currency; `None` when it could not
    /// be converted
    pub balance: Option<Decimal>,
    /// Balance in the account's own currency
    pub orig_balance: Option<Decimal>,
    pub orig_currency: Option<String>,
    pub fx_rate: Option<Decimal>,
    pub fx_rate_timestamp: Option<DateTime<Utc>>,
    pub fx_unavailable: bool,
    pub coverage_ratio: Option<Decimal>,
    pub provenance: Option<String>,
    pub metric_run_uuid: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
}

impl AccountRecord {
    /// Provenance fields tracked by the diagnostics differ.
    pub fn diagnostics_snapshot(&self) -> Option<DiagnosticsSnapshot> {
        DiagnosticsSnapshot::from_parts(
            self.coverage_ratio,
            self.provenance.clone(),
            self.metric_run_uuid.clone(),
            self.generated_at,
        )
    }
}

/// Sum of account balances.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTotals {
    pub account_count: usize,
    /// `None` whenever `incomplete` is set
    pub balance: Option<Decimal>,
    pub incomplete: bool,
}
