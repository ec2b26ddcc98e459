//! Portfolio domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticsSnapshot;
use crate::patch::FieldPatch;
use crate::positions::{Performance, PositionRecord};

/// An absolute/percentage pair (gain, day change).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueChange {
    pub abs: Option<Decimal>,
    pub pct: Option<Decimal>,
}

impl ValueChange {
    pub fn is_empty(&self) -> bool {
        self.abs.is_none() && self.pct.is_none()
    }
}

/// A cached portfolio row. Upserted field-by-field, never deleted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioRecord {
    pub uuid: String,
    pub name: Option<String>,
    pub position_count: i64,
    pub current_value: Option<Decimal>,
    pub purchase_sum: Option<Decimal>,
    pub day_change: ValueChange,
    pub gain: ValueChange,
    pub performance: Option<Performance>,
    pub coverage_ratio: Option<Decimal>,
    pub provenance: Option<String>,
    pub metric_run_uuid: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
    pub has_value: bool,
    pub fx_unavailable: bool,
    /// Absent until the positions have been loaded once
    pub positions: Option<Vec<PositionRecord>>,
}

impl PortfolioRecord {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
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

/// A partial portfolio row from a values update.
///
/// `performance` has already been through the strict normalizer: a rejected
/// record shows up here as absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortfolioPatch {
    pub uuid: String,
    pub name: FieldPatch<String>,
    pub position_count: FieldPatch<i64>,
    pub current_value: FieldPatch<Decimal>,
    pub purchase_sum: FieldPatch<Decimal>,
    pub gain_abs: FieldPatch<Decimal>,
    pub gain_pct: FieldPatch<Decimal>,
    pub day_change_abs: FieldPatch<Decimal>,
    pub day_change_pct: FieldPatch<Decimal>,
    pub performance: FieldPatch<Performance>,
    pub coverage_ratio: FieldPatch<Decimal>,
    pub provenance: FieldPatch<String>,
    pub metric_run_uuid: FieldPatch<String>,
    pub generated_at: FieldPatch<DateTime<Utc>>,
    pub has_current_value: Option<bool>,
    pub fx_unavailable: Option<bool>,
}

impl PortfolioPatch {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            ..Self::default()
        }
    }

    /// Whether the update says anything about provenance.
    pub fn carries_diagnostics(&self) -> bool {
        self.coverage_ratio.is_some()
            || self.provenance.is_some()
            || self.metric_run_uuid.is_some()
            || self.generated_at.is_some()
    }
}
