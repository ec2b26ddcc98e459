//! Position domain models: cached records and the partial updates merged onto them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patch::FieldPatch;

/// Where an average-cost figure was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum AverageCostSource {
    /// Per-lot aggregation of purchases
    #[default]
    Aggregation,
    /// Portfolio totals
    Totals,
    /// EUR-denominated totals
    EurTotal,
}

impl AverageCostSource {
    /// Parses a raw source tag; anything unknown falls back to `Aggregation`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "totals" => AverageCostSource::Totals,
            "eur_total" => AverageCostSource::EurTotal,
            _ => AverageCostSource::Aggregation,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AverageCostSource::Aggregation => "aggregation",
            AverageCostSource::Totals => "totals",
            AverageCostSource::EurTotal => "eur_total",
        }
    }
}

impl From<String> for AverageCostSource {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

/// Average purchase cost projected into each currency.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AverageCost {
    pub native: Option<Decimal>,
    pub security: Option<Decimal>,
    pub account: Option<Decimal>,
    pub eur: Option<Decimal>,
    pub source: AverageCostSource,
    pub coverage_ratio: Option<Decimal>,
}

/// Intraday price movement.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DayChange {
    pub price_change_native: Option<Decimal>,
    pub price_change_eur: Option<Decimal>,
    pub change_pct: Option<Decimal>,
    pub source: Option<String>,
    pub coverage_ratio: Option<Decimal>,
}

/// Gain and change metrics.
///
/// The strict normalizer only produces this with all four headline figures
/// set; records built up from position deltas may be sparser.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Performance {
    pub gain_abs: Option<Decimal>,
    pub gain_pct: Option<Decimal>,
    pub total_change_eur: Option<Decimal>,
    pub total_change_pct: Option<Decimal>,
    pub source: Option<String>,
    pub coverage_ratio: Option<Decimal>,
    pub day_change: Option<DayChange>,
}

/// Holdings and purchase totals aggregated over lots. Missing figures are zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Aggregation {
    pub total_holdings: Decimal,
    pub positive_holdings: Decimal,
    pub purchase_value_cents: i64,
    pub purchase_value_eur: Decimal,
    pub security_currency_total: Decimal,
    pub account_currency_total: Decimal,
}

/// A cached position within a portfolio, identified by `security_uuid`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionRecord {
    pub security_uuid: String,
    pub name: Option<String>,
    pub current_holdings: Option<Decimal>,
    pub purchase_value: Option<Decimal>,
    pub current_value: Option<Decimal>,
    pub currency_code: Option<String>,
    pub ticker: Option<String>,
    pub average_cost: Option<AverageCost>,
    pub performance: Option<Performance>,
    pub aggregation: Option<Aggregation>,
    /// Opaque passthrough, deep-merged
    pub data_state: Option<Value>,
    pub provenance: Option<String>,
    pub metric_run_uuid: Option<String>,
}

impl PositionRecord {
    /// Empty shell for a security seen for the first time.
    pub fn new(security_uuid: impl Into<String>) -> Self {
        Self {
            security_uuid: security_uuid.into(),
            ..Self::default()
        }
    }
}

// =============================================================================
// Patches
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AverageCostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub native: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub security: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub account: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub eur: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<AverageCostSource>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub coverage_ratio: FieldPatch<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DayChangePatch {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub price_change_native: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub price_change_eur: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub change_pct: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub source: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub coverage_ratio: FieldPatch<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformancePatch {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub gain_abs: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub gain_pct: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub total_change_eur: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub total_change_pct: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub source: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub coverage_ratio: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub day_change: FieldPatch<DayChangePatch>,
}

/// Aggregation delta. Explicit nulls reset a figure to zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub total_holdings: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub positive_holdings: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub purchase_value_cents: FieldPatch<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub purchase_value_eur: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub security_currency_total: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub account_currency_total: FieldPatch<Decimal>,
}

/// A partial position as carried by a positions message.
///
/// Also the shape of pre-normalized payloads, which deserialize directly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionPatch {
    pub security_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub name: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub current_holdings: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub purchase_value: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub current_value: FieldPatch<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub currency_code: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub ticker: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub average_cost: FieldPatch<AverageCostPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub performance: FieldPatch<PerformancePatch>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub aggregation: FieldPatch<AggregationPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub data_state: FieldPatch<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub provenance: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub metric_run_uuid: FieldPatch<String>,
}

impl PositionPatch {
    pub fn new(security_uuid: impl Into<String>) -> Self {
        Self {
            security_uuid: security_uuid.into(),
            ..Self::default()
        }
    }
}
