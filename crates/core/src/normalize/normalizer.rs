//! Builds typed records and patches from raw message fragments.
//!
//! Sub-records differ in how they treat missing input:
//! - performance: all-or-nothing, a partially consistent record is worse than none
//! - aggregation: best-effort, missing figures are zero
//! - average cost: each projection independently nullable

use log::debug;
use num_traits::ToPrimitive;
use serde_json::{Map, Value};

use crate::accounts::AccountRecord;
use crate::patch::{read_field, read_field_any, FieldPatch};
use crate::portfolios::PortfolioPatch;
use crate::positions::{
    Aggregation, AggregationPatch, AverageCost, AverageCostPatch, AverageCostSource, DayChange,
    DayChangePatch, Performance, PerformancePatch, PositionPatch,
};
use crate::utils::{
    coerce_bool, coerce_count, coerce_number, coerce_optional_string, coerce_ratio,
    coerce_timestamp,
};

// =============================================================================
// Canonical sub-records
// =============================================================================

/// Builds a complete performance record.
///
/// Requires `gain_abs`, `gain_pct`, `total_change_eur` and `total_change_pct`
/// to coerce; otherwise the whole record is rejected.
pub fn normalize_performance(raw: &Value) -> Option<Performance> {
    let object = raw.as_object()?;
    let number = |key: &str| object.get(key).and_then(coerce_number);

    let gain_abs = number("gain_abs");
    let gain_pct = number("gain_pct");
    let total_change_eur = number("total_change_eur");
    let total_change_pct = number("total_change_pct");
    if gain_abs.is_none() || gain_pct.is_none() || total_change_eur.is_none() || total_change_pct.is_none()
    {
        debug!("Rejecting incomplete performance record");
        return None;
    }

    Some(Performance {
        gain_abs,
        gain_pct,
        total_change_eur,
        total_change_pct,
        source: object.get("source").and_then(coerce_optional_string),
        coverage_ratio: object.get("coverage_ratio").and_then(coerce_ratio),
        day_change: object.get("day_change").and_then(normalize_day_change),
    })
}

/// Builds a day-change record; `None` unless at least one field coerces.
pub fn normalize_day_change(raw: &Value) -> Option<DayChange> {
    let object = raw.as_object()?;
    let day_change = DayChange {
        price_change_native: object.get("price_change_native").and_then(coerce_number),
        price_change_eur: object.get("price_change_eur").and_then(coerce_number),
        change_pct: object.get("change_pct").and_then(coerce_number),
        source: object.get("source").and_then(coerce_optional_string),
        coverage_ratio: object.get("coverage_ratio").and_then(coerce_ratio),
    };
    (day_change != DayChange::default()).then_some(day_change)
}

/// Builds an aggregation record, defaulting missing figures to zero.
pub fn normalize_aggregation(raw: &Value) -> Option<Aggregation> {
    let object = raw.as_object()?;
    let number = |key: &str| object.get(key).and_then(coerce_number).unwrap_or_default();
    Some(Aggregation {
        total_holdings: number("total_holdings"),
        positive_holdings: number("positive_holdings"),
        purchase_value_cents: object
            .get("purchase_value_cents")
            .and_then(coerce_cents)
            .unwrap_or_default(),
        purchase_value_eur: number("purchase_value_eur"),
        security_currency_total: number("security_currency_total"),
        account_currency_total: number("account_currency_total"),
    })
}

/// Builds an average-cost record. Unknown sources fall back to `aggregation`.
pub fn normalize_average_cost(raw: &Value) -> Option<AverageCost> {
    let object = raw.as_object()?;
    Some(AverageCost {
        native: object.get("native").and_then(coerce_number),
        security: object.get("security").and_then(coerce_number),
        account: object.get("account").and_then(coerce_number),
        eur: object.get("eur").and_then(coerce_number),
        source: object
            .get("source")
            .and_then(Value::as_str)
            .map(AverageCostSource::parse)
            .unwrap_or_default(),
        coverage_ratio: object.get("coverage_ratio").and_then(coerce_ratio),
    })
}

fn coerce_cents(value: &Value) -> Option<i64> {
    coerce_number(value).and_then(|cents| {
        cents
            .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    })
}

// =============================================================================
// Patches
// =============================================================================

/// Reads a structured field as a patch. Objects become overlays; null and
/// any other non-object value replace the sub-record outright.
fn read_structured<P>(
    object: &Map<String, Value>,
    key: &str,
    parse: impl Fn(&Map<String, Value>) -> P,
) -> FieldPatch<P> {
    match object.get(key)? {
        Value::Object(inner) => Some(Some(parse(inner))),
        Value::Null => Some(None),
        other => {
            debug!("Structured field '{}' sent as non-object {}, clearing", key, other);
            Some(None)
        }
    }
}

fn parse_day_change_patch(object: &Map<String, Value>) -> DayChangePatch {
    DayChangePatch {
        price_change_native: read_field(object, "price_change_native", coerce_number),
        price_change_eur: read_field(object, "price_change_eur", coerce_number),
        change_pct: read_field(object, "change_pct", coerce_number),
        source: read_field(object, "source", coerce_optional_string),
        coverage_ratio: read_field(object, "coverage_ratio", coerce_ratio),
    }
}

fn parse_performance_patch(object: &Map<String, Value>) -> PerformancePatch {
    PerformancePatch {
        gain_abs: read_field(object, "gain_abs", coerce_number),
        gain_pct: read_field(object, "gain_pct", coerce_number),
        total_change_eur: read_field(object, "total_change_eur", coerce_number),
        total_change_pct: read_field(object, "total_change_pct", coerce_number),
        source: read_field(object, "source", coerce_optional_string),
        coverage_ratio: read_field(object, "coverage_ratio", coerce_ratio),
        day_change: read_structured(object, "day_change", parse_day_change_patch),
    }
}

fn parse_aggregation_patch(object: &Map<String, Value>) -> AggregationPatch {
    AggregationPatch {
        total_holdings: read_field(object, "total_holdings", coerce_number),
        positive_holdings: read_field(object, "positive_holdings", coerce_number),
        purchase_value_cents: read_field(object, "purchase_value_cents", coerce_cents),
        purchase_value_eur: read_field(object, "purchase_value_eur", coerce_number),
        security_currency_total: read_field(object, "security_currency_total", coerce_number),
        account_currency_total: read_field(object, "account_currency_total", coerce_number),
    }
}

fn parse_average_cost_patch(object: &Map<String, Value>) -> AverageCostPatch {
    AverageCostPatch {
        native: read_field(object, "native", coerce_number),
        security: read_field(object, "security", coerce_number),
        account: read_field(object, "account", coerce_number),
        eur: read_field(object, "eur", coerce_number),
        source: object
            .get("source")
            .map(|raw| raw.as_str().map(AverageCostSource::parse).unwrap_or_default()),
        coverage_ratio: read_field(object, "coverage_ratio", coerce_ratio),
    }
}

/// Parses one raw position. Positions without a `security_uuid` are skipped.
pub fn parse_position_patch(raw: &Value) -> Option<PositionPatch> {
    let object = raw.as_object()?;
    let Some(security_uuid) = object.get("security_uuid").and_then(coerce_optional_string) else {
        debug!("Skipping position without security_uuid");
        return None;
    };

    Some(PositionPatch {
        security_uuid,
        name: read_field(object, "name", coerce_optional_string),
        current_holdings: read_field(object, "current_holdings", coerce_number),
        purchase_value: read_field(object, "purchase_value", coerce_number),
        current_value: read_field(object, "current_value", coerce_number),
        currency_code: read_field_any(object, &["currency_code", "currency"], coerce_optional_string),
        ticker: read_field_any(object, &["ticker", "ticker_symbol"], coerce_optional_string),
        average_cost: read_structured(object, "average_cost", parse_average_cost_patch),
        performance: read_structured(object, "performance", parse_performance_patch),
        aggregation: read_structured(object, "aggregation", parse_aggregation_patch),
        data_state: object.get("data_state").map(|state| match state {
            Value::Null => None,
            other => Some(other.clone()),
        }),
        provenance: read_field(object, "provenance", coerce_optional_string),
        metric_run_uuid: read_field(object, "metric_run_uuid", coerce_optional_string),
    })
}

/// Parses one raw portfolio row. Rows without a `uuid` are skipped.
pub fn parse_portfolio_patch(raw: &Value) -> Option<PortfolioPatch> {
    let object = raw.as_object()?;
    let Some(uuid) = object.get("uuid").and_then(coerce_optional_string) else {
        debug!("Skipping portfolio row without uuid");
        return None;
    };

    let performance = match object.get("performance") {
        None => None,
        Some(Value::Null) => Some(None),
        Some(raw_performance) => normalize_performance(raw_performance).map(Some),
    };

    Some(PortfolioPatch {
        uuid,
        name: read_field(object, "name", coerce_optional_string),
        position_count: read_field_any(object, &["position_count", "count"], coerce_count),
        current_value: read_field_any(object, &["current_value", "value"], coerce_number),
        purchase_sum: read_field_any(object, &["purchase_sum", "purchase_value"], coerce_number),
        gain_abs: read_field(object, "gain_abs", coerce_number),
        gain_pct: read_field(object, "gain_pct", coerce_number),
        day_change_abs: read_field(object, "day_change_abs", coerce_number),
        day_change_pct: read_field(object, "day_change_pct", coerce_number),
        performance,
        coverage_ratio: read_field(object, "coverage_ratio", coerce_ratio),
        provenance: read_field(object, "provenance", coerce_optional_string),
        metric_run_uuid: read_field(object, "metric_run_uuid", coerce_optional_string),
        generated_at: read_field(object, "generated_at", coerce_timestamp),
        has_current_value: object.get("has_current_value").and_then(coerce_bool),
        fx_unavailable: object.get("fx_unavailable").and_then(coerce_bool),
    })
}

/// Parses one raw account. Accounts without a `uuid` are skipped.
pub fn parse_account(raw: &Value) -> Option<AccountRecord> {
    let object = raw.as_object()?;
    let Some(uuid) = object.get("uuid").and_then(coerce_optional_string) else {
        debug!("Skipping account without uuid");
        return None;
    };
    let number = |key: &str| object.get(key).and_then(coerce_number);
    let text = |key: &str| object.get(key).and_then(coerce_optional_string);

    Some(AccountRecord {
        uuid,
        name: text("name").unwrap_or_default(),
        currency: text("currency_code").or_else(|| text("currency")),
        balance: number("balance"),
        orig_balance: number("orig_balance"),
        orig_currency: text("orig_currency"),
        fx_rate: number("fx_rate"),
        fx_rate_timestamp: object.get("fx_rate_timestamp").and_then(coerce_timestamp),
        fx_unavailable: object
            .get("fx_unavailable")
            .and_then(coerce_bool)
            .unwrap_or(false),
        coverage_ratio: object.get("coverage_ratio").and_then(coerce_ratio),
        provenance: text("provenance"),
        metric_run_uuid: text("metric_run_uuid"),
        generated_at: object.get("generated_at").and_then(coerce_timestamp),
    })
}
