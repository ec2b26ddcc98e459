//! Field-preserving merge of partial position updates onto cached positions.
//!
//! Rules, per field:
//! - absent in the update: the cached value survives
//! - explicit null: the cached value is cleared
//! - value: overwrites
//!
//! Structured sub-records (`performance`, `aggregation`, `average_cost`,
//! `data_state`) supplied as objects are overlaid key-by-key onto the prior
//! sub-record, so a delta carrying only `gain_abs` keeps the cached
//! `gain_pct`/`total_change_pct`. A structured field sent as null replaces
//! the sub-record outright.

use std::collections::HashMap;

use log::debug;

use super::positions_model::{
    Aggregation, AggregationPatch, AverageCost, AverageCostPatch, DayChange, DayChangePatch,
    Performance, PerformancePatch, PositionPatch, PositionRecord,
};
use crate::patch::{apply_field, apply_field_or_default, merge_json, merge_structured};

/// Merges one partial position onto its cached predecessor.
///
/// Merging the same patch twice yields the same record as merging it once.
pub fn merge_position(previous: Option<&PositionRecord>, incoming: &PositionPatch) -> PositionRecord {
    let mut merged = previous
        .cloned()
        .unwrap_or_else(|| PositionRecord::new(incoming.security_uuid.clone()));
    merged.security_uuid = incoming.security_uuid.clone();

    apply_field(&mut merged.name, &incoming.name);
    apply_field(&mut merged.current_holdings, &incoming.current_holdings);
    apply_field(&mut merged.purchase_value, &incoming.purchase_value);
    apply_field(&mut merged.current_value, &incoming.current_value);
    apply_field(&mut merged.currency_code, &incoming.currency_code);
    apply_field(&mut merged.ticker, &incoming.ticker);
    apply_field(&mut merged.provenance, &incoming.provenance);
    apply_field(&mut merged.metric_run_uuid, &incoming.metric_run_uuid);

    merge_structured(&mut merged.performance, &incoming.performance, overlay_performance);
    merge_structured(&mut merged.aggregation, &incoming.aggregation, overlay_aggregation);
    merge_structured(&mut merged.average_cost, &incoming.average_cost, overlay_average_cost);
    merge_data_state(&mut merged, incoming);

    merged
}

/// Merges an authoritative position list onto the cached one.
///
/// The result follows `incoming` order and membership: cached positions the
/// update no longer lists are dropped. A security listed twice is merged
/// into its first slot.
pub fn merge_positions(previous: &[PositionRecord], incoming: &[PositionPatch]) -> Vec<PositionRecord> {
    let cached: HashMap<&str, &PositionRecord> = previous
        .iter()
        .map(|position| (position.security_uuid.as_str(), position))
        .collect();

    let mut merged: Vec<PositionRecord> = Vec::with_capacity(incoming.len());
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(incoming.len());

    for patch in incoming {
        match slots.get(&patch.security_uuid) {
            Some(&slot) => {
                debug!(
                    "Security {} listed twice in one update, merging into first entry",
                    patch.security_uuid
                );
                merged[slot] = merge_position(Some(&merged[slot]), patch);
            }
            None => {
                let previous = cached.get(patch.security_uuid.as_str()).copied();
                slots.insert(patch.security_uuid.clone(), merged.len());
                merged.push(merge_position(previous, patch));
            }
        }
    }

    let dropped = previous.len().saturating_sub(
        previous
            .iter()
            .filter(|position| slots.contains_key(&position.security_uuid))
            .count(),
    );
    if dropped > 0 {
        debug!("Dropped {} positions no longer listed by the update", dropped);
    }

    merged
}

fn overlay_performance(target: &mut Performance, patch: &PerformancePatch) {
    apply_field(&mut target.gain_abs, &patch.gain_abs);
    apply_field(&mut target.gain_pct, &patch.gain_pct);
    apply_field(&mut target.total_change_eur, &patch.total_change_eur);
    apply_field(&mut target.total_change_pct, &patch.total_change_pct);
    apply_field(&mut target.source, &patch.source);
    apply_field(&mut target.coverage_ratio, &patch.coverage_ratio);
    merge_structured(&mut target.day_change, &patch.day_change, overlay_day_change);
}

fn overlay_day_change(target: &mut DayChange, patch: &DayChangePatch) {
    apply_field(&mut target.price_change_native, &patch.price_change_native);
    apply_field(&mut target.price_change_eur, &patch.price_change_eur);
    apply_field(&mut target.change_pct, &patch.change_pct);
    apply_field(&mut target.source, &patch.source);
    apply_field(&mut target.coverage_ratio, &patch.coverage_ratio);
}

fn overlay_aggregation(target: &mut Aggregation, patch: &AggregationPatch) {
    apply_field_or_default(&mut target.total_holdings, &patch.total_holdings);
    apply_field_or_default(&mut target.positive_holdings, &patch.positive_holdings);
    apply_field_or_default(&mut target.purchase_value_cents, &patch.purchase_value_cents);
    apply_field_or_default(&mut target.purchase_value_eur, &patch.purchase_value_eur);
    apply_field_or_default(&mut target.security_currency_total, &patch.security_currency_total);
    apply_field_or_default(&mut target.account_currency_total, &patch.account_currency_total);
}

fn overlay_average_cost(target: &mut AverageCost, patch: &AverageCostPatch) {
    apply_field(&mut target.native, &patch.native);
    apply_field(&mut target.security, &patch.security);
    apply_field(&mut target.account, &patch.account);
    apply_field(&mut target.eur, &patch.eur);
    if let Some(source) = patch.source {
        target.source = source;
    }
    apply_field(&mut target.coverage_ratio, &patch.coverage_ratio);
}

fn merge_data_state(merged: &mut PositionRecord, incoming: &PositionPatch) {
    match &incoming.data_state {
        None => {}
        Some(None) => merged.data_state = None,
        Some(Some(state)) => match merged.data_state.as_mut() {
            Some(existing) => merge_json(existing, state),
            None => merged.data_state = Some(state.clone()),
        },
    }
}
