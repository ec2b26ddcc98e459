use super::portfolios_model::{PortfolioPatch, PortfolioRecord};
use crate::patch::{apply_field, apply_field_or_default};

/// Upserts a partial portfolio row onto its cached predecessor.
///
/// Absent fields survive, explicit nulls clear. Cached positions are never
/// touched by a values update. When the update carries a complete
/// performance record, `gain` and `day_change` are taken from it; otherwise
/// the flat `gain_*`/`day_change_*` fields apply.
pub fn upsert_portfolio(previous: Option<&PortfolioRecord>, incoming: &PortfolioPatch) -> PortfolioRecord {
    let mut merged = previous
        .cloned()
        .unwrap_or_else(|| PortfolioRecord::new(incoming.uuid.clone()));

    apply_field(&mut merged.name, &incoming.name);
    apply_field_or_default(&mut merged.position_count, &incoming.position_count);
    apply_field(&mut merged.current_value, &incoming.current_value);
    apply_field(&mut merged.purchase_sum, &incoming.purchase_sum);
    apply_field(&mut merged.coverage_ratio, &incoming.coverage_ratio);
    apply_field(&mut merged.provenance, &incoming.provenance);
    apply_field(&mut merged.metric_run_uuid, &incoming.metric_run_uuid);
    apply_field(&mut merged.generated_at, &incoming.generated_at);

    apply_field(&mut merged.gain.abs, &incoming.gain_abs);
    apply_field(&mut merged.gain.pct, &incoming.gain_pct);
    apply_field(&mut merged.day_change.abs, &incoming.day_change_abs);
    apply_field(&mut merged.day_change.pct, &incoming.day_change_pct);

    apply_field(&mut merged.performance, &incoming.performance);
    if let Some(Some(performance)) = &incoming.performance {
        merged.gain.abs = performance.gain_abs;
        merged.gain.pct = performance.gain_pct;
        if let Some(day_change) = &performance.day_change {
            merged.day_change.abs = day_change.price_change_eur;
            merged.day_change.pct = day_change.change_pct;
        }
    }

    match incoming.has_current_value {
        Some(flag) => merged.has_value = flag,
        None if incoming.current_value.is_some() => {
            merged.has_value = merged.current_value.is_some();
        }
        None => {}
    }
    if let Some(flag) = incoming.fx_unavailable {
        merged.fx_unavailable = flag;
    }

    merged
}
