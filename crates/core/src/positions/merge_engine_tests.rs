#[cfg(test)]
mod tests {
    use crate::positions::merge_engine::{merge_position, merge_positions};
    use crate::positions::positions_model::{
        Aggregation, AggregationPatch, AverageCost, AverageCostPatch, AverageCostSource,
        DayChange, DayChangePatch, Performance, PerformancePatch, PositionPatch, PositionRecord,
    };
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn cached_position(security_uuid: &str) -> PositionRecord {
        PositionRecord {
            security_uuid: security_uuid.to_string(),
            name: Some("ACME Corp".to_string()),
            current_holdings: Some(dec!(10)),
            purchase_value: Some(dec!(900)),
            current_value: Some(dec!(1000)),
            currency_code: Some("EUR".to_string()),
            ticker: Some("ACM".to_string()),
            average_cost: Some(AverageCost {
                native: Some(dec!(90)),
                security: Some(dec!(90)),
                account: Some(dec!(90)),
                eur: Some(dec!(90)),
                source: AverageCostSource::Totals,
                coverage_ratio: Some(dec!(1)),
            }),
            performance: Some(Performance {
                gain_abs: Some(dec!(10)),
                gain_pct: Some(dec!(5)),
                total_change_eur: Some(dec!(100)),
                total_change_pct: Some(dec!(11.11)),
                source: Some("calculated".to_string()),
                coverage_ratio: Some(dec!(1)),
                day_change: Some(DayChange {
                    price_change_native: Some(dec!(1.5)),
                    price_change_eur: Some(dec!(1.5)),
                    change_pct: Some(dec!(0.15)),
                    source: Some("native".to_string()),
                    coverage_ratio: Some(dec!(1)),
                }),
            }),
            aggregation: Some(Aggregation {
                total_holdings: dec!(10),
                positive_holdings: dec!(10),
                purchase_value_cents: 90000,
                purchase_value_eur: dec!(900),
                security_currency_total: dec!(900),
                account_currency_total: dec!(900),
            }),
            data_state: Some(json!({"status": "ok", "flags": {"stale": false}})),
            provenance: Some("metrics".to_string()),
            metric_run_uuid: Some("run-1".to_string()),
        }
    }

    #[test]
    fn test_merge_into_empty_shell() {
        let mut patch = PositionPatch::new("sec-1");
        patch.name = Some(Some("New".to_string()));
        patch.current_value = Some(Some(dec!(5)));

        let merged = merge_position(None, &patch);
        assert_eq!(merged.security_uuid, "sec-1");
        assert_eq!(merged.name.as_deref(), Some("New"));
        assert_eq!(merged.current_value, Some(dec!(5)));
        assert_eq!(merged.performance, None);
    }

    #[test]
    fn test_absent_fields_are_preserved() {
        let previous = cached_position("sec-1");
        let mut patch = PositionPatch::new("sec-1");
        patch.current_value = Some(Some(dec!(1100)));

        let merged = merge_position(Some(&previous), &patch);
        assert_eq!(merged.current_value, Some(dec!(1100)));
        assert_eq!(merged.name, previous.name);
        assert_eq!(merged.ticker, previous.ticker);
        assert_eq!(merged.performance, previous.performance);
        assert_eq!(merged.aggregation, previous.aggregation);
        assert_eq!(merged.metric_run_uuid, previous.metric_run_uuid);
    }

    #[test]
    fn test_explicit_null_clears_field() {
        let previous = cached_position("sec-1");
        let mut patch = PositionPatch::new("sec-1");
        patch.ticker = Some(None);
        patch.performance = Some(None);

        let merged = merge_position(Some(&previous), &patch);
        assert_eq!(merged.ticker, None);
        assert_eq!(merged.performance, None);
        assert_eq!(merged.name, previous.name);
    }

    #[test]
    fn test_performance_backfills_percentages() {
        let previous = PositionRecord {
            performance: Some(Performance {
                gain_abs: Some(dec!(10)),
                gain_pct: Some(dec!(5)),
                ..Performance::default()
            }),
            ..PositionRecord::new("sec-1")
        };
        let mut patch = PositionPatch::new("sec-1");
        patch.performance = Some(Some(PerformancePatch {
            gain_abs: Some(Some(dec!(20))),
            ..PerformancePatch::default()
        }));

        let merged = merge_position(Some(&previous), &patch);
        let performance = merged.performance.unwrap();
        assert_eq!(performance.gain_abs, Some(dec!(20)));
        assert_eq!(performance.gain_pct, Some(dec!(5)));
    }

    #[test]
    fn test_nested_day_change_overlay() {
        let previous = cached_position("sec-1");
        let mut patch = PositionPatch::new("sec-1");
        patch.performance = Some(Some(PerformancePatch {
            day_change: Some(Some(DayChangePatch {
                price_change_eur: Some(Some(dec!(-2))),
                ..DayChangePatch::default()
            })),
            ..PerformancePatch::default()
        }));

        let merged = merge_position(Some(&previous), &patch);
        let day_change = merged.performance.unwrap().day_change.unwrap();
        assert_eq!(day_change.price_change_eur, Some(dec!(-2)));
        assert_eq!(day_change.change_pct, Some(dec!(0.15)));
        assert_eq!(day_change.price_change_native, Some(dec!(1.5)));
    }

    #[test]
    fn test_aggregation_null_resets_to_zero() {
        let previous = cached_position("sec-1");
        let mut patch = PositionPatch::new("sec-1");
        patch.aggregation = Some(Some(AggregationPatch {
            total_holdings: Some(Some(dec!(12))),
            purchase_value_cents: Some(None),
            ..AggregationPatch::default()
        }));

        let aggregation = merge_position(Some(&previous), &patch).aggregation.unwrap();
        assert_eq!(aggregation.total_holdings, dec!(12));
        assert_eq!(aggregation.purchase_value_cents, 0);
        assert_eq!(aggregation.purchase_value_eur, dec!(900));
    }

    #[test]
    fn test_average_cost_source_only_changes_when_sent() {
        let previous = cached_position("sec-1");
        let mut patch = PositionPatch::new("sec-1");
        patch.average_cost = Some(Some(AverageCostPatch {
            eur: Some(Some(dec!(91))),
            ..AverageCostPatch::default()
        }));

        let average_cost = merge_position(Some(&previous), &patch).average_cost.unwrap();
        assert_eq!(average_cost.eur, Some(dec!(91)));
        assert_eq!(average_cost.source, AverageCostSource::Totals);
    }

    #[test]
    fn test_data_state_deep_merge_and_replace() {
        let previous = cached_position("sec-1");
        let mut patch = PositionPatch::new("sec-1");
        patch.data_state = Some(Some(json!({"flags": {"stale": true}})));

        let merged = merge_position(Some(&previous), &patch);
        assert_eq!(
            merged.data_state,
            Some(json!({"status": "ok", "flags": {"stale": true}}))
        );

        patch.data_state = Some(Some(json!("frozen")));
        let replaced = merge_position(Some(&merged), &patch);
        assert_eq!(replaced.data_state, Some(json!("frozen")));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let previous = cached_position("sec-1");
        let mut patch = PositionPatch::new("sec-1");
        patch.current_value = Some(Some(dec!(1200)));
        patch.provenance = Some(None);
        patch.performance = Some(Some(PerformancePatch {
            gain_abs: Some(Some(dec!(300))),
            day_change: Some(None),
            ..PerformancePatch::default()
        }));
        patch.data_state = Some(Some(json!({"flags": {"new": 1}})));

        let once = merge_position(Some(&previous), &patch);
        let twice = merge_position(Some(&once), &patch);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_positions_follows_incoming_membership_and_order() {
        let previous = vec![
            cached_position("a"),
            cached_position("b"),
            cached_position("c"),
        ];
        let incoming = vec![
            PositionPatch::new("c"),
            PositionPatch::new("a"),
            PositionPatch::new("d"),
        ];

        let merged = merge_positions(&previous, &incoming);
        let order: Vec<&str> = merged.iter().map(|p| p.security_uuid.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "d"]);
        assert_eq!(merged[0].name.as_deref(), Some("ACME Corp"));
        assert_eq!(merged[2].name, None);
    }

    #[test]
    fn test_merge_positions_collapses_duplicates() {
        let mut first = PositionPatch::new("a");
        first.name = Some(Some("First".to_string()));
        let mut second = PositionPatch::new("a");
        second.current_value = Some(Some(dec!(3)));

        let merged = merge_positions(&[], &[first, second]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name.as_deref(), Some("First"));
        assert_eq!(merged[0].current_value, Some(dec!(3)));
    }
}
