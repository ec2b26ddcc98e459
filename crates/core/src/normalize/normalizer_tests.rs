#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::normalize::normalizer::*;
    use crate::positions::AverageCostSource;

    #[test]
    fn test_performance_requires_all_four_figures() {
        let complete = json!({
            "gain_abs": "10,5",
            "gain_pct": 5,
            "total_change_eur": 12,
            "total_change_pct": "6.1",
            "source": "live",
            "coverage_ratio": 0.5,
            "day_change": {"price_change_eur": 1.25, "change_pct": 0.4}
        });
        let performance = normalize_performance(&complete).unwrap();
        assert_eq!(performance.gain_abs, Some(dec!(10.5)));
        assert_eq!(performance.total_change_pct, Some(dec!(6.1)));
        assert_eq!(performance.source.as_deref(), Some("live"));
        assert_eq!(performance.coverage_ratio, Some(dec!(0.5)));
        let day_change = performance.day_change.unwrap();
        assert_eq!(day_change.price_change_eur, Some(dec!(1.25)));
        assert_eq!(day_change.price_change_native, None);

        let partial = json!({"gain_abs": 10, "gain_pct": 5, "total_change_eur": 12});
        assert!(normalize_performance(&partial).is_none());

        let malformed = json!({
            "gain_abs": 10, "gain_pct": "n/a", "total_change_eur": 12, "total_change_pct": 1
        });
        assert!(normalize_performance(&malformed).is_none());
        assert!(normalize_performance(&json!("oops")).is_none());
    }

    #[test]
    fn test_performance_tolerates_bad_optional_parts() {
        let raw = json!({
            "gain_abs": 1, "gain_pct": 2, "total_change_eur": 3, "total_change_pct": 4,
            "coverage_ratio": 7,
            "day_change": {}
        });
        let performance = normalize_performance(&raw).unwrap();
        assert_eq!(performance.coverage_ratio, None);
        assert_eq!(performance.day_change, None);
    }

    #[test]
    fn test_aggregation_defaults_and_rounds_cents() {
        let aggregation = normalize_aggregation(&json!({
            "total_holdings": "12",
            "purchase_value_cents": 1234.5,
            "purchase_value_eur": "bogus"
        }))
        .unwrap();
        assert_eq!(aggregation.total_holdings, dec!(12));
        assert_eq!(aggregation.positive_holdings, dec!(0));
        assert_eq!(aggregation.purchase_value_cents, 1235);
        assert_eq!(aggregation.purchase_value_eur, dec!(0));

        let negative = normalize_aggregation(&json!({"purchase_value_cents": -10.5})).unwrap();
        assert_eq!(negative.purchase_value_cents, -11);

        assert!(normalize_aggregation(&json!(null)).is_none());
    }

    #[test]
    fn test_average_cost_projections_independent() {
        let average_cost = normalize_average_cost(&json!({
            "native": 10,
            "eur": null,
            "account": "x",
            "source": "totals"
        }))
        .unwrap();
        assert_eq!(average_cost.native, Some(dec!(10)));
        assert_eq!(average_cost.eur, None);
        assert_eq!(average_cost.account, None);
        assert_eq!(average_cost.source, AverageCostSource::Totals);

        let unknown = normalize_average_cost(&json!({"source": "magic"})).unwrap();
        assert_eq!(unknown.source, AverageCostSource::Aggregation);
    }

    #[test]
    fn test_position_patch_distinguishes_null_absent_and_invalid() {
        let patch = parse_position_patch(&json!({
            "security_uuid": "sec-1",
            "name": null,
            "current_value": "1.234,56",
            "purchase_value": "not a number",
            "ticker_symbol": "ACME",
            "performance": {"gain_abs": 20},
            "aggregation": "garbage",
            "data_state": {"stale": true}
        }))
        .unwrap();

        assert_eq!(patch.security_uuid, "sec-1");
        assert_eq!(patch.name, Some(None));
        assert_eq!(patch.current_value, Some(Some(dec!(1234.56))));
        assert_eq!(patch.purchase_value, None);
        assert_eq!(patch.current_holdings, None);
        assert_eq!(patch.ticker, Some(Some("ACME".to_string())));

        let performance = patch.performance.unwrap().unwrap();
        assert_eq!(performance.gain_abs, Some(Some(dec!(20))));
        assert_eq!(performance.gain_pct, None);

        assert_eq!(patch.aggregation, Some(None));
        assert_eq!(patch.data_state, Some(Some(json!({"stale": true}))));
        assert_eq!(patch.average_cost, None);
    }

    #[test]
    fn test_position_without_security_uuid_is_skipped() {
        assert!(parse_position_patch(&json!({"name": "Orphan"})).is_none());
        assert!(parse_position_patch(&json!({"security_uuid": "  "})).is_none());
        assert!(parse_position_patch(&json!(42)).is_none());
    }

    #[test]
    fn test_portfolio_patch_uses_strict_performance() {
        let patch = parse_portfolio_patch(&json!({
            "uuid": "pf-1",
            "name": "Depot",
            "count": "3",
            "value": 1000,
            "purchase_sum": 900,
            "performance": {"gain_abs": 100},
            "has_current_value": true
        }))
        .unwrap();
        assert_eq!(patch.position_count, Some(Some(3)));
        assert_eq!(patch.current_value, Some(Some(dec!(1000))));
        assert_eq!(patch.performance, None);
        assert_eq!(patch.has_current_value, Some(true));

        let cleared = parse_portfolio_patch(&json!({"uuid": "pf-1", "performance": null})).unwrap();
        assert_eq!(cleared.performance, Some(None));

        assert!(parse_portfolio_patch(&json!({"name": "no id"})).is_none());
    }

    #[test]
    fn test_parse_account() {
        let account = parse_account(&json!({
            "uuid": "acc-1",
            "name": "Cash",
            "currency_code": "USD",
            "balance": null,
            "orig_balance": "1.000,00",
            "fx_unavailable": true,
            "coverage_ratio": 1,
            "generated_at": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(account.name, "Cash");
        assert_eq!(account.currency.as_deref(), Some("USD"));
        assert_eq!(account.balance, None);
        assert_eq!(account.orig_balance, Some(dec!(1000)));
        assert!(account.fx_unavailable);
        assert_eq!(account.coverage_ratio, Some(dec!(1)));
        assert!(account.generated_at.is_some());

        assert!(parse_account(&json!({"name": "no id"})).is_none());
    }
}
