use log::warn;
use rust_decimal::Decimal;

use super::footer_model::{FooterRow, FooterTotals};
use crate::constants::PERCENT_SCALE;

/// Derives the footer row from the current portfolio rows.
///
/// Position counts are summed over every row. Value, gain, purchase and
/// day-change figures are summed over rows flagged `has_value` only, and
/// are reported as `None` as soon as one row is not valued. A sum that
/// leaves the `Decimal` range is treated the same way.
///
/// `gain_pct` is derived, never summed:
/// `sum(gain_abs) / sum(purchase_value) * 100` when the purchase sum is
/// positive, else `gain_abs / (current_value - gain_abs) * 100`, else `None`.
pub fn recompute_footer(rows: &[FooterRow]) -> FooterTotals {
    let mut position_count = 0i64;
    let mut sums = Some(RowSums::default());
    let mut valued_rows = 0usize;
    let mut incomplete = false;

    for row in rows {
        position_count = position_count.saturating_add(row.position_count);
        if !row.has_value {
            incomplete = true;
            continue;
        }
        valued_rows += 1;
        sums = sums.and_then(|acc| acc.plus_row(row));
    }

    let sums = match sums {
        Some(sums) if !incomplete => sums,
        blanked => {
            if blanked.is_none() {
                warn!("Footer totals overflowed over {} rows", rows.len());
            }
            return FooterTotals {
                position_count,
                incomplete: true,
                valued_rows,
                total_rows: rows.len(),
                ..FooterTotals::default()
            };
        }
    };

    FooterTotals {
        position_count,
        current_value: Some(sums.current_value),
        purchase_value: Some(sums.purchase_value),
        gain_abs: Some(sums.gain_abs),
        gain_pct: derive_gain_pct(sums.gain_abs, sums.purchase_value, sums.current_value),
        day_change_abs: Some(sums.day_change_abs),
        day_change_pct: sums
            .current_value
            .checked_sub(sums.day_change_abs)
            .and_then(|base| percent_of(sums.day_change_abs, base)),
        incomplete,
        valued_rows,
        total_rows: rows.len(),
    }
}

#[derive(Default)]
struct RowSums {
    current_value: Decimal,
    purchase_value: Decimal,
    gain_abs: Decimal,
    day_change_abs: Decimal,
}

impl RowSums {
    fn plus_row(self, row: &FooterRow) -> Option<Self> {
        let plus = |total: Decimal, value: Option<Decimal>| total.checked_add(value.unwrap_or_default());
        Some(Self {
            current_value: plus(self.current_value, row.current_value)?,
            purchase_value: plus(self.purchase_value, row.purchase_value)?,
            gain_abs: plus(self.gain_abs, row.gain_abs)?,
            day_change_abs: plus(self.day_change_abs, row.day_change_abs)?,
        })
    }
}

fn derive_gain_pct(gain_abs: Decimal, purchase_value: Decimal, current_value: Decimal) -> Option<Decimal> {
    if purchase_value > Decimal::ZERO {
        return percent_of(gain_abs, purchase_value);
    }
    current_value
        .checked_sub(gain_abs)
        .and_then(|base| percent_of(gain_abs, base))
}

fn percent_of(part: Decimal, base: Decimal) -> Option<Decimal> {
    if base.is_zero() {
        return None;
    }
    part.checked_div(base)
        .and_then(|ratio| ratio.checked_mul(Decimal::from(PERCENT_SCALE)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valued(current: Decimal, gain: Decimal, purchase: Decimal) -> FooterRow {
        FooterRow {
            has_value: true,
            position_count: 2,
            current_value: Some(current),
            purchase_value: Some(purchase),
            gain_abs: Some(gain),
            day_change_abs: None,
        }
    }

    #[test]
    fn test_incomplete_row_blanks_totals() {
        let rows = vec![
            valued(dec!(100), dec!(10), dec!(90)),
            FooterRow {
                position_count: 5,
                ..FooterRow::default()
            },
        ];
        let totals = recompute_footer(&rows);
        assert!(totals.incomplete);
        assert_eq!(totals.current_value, None);
        assert_eq!(totals.gain_pct, None);
        assert_eq!(totals.position_count, 7);
        assert_eq!(totals.valued_rows, 1);
        assert_eq!(totals.total_rows, 2);
    }

    #[test]
    fn test_complete_rows_sum_and_derive_pct() {
        let totals = recompute_footer(&[valued(dec!(100), dec!(10), dec!(90))]);
        assert!(!totals.incomplete);
        assert_eq!(totals.current_value, Some(dec!(100)));
        assert_eq!(totals.gain_abs, Some(dec!(10)));
        let pct = totals.gain_pct.unwrap();
        assert!((pct - dec!(11.11)).abs() < dec!(0.01));
    }

    #[test]
    fn test_gain_pct_fallback_without_purchase_sum() {
        let totals = recompute_footer(&[valued(dec!(120), dec!(20), dec!(0))]);
        assert_eq!(totals.gain_pct, Some(dec!(20)));
    }

    #[test]
    fn test_gain_pct_none_when_undefined() {
        let totals = recompute_footer(&[valued(dec!(0), dec!(0), dec!(0))]);
        assert_eq!(totals.gain_pct, None);

        let empty = recompute_footer(&[]);
        assert_eq!(empty.current_value, Some(Decimal::ZERO));
        assert_eq!(empty.gain_pct, None);
        assert!(!empty.incomplete);
    }

    #[test]
    fn test_day_change_pct() {
        let mut row = valued(dec!(110), dec!(0), dec!(100));
        row.day_change_abs = Some(dec!(10));
        let totals = recompute_footer(&[row]);
        assert_eq!(totals.day_change_abs, Some(dec!(10)));
        assert_eq!(totals.day_change_pct, Some(dec!(10)));
    }

    #[test]
    fn test_overflowing_sum_marks_totals_incomplete() {
        let rows = vec![
            valued(Decimal::MAX, dec!(0), dec!(1)),
            valued(Decimal::MAX, dec!(0), dec!(1)),
        ];
        let totals = recompute_footer(&rows);
        assert!(totals.incomplete);
        assert_eq!(totals.current_value, None);
        assert_eq!(totals.gain_pct, None);
        assert_eq!(totals.position_count, 4);
        assert_eq!(totals.valued_rows, 2);
    }

    #[test]
    fn test_fallback_base_out_of_range_gives_no_pct() {
        let mut row = valued(Decimal::MAX, Decimal::MIN, dec!(0));
        row.day_change_abs = Some(Decimal::MIN);
        let totals = recompute_footer(&[row]);
        assert!(!totals.incomplete);
        assert_eq!(totals.gain_pct, None);
        assert_eq!(totals.day_change_pct, None);
    }
}
