use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::portfolios::PortfolioRecord;

/// The slice of a portfolio row that feeds the footer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterRow {
    pub has_value: bool,
    pub position_count: i64,
    pub current_value: Option<Decimal>,
    pub purchase_value: Option<Decimal>,
    pub gain_abs: Option<Decimal>,
    pub day_change_abs: Option<Decimal>,
}

impl From<&PortfolioRecord> for FooterRow {
    fn from(record: &PortfolioRecord) -> Self {
        Self {
            has_value: record.has_value && !record.fx_unavailable,
            position_count: record.position_count,
            current_value: record.current_value,
            purchase_value: record.purchase_sum,
            gain_abs: record.gain.abs,
            day_change_abs: record.day_change.abs,
        }
    }
}

/// Footer/sum row over all portfolios.
///
/// Monetary totals are only reported when every row is valued; a single
/// unvalued row sets `incomplete` and blanks them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterTotals {
    pub position_count: i64,
    pub current_value: Option<Decimal>,
    pub purchase_value: Option<Decimal>,
    pub gain_abs: Option<Decimal>,
    pub gain_pct: Option<Decimal>,
    pub day_change_abs: Option<Decimal>,
    pub day_change_pct: Option<Decimal>,
    pub incomplete: bool,
    /// Rows that contributed to the monetary sums
    pub valued_rows: usize,
    pub total_rows: usize,
}
