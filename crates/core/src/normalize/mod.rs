//! Raw fragment normalization.

mod normalizer;

#[cfg(test)]
mod normalizer_tests;

pub use normalizer::{
    normalize_aggregation, normalize_average_cost, normalize_day_change, normalize_performance,
    parse_account, parse_portfolio_patch, parse_position_patch,
};
