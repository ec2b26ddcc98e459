//! Portfolios module - portfolio rows and their field-by-field upsert.

mod portfolios_merge;
mod portfolios_model;

pub use portfolios_merge::upsert_portfolio;
pub use portfolios_model::{PortfolioPatch, PortfolioRecord, ValueChange};
