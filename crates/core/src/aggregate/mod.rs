//! Aggregate module - footer/sum rows with completeness tracking.

mod footer_calculator;
mod footer_model;

pub use footer_calculator::recompute_footer;
pub use footer_model::{FooterRow, FooterTotals};
