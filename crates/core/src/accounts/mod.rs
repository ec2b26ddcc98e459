//! Accounts module - account records and balance totals.

mod accounts_model;
mod accounts_totals;

pub use accounts_model::{AccountRecord, AccountTotals};
pub use accounts_totals::recompute_account_totals;
