use log::{debug, warn};
use rust_decimal::Decimal;

use super::accounts_model::{AccountRecord, AccountTotals};

/// Sums balances over accounts that have a converted balance.
///
/// An account without one (or flagged `fx_unavailable`) marks the totals
/// incomplete, and incomplete totals carry no balance. So does a sum that
/// leaves the `Decimal` range.
pub fn recompute_account_totals(accounts: &[AccountRecord]) -> AccountTotals {
    let mut balance = Some(Decimal::ZERO);
    let mut incomplete = false;

    for account in accounts {
        match account.balance {
            Some(value) if !account.fx_unavailable => {
                balance = balance.and_then(|total| total.checked_add(value));
            }
            _ => {
                debug!("Account {} has no usable balance", account.uuid);
                incomplete = true;
            }
        }
    }

    if balance.is_none() {
        warn!("Account balance total overflowed over {} accounts", accounts.len());
        incomplete = true;
    }

    AccountTotals {
        account_count: accounts.len(),
        balance: balance.filter(|_| !incomplete),
        incomplete,
    }
}
