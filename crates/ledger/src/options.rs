//! Tunable ledger policies.
//!
//! Every field has a default matching the historical behaviour of the
//! service, so an empty `[ledger]` table in the settings is valid.

use serde::{Deserialize, Serialize};

use crate::Currency;

/// What to do with the cents left over when an expense does not divide
/// evenly among the people involved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Every debtor owes the rounded share; the payer absorbs the residue.
    #[default]
    Drop,
    /// Leftover cents are assigned one by one, payer first, then debtors in
    /// the order they were listed. Shares add up exactly to the amount.
    RoundRobin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerOptions {
    /// Currency of new debts when neither the expense nor the group has one.
    pub default_currency: Currency,
    /// Currency reported by a balance between users with no active debts.
    pub empty_balance_currency: Currency,
    pub remainder: RemainderPolicy,
    /// Reject edits on settled/disputed/cancelled debts.
    pub lock_terminal_edits: bool,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            default_currency: Currency::Sar,
            empty_balance_currency: Currency::Usd,
            remainder: RemainderPolicy::Drop,
            lock_terminal_edits: false,
        }
    }
}
