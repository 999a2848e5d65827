//! Debt ledger of a shared-expense service.
//!
//! The [`Ledger`] turns shared expenses into pairwise [`DebtRecord`]s, nets
//! the active debts between two users into a signed [`Balance`], and applies
//! settlements with conditional updates so concurrent requests never
//! double-transition a record.
//!
//! Group membership is answered by a [`MembershipOracle`]; [`StoreMembership`]
//! is the implementation backed by the same database.

pub use commands::{EditDebtCmd, SplitExpenseCmd};
pub use currency::Currency;
pub use debts::{DebtRecord, DebtStatus};
pub use error::LedgerError;
pub use membership::{GroupProfile, MemberRole, MembershipOracle, StoreMembership};
pub use money::Money;
pub use ops::{Balance, BalanceDirection, Ledger, LedgerBuilder};
pub use options::{LedgerOptions, RemainderPolicy};

mod commands;
mod currency;
mod debts;
mod error;
mod group_members;
mod groups;
mod membership;
mod money;
mod ops;
mod options;
mod util;

pub type ResultLedger<T> = Result<T, LedgerError>;
