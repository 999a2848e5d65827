use sea_orm::{Condition, ConnectionTrait, QueryFilter, QueryOrder, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    Currency, DebtRecord, DebtStatus, LedgerError, Money, ResultLedger, debts, util::require_id,
};

use super::{Ledger, trace_outcome};

/// Which way the money flows between the viewer and the other user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceDirection {
    /// The other user owes the viewer.
    OwedToViewer,
    /// The viewer owes the other user.
    ViewerOwes,
    SettledUp,
}

/// Net position of `viewer` towards another user inside one group.
///
/// `value > 0` means the other user owes the viewer, `value < 0` means the
/// viewer owes the other user.
///
/// Debts in different currencies are summed as-is and `currency` is the one
/// of the last debt visited: a pair mixing currencies gets a meaningless
/// figure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub value: Money,
    pub currency: Currency,
}

impl Balance {
    #[must_use]
    pub fn direction(&self) -> BalanceDirection {
        if self.value.is_positive() {
            BalanceDirection::OwedToViewer
        } else if self.value.is_negative() {
            BalanceDirection::ViewerOwes
        } else {
            BalanceDirection::SettledUp
        }
    }

    /// Sentence describing the balance from the viewer's side.
    #[must_use]
    pub fn describe(&self, other_user_id: &str) -> String {
        match self.direction() {
            BalanceDirection::OwedToViewer => format!(
                "User {other_user_id} owes you {} {}.",
                self.value, self.currency
            ),
            BalanceDirection::ViewerOwes => format!(
                "You owe user {other_user_id} {} {}.",
                self.value.abs(),
                self.currency
            ),
            BalanceDirection::SettledUp => {
                format!("You are settled up with user {other_user_id}.")
            }
        }
    }
}

/// Nets `records` from `viewer`'s side. Records must all be between the
/// viewer and the same other user.
pub(crate) fn net_balance(
    viewer: &str,
    records: &[DebtRecord],
    fallback: Currency,
) -> ResultLedger<Balance> {
    let mut value = Money::ZERO;
    let mut currency = fallback;
    for record in records {
        currency = record.currency;
        value = value
            .checked_add(record.signed_for(viewer))
            .ok_or_else(|| LedgerError::Validation("balance is out of range".to_string()))?;
    }
    Ok(Balance { value, currency })
}

/// Filter matching the debts between `user_a` and `user_b`, both directions.
pub(super) fn pair_condition(user_a: &str, user_b: &str) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(debts::Column::CreditorId.eq(user_a))
                .add(debts::Column::DebtorId.eq(user_b)),
        )
        .add(
            Condition::all()
                .add(debts::Column::CreditorId.eq(user_b))
                .add(debts::Column::DebtorId.eq(user_a)),
        )
}

/// Loads the active debts of a pair inside a group, oldest first.
pub(super) async fn active_pair_debts<C>(
    db: &C,
    group_id: &str,
    user_a: &str,
    user_b: &str,
) -> ResultLedger<Vec<DebtRecord>>
where
    C: ConnectionTrait,
{
    debts::Entity::find()
        .filter(debts::Column::GroupId.eq(group_id))
        .filter(debts::Column::Status.eq(DebtStatus::Active.as_str()))
        .filter(pair_condition(user_a, user_b))
        .order_by_asc(debts::Column::CreatedAt)
        .order_by_asc(debts::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(DebtRecord::try_from)
        .collect()
}

impl Ledger {
    /// Net balance of `user_a` towards `user_b` over the active debts of the
    /// group. Always recomputed from the stored records.
    #[tracing::instrument(name = "calculate_balance", skip_all, fields(group_id = %group_id))]
    pub async fn calculate_balance(
        &self,
        group_id: &str,
        user_a: &str,
        user_b: &str,
    ) -> ResultLedger<Balance> {
        let result = self.calculate_balance_inner(group_id, user_a, user_b).await;
        trace_outcome("calculate_balance", user_a, &result);
        result
    }

    async fn calculate_balance_inner(
        &self,
        group_id: &str,
        user_a: &str,
        user_b: &str,
    ) -> ResultLedger<Balance> {
        let group_id = require_id(group_id, "group")?;
        let user_a = require_id(user_a, "user")?;
        let user_b = require_id(user_b, "user")?;
        if user_a == user_b {
            return Err(LedgerError::Validation(
                "cannot compute a balance with yourself".to_string(),
            ));
        }

        let records = active_pair_debts(&self.database, group_id, user_a, user_b).await?;
        net_balance(user_a, &records, self.options.empty_balance_currency)
    }
}
