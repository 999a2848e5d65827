use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{DebtRecord, DebtStatus, LedgerError, ResultLedger, debts, util::require_id};

use super::{Ledger, balances, trace_outcome, with_tx};

fn already_terminal(status: DebtStatus) -> LedgerError {
    LedgerError::AlreadySettled(format!("debt is already {status}"))
}

/// Moves the given debts from `active` to `settled`. Records that are no
/// longer active are left alone; returns how many were transitioned.
async fn mark_settled<C>(
    db: &C,
    debt_ids: Vec<String>,
    settled_at: DateTime<Utc>,
) -> ResultLedger<u64>
where
    C: ConnectionTrait,
{
    let result = debts::Entity::update_many()
        .col_expr(
            debts::Column::Status,
            Expr::value(DebtStatus::Settled.as_str()),
        )
        .col_expr(debts::Column::SettledAt, Expr::value(Some(settled_at)))
        .col_expr(debts::Column::UpdatedAt, Expr::value(settled_at))
        .filter(debts::Column::Id.is_in(debt_ids))
        .filter(debts::Column::Status.eq(DebtStatus::Active.as_str()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

impl Ledger {
    /// Settles one debt. Either party may settle it.
    ///
    /// The transition is a single conditional update on `status = 'active'`:
    /// of two concurrent calls exactly one succeeds, the other gets
    /// `AlreadySettled` and `settled_at` is written once.
    #[tracing::instrument(name = "settle", skip_all, fields(debt_id = %debt_id))]
    pub async fn settle(&self, debt_id: Uuid, actor_id: &str) -> ResultLedger<DebtRecord> {
        let result = self.settle_inner(debt_id, actor_id).await;
        trace_outcome("settle", actor_id, &result);
        result
    }

    async fn settle_inner(&self, debt_id: Uuid, actor_id: &str) -> ResultLedger<DebtRecord> {
        let actor_id = require_id(actor_id, "actor")?;
        let debt = self.debt(debt_id).await?;
        if !debt.status.can_transition_to(DebtStatus::Settled) {
            return Err(already_terminal(debt.status));
        }
        if !debt.is_party(actor_id) {
            return Err(LedgerError::Forbidden(
                "only the creditor or the debtor can settle this debt".to_string(),
            ));
        }

        let now = Utc::now();
        let settled = mark_settled(&self.database, vec![debt_id.to_string()], now).await?;
        if settled == 0 {
            // Lost the race: someone moved the record after we read it.
            let current = self.debt(debt_id).await?;
            return Err(already_terminal(current.status));
        }

        Ok(DebtRecord {
            status: DebtStatus::Settled,
            settled_at: Some(now),
            updated_at: now,
            ..debt
        })
    }

    /// Settles every active debt between `creditor_id` and `other_user_id`
    /// inside the group, in both directions, with one shared `settled_at`.
    ///
    /// Only the net creditor of the pair may do it, on their own behalf.
    /// Returns the number of debts settled; a pair with no active debts is a
    /// successful no-op.
    #[tracing::instrument(name = "settle_all", skip_all, fields(group_id = %group_id))]
    pub async fn settle_all(
        &self,
        group_id: &str,
        creditor_id: &str,
        other_user_id: &str,
        actor_id: &str,
    ) -> ResultLedger<u64> {
        let result = self
            .settle_all_inner(group_id, creditor_id, other_user_id, actor_id)
            .await;
        if let Ok(count) = &result {
            tracing::debug!(count = *count, "debts settled");
        }
        trace_outcome("settle_all", actor_id, &result);
        result
    }

    async fn settle_all_inner(
        &self,
        group_id: &str,
        creditor_id: &str,
        other_user_id: &str,
        actor_id: &str,
    ) -> ResultLedger<u64> {
        let group_id = require_id(group_id, "group")?;
        let creditor_id = require_id(creditor_id, "creditor")?;
        let other_user_id = require_id(other_user_id, "user")?;
        let actor_id = require_id(actor_id, "actor")?;
        if creditor_id == other_user_id {
            return Err(LedgerError::Validation(
                "cannot settle debts with yourself".to_string(),
            ));
        }
        if actor_id != creditor_id {
            return Err(LedgerError::Forbidden(
                "only the net creditor can settle all debts".to_string(),
            ));
        }

        let fallback = self.options.empty_balance_currency;
        with_tx!(self, |db_tx| {
            let records =
                balances::active_pair_debts(&db_tx, group_id, creditor_id, other_user_id).await?;
            if records.is_empty() {
                Ok(0)
            } else if !balances::net_balance(creditor_id, &records, fallback)?
                .value
                .is_positive()
            {
                Err(LedgerError::Forbidden(
                    "only the net creditor can settle all debts".to_string(),
                ))
            } else {
                let ids = records.iter().map(|r| r.id.to_string()).collect();
                mark_settled(&db_tx, ids, Utc::now()).await
            }
        })
    }

    /// Cancelling a debt is not supported.
    #[tracing::instrument(name = "cancel_debt", skip_all, fields(debt_id = %debt_id))]
    pub async fn cancel_debt(&self, debt_id: Uuid, actor_id: &str) -> ResultLedger<DebtRecord> {
        let result: ResultLedger<DebtRecord> = Err(LedgerError::NotImplemented(
            "cancelling a debt is not supported".to_string(),
        ));
        trace_outcome("cancel_debt", actor_id, &result);
        result
    }
}
