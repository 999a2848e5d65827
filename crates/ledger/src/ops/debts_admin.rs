use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::{QueryFilter, QuerySelect, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    DebtRecord, DebtStatus, EditDebtCmd, LedgerError, ResultLedger, debts,
    util::{ensure_positive_amount, normalize_description, require_id},
};

use super::{Ledger, trace_outcome};

impl Ledger {
    /// Changes the amount and/or description of a debt. Only the creditor may
    /// edit.
    ///
    /// Settled, disputed and cancelled debts stay editable unless
    /// [`LedgerOptions::lock_terminal_edits`](crate::LedgerOptions) is set, in
    /// which case they fail with `AlreadySettled`. The status is never touched.
    #[tracing::instrument(name = "edit_debt", skip_all, fields(debt_id = %cmd.debt_id))]
    pub async fn edit_debt(&self, cmd: EditDebtCmd) -> ResultLedger<DebtRecord> {
        let actor = cmd.actor_id.clone();
        let result = self.edit_debt_inner(cmd).await;
        trace_outcome("edit_debt", &actor, &result);
        result
    }

    async fn edit_debt_inner(&self, cmd: EditDebtCmd) -> ResultLedger<DebtRecord> {
        let actor_id = require_id(&cmd.actor_id, "actor")?;
        if cmd.is_empty() {
            return Err(LedgerError::Validation("nothing to update".to_string()));
        }
        if let Some(amount) = cmd.amount {
            ensure_positive_amount(amount, "amount")?;
        }
        let description = cmd
            .description
            .as_deref()
            .map(normalize_description)
            .transpose()?;

        let debt = self.debt(cmd.debt_id).await?;
        if debt.creditor_id != actor_id {
            return Err(LedgerError::Forbidden(
                "only the creditor can edit this debt".to_string(),
            ));
        }
        let locked = self.options.lock_terminal_edits;
        if locked && debt.status.is_terminal() {
            return Err(LedgerError::AlreadySettled(format!(
                "debt is already {}",
                debt.status
            )));
        }

        let now = Utc::now();
        let mut update = debts::Entity::update_many()
            .col_expr(debts::Column::UpdatedAt, Expr::value(now))
            .filter(debts::Column::Id.eq(cmd.debt_id.to_string()));
        if let Some(amount) = cmd.amount {
            update = update.col_expr(debts::Column::AmountMinor, Expr::value(amount.cents()));
        }
        if let Some(description) = &description {
            update = update.col_expr(
                debts::Column::Description,
                Expr::value(description.as_str()),
            );
        }
        if locked {
            update = update.filter(debts::Column::Status.eq(DebtStatus::Active.as_str()));
        }

        if update.exec(&self.database).await?.rows_affected == 0 {
            let current = self.debt(cmd.debt_id).await?;
            return Err(LedgerError::AlreadySettled(format!(
                "debt is already {}",
                current.status
            )));
        }

        Ok(DebtRecord {
            amount: cmd.amount.unwrap_or(debt.amount),
            description: description.unwrap_or(debt.description),
            updated_at: now,
            ..debt
        })
    }

    /// Hard-deletes a debt whatever its status. Either party may delete it.
    #[tracing::instrument(name = "delete_debt", skip_all, fields(debt_id = %debt_id))]
    pub async fn delete_debt(&self, debt_id: Uuid, actor_id: &str) -> ResultLedger<()> {
        let result = self.delete_debt_inner(debt_id, actor_id).await;
        trace_outcome("delete_debt", actor_id, &result);
        result
    }

    async fn delete_debt_inner(&self, debt_id: Uuid, actor_id: &str) -> ResultLedger<()> {
        let actor_id = require_id(actor_id, "actor")?;
        let debt = self.debt(debt_id).await?;
        if !debt.is_party(actor_id) {
            return Err(LedgerError::Forbidden(
                "only the creditor or the debtor can delete this debt".to_string(),
            ));
        }

        let result = debts::Entity::delete_by_id(debt_id.to_string())
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(LedgerError::NotFound("debt not exists".to_string()));
        }
        Ok(())
    }

    /// Deletes every debt of a group, whatever its status. Group admins only.
    /// Returns the number of debts removed.
    #[tracing::instrument(name = "delete_group_debts", skip_all, fields(group_id = %group_id))]
    pub async fn delete_group_debts(&self, group_id: &str, actor_id: &str) -> ResultLedger<u64> {
        let result = self.delete_group_debts_inner(group_id, actor_id).await;
        if let Ok(count) = &result {
            tracing::debug!(count = *count, "group debts deleted");
        }
        trace_outcome("delete_group_debts", actor_id, &result);
        result
    }

    async fn delete_group_debts_inner(&self, group_id: &str, actor_id: &str) -> ResultLedger<u64> {
        let group_id = require_id(group_id, "group")?;
        let actor_id = require_id(actor_id, "actor")?;
        if !self.membership.is_admin(group_id, actor_id).await? {
            return Err(LedgerError::Forbidden(
                "only a group admin can delete the group debts".to_string(),
            ));
        }

        let result = debts::Entity::delete_many()
            .filter(debts::Column::GroupId.eq(group_id))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected)
    }

    /// Gives a currency to debts stored without one: the group currency when
    /// the group has one, the default currency otherwise. Returns the number
    /// of debts updated.
    #[tracing::instrument(name = "backfill_currency", skip_all)]
    pub async fn backfill_currency(&self) -> ResultLedger<u64> {
        let result = self.backfill_currency_inner().await;
        if let Ok(count) = &result {
            tracing::debug!(count = *count, "currencies backfilled");
        }
        trace_outcome("backfill_currency", "system", &result);
        result
    }

    async fn backfill_currency_inner(&self) -> ResultLedger<u64> {
        let group_ids: BTreeSet<String> = debts::Entity::find()
            .select_only()
            .column(debts::Column::GroupId)
            .filter(debts::Column::Currency.eq(""))
            .into_tuple::<String>()
            .all(&self.database)
            .await?
            .into_iter()
            .collect();

        let mut updated = 0;
        for group_id in group_ids {
            let currency = self
                .membership
                .group(&group_id)
                .await?
                .and_then(|group| group.currency)
                .unwrap_or(self.options.default_currency);

            let result = debts::Entity::update_many()
                .col_expr(debts::Column::Currency, Expr::value(currency.code()))
                .filter(debts::Column::GroupId.eq(group_id.as_str()))
                .filter(debts::Column::Currency.eq(""))
                .exec(&self.database)
                .await?;
            tracing::debug!(
                group_id = %group_id,
                currency = %currency,
                count = result.rows_affected,
                "group currency backfilled"
            );
            updated += result.rows_affected;
        }
        Ok(updated)
    }
}
