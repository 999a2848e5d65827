use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{TransactionTrait, prelude::*};

use crate::{
    DebtRecord, LedgerError, Money, RemainderPolicy, ResultLedger, SplitExpenseCmd, debts,
    util::{ensure_positive_amount, normalize_description, require_id},
};

use super::{Ledger, trace_outcome, with_tx};

/// How one expense is divided between the payer and the debtors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SplitPlan {
    /// `(debtor_id, share)` in the order the participants were given.
    pub(crate) debtors: Vec<(String, Money)>,
    /// What the payer is left carrying; absorbs the rounding residue.
    pub(crate) payer_share: Money,
}

/// Divides `amount` among the payer and the participants.
///
/// Participants are deduplicated (keeping the first occurrence) and the payer
/// never owes themself. Every debtor share must be at least one cent.
pub(crate) fn plan_split(
    amount: Money,
    creditor_id: &str,
    participant_ids: &[String],
    policy: RemainderPolicy,
) -> ResultLedger<SplitPlan> {
    let mut seen: HashSet<&str> = HashSet::new();
    let debtor_ids: Vec<&str> = participant_ids
        .iter()
        .map(String::as_str)
        .filter(|id| *id != creditor_id && seen.insert(*id))
        .collect();

    // The payer is always one of the people involved.
    let involved = debtor_ids.len() + 1;

    let (payer_share, shares) = match policy {
        RemainderPolicy::Drop => {
            let share = amount
                .split_even(involved)
                .ok_or_else(|| LedgerError::Validation("nobody to split with".to_string()))?;
            let owed: Money = std::iter::repeat_n(share, debtor_ids.len()).sum();
            (amount - owed, vec![share; debtor_ids.len()])
        }
        RemainderPolicy::RoundRobin => {
            let mut shares = amount.split_exact(involved);
            let payer_share = shares.remove(0);
            (payer_share, shares)
        }
    };

    if shares.iter().any(|share| *share < Money::ONE_CENT) {
        return Err(LedgerError::Validation(format!(
            "amount {amount} is too small to split among {involved} people"
        )));
    }

    Ok(SplitPlan {
        debtors: debtor_ids
            .into_iter()
            .map(ToString::to_string)
            .zip(shares)
            .collect(),
        payer_share,
    })
}

impl Ledger {
    /// Splits a shared expense into one active debt per participant other
    /// than the payer.
    ///
    /// - the actor must be the payer (`Forbidden`)
    /// - the group must exist (`NotFound`)
    /// - the payer must be a member (`NotMember`)
    /// - every participant must be an active member (`Validation`, naming the id)
    ///
    /// All records are inserted in one transaction. When the payer is the only
    /// participant nothing is written and an empty list is returned.
    #[tracing::instrument(
        name = "split_expense",
        skip_all,
        fields(group_id = %cmd.group_id, participants = cmd.participant_ids.len())
    )]
    pub async fn split_expense(&self, cmd: SplitExpenseCmd) -> ResultLedger<Vec<DebtRecord>> {
        let actor = cmd.actor_id.clone();
        let result = self.split_expense_inner(cmd).await;
        if let Ok(records) = &result {
            tracing::debug!(count = records.len(), "debts created");
        }
        trace_outcome("split_expense", &actor, &result);
        result
    }

    async fn split_expense_inner(&self, cmd: SplitExpenseCmd) -> ResultLedger<Vec<DebtRecord>> {
        let group_id = require_id(&cmd.group_id, "group")?.to_string();
        let creditor_id = require_id(&cmd.creditor_id, "creditor")?.to_string();
        let actor_id = require_id(&cmd.actor_id, "actor")?.to_string();
        ensure_positive_amount(cmd.amount, "amount")?;
        let description = normalize_description(&cmd.description)?;
        if cmd.participant_ids.is_empty() {
            return Err(LedgerError::Validation(
                "at least one participant is required".to_string(),
            ));
        }

        if actor_id != creditor_id {
            return Err(LedgerError::Forbidden(
                "only the payer can register an expense".to_string(),
            ));
        }

        let group = self
            .membership
            .group(&group_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound("group not exists".to_string()))?;

        if !self.membership.is_member(&group_id, &creditor_id).await? {
            return Err(LedgerError::NotMember(
                "creditor is not a member of this group".to_string(),
            ));
        }

        for participant_id in &cmd.participant_ids {
            if !self.membership.is_member(&group_id, participant_id).await? {
                return Err(LedgerError::Validation(format!(
                    "user with id {participant_id} is not a member of this group"
                )));
            }
        }

        let plan = plan_split(
            cmd.amount,
            &creditor_id,
            &cmd.participant_ids,
            self.options.remainder,
        )?;
        if plan.debtors.is_empty() {
            tracing::debug!("payer is the only participant, no debts created");
            return Ok(Vec::new());
        }

        let currency = cmd
            .currency
            .or(group.currency)
            .unwrap_or(self.options.default_currency);
        let now = Utc::now();

        let records = plan
            .debtors
            .into_iter()
            .map(|(debtor_id, share)| {
                DebtRecord::new(
                    group_id.as_str(),
                    creditor_id.as_str(),
                    debtor_id,
                    cmd.amount,
                    share,
                    currency,
                    description.as_str(),
                    actor_id.as_str(),
                    now,
                )
            })
            .collect::<ResultLedger<Vec<_>>>()?;

        let models: Vec<debts::ActiveModel> = records.iter().map(Into::into).collect();
        with_tx!(self, |db_tx| {
            debts::Entity::insert_many(models)
                .exec_without_returning(&db_tx)
                .await
                .map(|_| ())
                .map_err(LedgerError::from)
        })?;

        Ok(records)
    }
}
