use sea_orm::{Condition, QueryFilter, QueryOrder, Select, prelude::*};

use crate::{DebtRecord, DebtStatus, ResultLedger, debts, util::require_id};

use super::{Ledger, trace_outcome};

/// Actor recorded for group listings, which are not made on anyone's behalf.
const GROUP_QUERY_ACTOR: &str = "system";

impl Ledger {
    /// Debts where the user is the creditor or the debtor, across all groups,
    /// newest first.
    #[tracing::instrument(name = "find_by_user", skip_all)]
    pub async fn find_by_user(&self, user_id: &str) -> ResultLedger<Vec<DebtRecord>> {
        let result = self.find_by_user_inner(user_id).await;
        trace_outcome("find_by_user", user_id, &result);
        result
    }

    async fn find_by_user_inner(&self, user_id: &str) -> ResultLedger<Vec<DebtRecord>> {
        let user_id = require_id(user_id, "user")?;
        let query = debts::Entity::find().filter(
            Condition::any()
                .add(debts::Column::CreditorId.eq(user_id))
                .add(debts::Column::DebtorId.eq(user_id)),
        );
        self.newest_first(query).await
    }

    /// Every debt of a group, newest first.
    #[tracing::instrument(name = "find_by_group", skip_all, fields(group_id = %group_id))]
    pub async fn find_by_group(&self, group_id: &str) -> ResultLedger<Vec<DebtRecord>> {
        let result = self.find_by_group_inner(group_id, false).await;
        trace_outcome("find_by_group", GROUP_QUERY_ACTOR, &result);
        result
    }

    /// Active debts of a group, newest first.
    #[tracing::instrument(name = "find_active_by_group", skip_all, fields(group_id = %group_id))]
    pub async fn find_active_by_group(&self, group_id: &str) -> ResultLedger<Vec<DebtRecord>> {
        let result = self.find_by_group_inner(group_id, true).await;
        trace_outcome("find_active_by_group", GROUP_QUERY_ACTOR, &result);
        result
    }

    async fn find_by_group_inner(
        &self,
        group_id: &str,
        active_only: bool,
    ) -> ResultLedger<Vec<DebtRecord>> {
        let group_id = require_id(group_id, "group")?;
        let mut query = debts::Entity::find().filter(debts::Column::GroupId.eq(group_id));
        if active_only {
            query = query.filter(debts::Column::Status.eq(DebtStatus::Active.as_str()));
        }
        self.newest_first(query).await
    }

    async fn newest_first(&self, query: Select<debts::Entity>) -> ResultLedger<Vec<DebtRecord>> {
        let records = query
            .order_by_desc(debts::Column::CreatedAt)
            .order_by_desc(debts::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(DebtRecord::try_from)
            .collect::<ResultLedger<Vec<_>>>()?;
        tracing::debug!(count = records.len(), "debts loaded");
        Ok(records)
    }
}
