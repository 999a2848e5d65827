//! Group membership oracle.
//!
//! The ledger never looks inside a group: every "is this user part of the
//! group" question goes through [`MembershipOracle`]. [`StoreMembership`] is
//! the implementation backed by the `groups`/`group_members` tables; callers
//! owning another group store can plug their own.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseConnection, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Currency, LedgerError, ResultLedger, group_members, groups,
    util::{corrupt_row, model_currency},
};

const MAX_GROUP_NAME_LEN: usize = 100;

/// What the ledger needs to know about a group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupProfile {
    pub id: String,
    /// Currency used for new debts when the expense does not name one.
    pub currency: Option<Currency>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl TryFrom<&str> for MemberRole {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(LedgerError::Validation(format!(
                "invalid membership role: {other}"
            ))),
        }
    }
}

/// Answers membership questions about a group.
#[async_trait]
pub trait MembershipOracle: Send + Sync {
    /// Returns `None` when the group does not exist.
    async fn group(&self, group_id: &str) -> ResultLedger<Option<GroupProfile>>;

    /// `true` if `user_id` is an active member of the group.
    async fn is_member(&self, group_id: &str, user_id: &str) -> ResultLedger<bool>;

    /// `true` if `user_id` is an active admin of the group.
    async fn is_admin(&self, group_id: &str, user_id: &str) -> ResultLedger<bool>;
}

/// Membership oracle reading the `groups` and `group_members` tables.
#[derive(Clone, Debug)]
pub struct StoreMembership {
    database: DatabaseConnection,
}

impl StoreMembership {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    async fn membership(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> ResultLedger<Option<group_members::Model>> {
        group_members::Entity::find_by_id((group_id.to_string(), user_id.to_string()))
            .one(&self.database)
            .await
            .map_err(Into::into)
    }

    /// Creates a group; the creator joins it as admin.
    pub async fn create_group(
        &self,
        name: &str,
        currency: Option<Currency>,
        creator_id: &str,
    ) -> ResultLedger<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation(
                "group name must not be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_GROUP_NAME_LEN {
            return Err(LedgerError::Validation(format!(
                "group name cannot exceed {MAX_GROUP_NAME_LEN} characters"
            )));
        }
        let creator_id = crate::util::require_id(creator_id, "creator")?;

        let group_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let db_tx = self.database.begin().await?;
        groups::ActiveModel {
            id: ActiveValue::Set(group_id.clone()),
            name: ActiveValue::Set(name.to_string()),
            currency: ActiveValue::Set(currency.map(|c| c.code().to_string())),
            created_by: ActiveValue::Set(creator_id.to_string()),
            created_at: ActiveValue::Set(now),
        }
        .insert(&db_tx)
        .await?;
        group_members::ActiveModel {
            group_id: ActiveValue::Set(group_id.clone()),
            user_id: ActiveValue::Set(creator_id.to_string()),
            role: ActiveValue::Set(MemberRole::Admin.as_str().to_string()),
            is_active: ActiveValue::Set(true),
            joined_at: ActiveValue::Set(now),
        }
        .insert(&db_tx)
        .await?;
        db_tx.commit().await?;

        tracing::info!(op = "create_group", actor = %creator_id, group_id = %group_id, "group created");
        Ok(group_id)
    }

    /// Adds a member or reactivates/updates an existing one.
    pub async fn upsert_member(
        &self,
        group_id: &str,
        user_id: &str,
        role: MemberRole,
    ) -> ResultLedger<()> {
        let user_id = crate::util::require_id(user_id, "user")?;
        if groups::Entity::find_by_id(group_id.to_string())
            .one(&self.database)
            .await?
            .is_none()
        {
            return Err(LedgerError::NotFound("group not exists".to_string()));
        }

        let active = group_members::ActiveModel {
            group_id: ActiveValue::Set(group_id.to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
            role: ActiveValue::Set(role.as_str().to_string()),
            is_active: ActiveValue::Set(true),
            joined_at: ActiveValue::NotSet,
        };

        match self.membership(group_id, user_id).await? {
            Some(_) => {
                active.update(&self.database).await?;
            }
            None => {
                let mut active = active;
                active.joined_at = ActiveValue::Set(Utc::now());
                active.insert(&self.database).await?;
            }
        }
        Ok(())
    }

    /// Marks a member as inactive. Past debts are kept.
    pub async fn deactivate_member(&self, group_id: &str, user_id: &str) -> ResultLedger<()> {
        if self.membership(group_id, user_id).await?.is_none() {
            return Err(LedgerError::NotFound("group member not exists".to_string()));
        }
        group_members::ActiveModel {
            group_id: ActiveValue::Set(group_id.to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
            is_active: ActiveValue::Set(false),
            ..Default::default()
        }
        .update(&self.database)
        .await?;
        Ok(())
    }

    /// Deletes a group and its memberships. Debts must be purged through the
    /// ledger first.
    pub async fn delete_group(&self, group_id: &str) -> ResultLedger<()> {
        let result = groups::Entity::delete_by_id(group_id.to_string())
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(LedgerError::NotFound("group not exists".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipOracle for StoreMembership {
    async fn group(&self, group_id: &str) -> ResultLedger<Option<GroupProfile>> {
        let Some(model) = groups::Entity::find_by_id(group_id.to_string())
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };
        let currency = model
            .currency
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .map(model_currency)
            .transpose()?;
        Ok(Some(GroupProfile {
            id: model.id,
            currency,
        }))
    }

    async fn is_member(&self, group_id: &str, user_id: &str) -> ResultLedger<bool> {
        Ok(self
            .membership(group_id, user_id)
            .await?
            .is_some_and(|m| m.is_active))
    }

    async fn is_admin(&self, group_id: &str, user_id: &str) -> ResultLedger<bool> {
        let Some(member) = self.membership(group_id, user_id).await? else {
            return Ok(false);
        };
        let role = MemberRole::try_from(member.role.as_str()).map_err(|_| {
            corrupt_row(format!("invalid stored member role: \"{}\"", member.role))
        })?;
        Ok(member.is_active && role == MemberRole::Admin)
    }
}
