//! Debt records.
//!
//! A [`DebtRecord`] is one unidirectional obligation: `debtor_id` owes
//! `amount` to `creditor_id` inside a group. Records are only ever produced by
//! splitting an expense, and their status only moves forward:
//!
//! ```text
//! active ──> settled
//!        ├─> disputed
//!        └─> cancelled
//! ```

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, LedgerError, Money, ResultLedger,
    util::{corrupt_row, model_currency, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    Active,
    Settled,
    Disputed,
    Cancelled,
}

impl DebtStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Settled => "settled",
            Self::Disputed => "disputed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Every status but `active` is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Whether `self -> next` is an edge of the status graph.
    #[must_use]
    pub const fn can_transition_to(self, next: DebtStatus) -> bool {
        matches!(self, Self::Active) && !matches!(next, Self::Active)
    }
}

impl core::fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for DebtStatus {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "settled" => Ok(Self::Settled),
            "disputed" => Ok(Self::Disputed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(LedgerError::Validation(format!(
                "invalid debt status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtRecord {
    pub id: Uuid,
    pub group_id: String,
    pub creditor_id: String,
    pub debtor_id: String,
    /// Total of the expense this share comes from.
    pub original_amount: Money,
    pub amount: Money,
    pub currency: Currency,
    pub description: String,
    pub status: DebtStatus,
    pub settled_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DebtRecord {
    /// Builds a new `active` record. Fails when the creditor and the debtor
    /// are the same user or when the share is not positive.
    pub fn new(
        group_id: impl Into<String>,
        creditor_id: impl Into<String>,
        debtor_id: impl Into<String>,
        original_amount: Money,
        amount: Money,
        currency: Currency,
        description: impl Into<String>,
        created_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> ResultLedger<Self> {
        let creditor_id = creditor_id.into();
        let debtor_id = debtor_id.into();
        if creditor_id == debtor_id {
            return Err(LedgerError::Validation(
                "creditor and debtor must differ".to_string(),
            ));
        }
        if amount < Money::ONE_CENT {
            return Err(LedgerError::Validation(
                "debt amount must be at least 0.01".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            group_id: group_id.into(),
            creditor_id,
            debtor_id,
            original_amount,
            amount,
            currency,
            description: description.into(),
            status: DebtStatus::Active,
            settled_at: None,
            created_by: created_by.into(),
            created_at,
            updated_at: created_at,
        })
    }

    /// `true` when `user_id` is the creditor or the debtor.
    #[must_use]
    pub fn is_party(&self, user_id: &str) -> bool {
        self.creditor_id == user_id || self.debtor_id == user_id
    }

    /// Signed contribution of this record to `viewer`'s balance.
    #[must_use]
    pub fn signed_for(&self, viewer: &str) -> Money {
        if self.creditor_id == viewer {
            self.amount
        } else {
            -self.amount
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "debts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub creditor_id: String,
    pub debtor_id: String,
    pub original_amount_minor: i64,
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
    pub status: String,
    pub settled_at: Option<DateTimeUtc>,
    pub created_by: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&DebtRecord> for ActiveModel {
    fn from(debt: &DebtRecord) -> Self {
        Self {
            id: ActiveValue::Set(debt.id.to_string()),
            group_id: ActiveValue::Set(debt.group_id.clone()),
            creditor_id: ActiveValue::Set(debt.creditor_id.clone()),
            debtor_id: ActiveValue::Set(debt.debtor_id.clone()),
            original_amount_minor: ActiveValue::Set(debt.original_amount.cents()),
            amount_minor: ActiveValue::Set(debt.amount.cents()),
            currency: ActiveValue::Set(debt.currency.code().to_string()),
            description: ActiveValue::Set(debt.description.clone()),
            status: ActiveValue::Set(debt.status.as_str().to_string()),
            settled_at: ActiveValue::Set(debt.settled_at),
            created_by: ActiveValue::Set(debt.created_by.clone()),
            created_at: ActiveValue::Set(debt.created_at),
            updated_at: ActiveValue::Set(debt.updated_at),
        }
    }
}

impl TryFrom<Model> for DebtRecord {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "debt")?,
            currency: model_currency(&model.currency)?,
            status: DebtStatus::try_from(model.status.as_str()).map_err(|_| {
                corrupt_row(format!("invalid stored debt status: \"{}\"", model.status))
            })?,
            group_id: model.group_id,
            creditor_id: model.creditor_id,
            debtor_id: model.debtor_id,
            original_amount: Money::new(model.original_amount_minor),
            amount: Money::new(model.amount_minor),
            description: model.description,
            settled_at: model.settled_at,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DebtRecord {
        DebtRecord::new(
            "g1",
            "alice",
            "bob",
            Money::new(3000),
            Money::new(1000),
            Currency::Sar,
            "dinner",
            "alice",
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn status_graph_only_leaves_active() {
        use DebtStatus::*;
        for next in [Settled, Disputed, Cancelled] {
            assert!(Active.can_transition_to(next));
        }
        assert!(!Active.can_transition_to(Active));
        for from in [Settled, Disputed, Cancelled] {
            assert!(from.is_terminal());
            for next in [Active, Settled, Disputed, Cancelled] {
                assert!(!from.can_transition_to(next));
            }
        }
    }

    #[test]
    fn new_rejects_self_debt_and_empty_share() {
        let now = Utc::now();
        let err = DebtRecord::new(
            "g1",
            "alice",
            "alice",
            Money::new(100),
            Money::new(50),
            Currency::Sar,
            "x",
            "alice",
            now,
        )
        .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        assert!(
            DebtRecord::new(
                "g1",
                "alice",
                "bob",
                Money::new(1),
                Money::ZERO,
                Currency::Sar,
                "x",
                "alice",
                now,
            )
            .is_err()
        );
    }

    #[test]
    fn model_round_trip_keeps_every_field() {
        let mut debt = record();
        debt.status = DebtStatus::Settled;
        debt.settled_at = Some(Utc::now());

        let active: ActiveModel = (&debt).into();
        let model = Model {
            id: active.id.unwrap(),
            group_id: active.group_id.unwrap(),
            creditor_id: active.creditor_id.unwrap(),
            debtor_id: active.debtor_id.unwrap(),
            original_amount_minor: active.original_amount_minor.unwrap(),
            amount_minor: active.amount_minor.unwrap(),
            currency: active.currency.unwrap(),
            description: active.description.unwrap(),
            status: active.status.unwrap(),
            settled_at: active.settled_at.unwrap(),
            created_by: active.created_by.unwrap(),
            created_at: active.created_at.unwrap(),
            updated_at: active.updated_at.unwrap(),
        };
        assert_eq!(DebtRecord::try_from(model).unwrap(), debt);
    }

    #[test]
    fn parties_and_sign() {
        let debt = record();
        assert!(debt.is_party("alice"));
        assert!(debt.is_party("bob"));
        assert!(!debt.is_party("carol"));
        assert_eq!(debt.signed_for("alice"), Money::new(1000));
        assert_eq!(debt.signed_for("bob"), Money::new(-1000));
    }
}
