//! Command structs for ledger write operations.
//!
//! These types group the parameters of expense splitting and debt editing,
//! keeping call sites readable and avoiding long argument lists.

use uuid::Uuid;

use crate::{Currency, Money};

/// Split one shared expense among group members.
///
/// The payer is the creditor of every resulting debt. By default the actor is
/// the payer; callers registering on someone else's behalf must set it
/// explicitly (and will be rejected).
#[derive(Clone, Debug)]
pub struct SplitExpenseCmd {
    pub group_id: String,
    pub creditor_id: String,
    pub actor_id: String,
    pub amount: Money,
    pub description: String,
    pub currency: Option<Currency>,
    pub participant_ids: Vec<String>,
}

impl SplitExpenseCmd {
    #[must_use]
    pub fn new(
        group_id: impl Into<String>,
        payer_id: impl Into<String>,
        amount: Money,
        description: impl Into<String>,
    ) -> Self {
        let payer_id = payer_id.into();
        Self {
            group_id: group_id.into(),
            actor_id: payer_id.clone(),
            creditor_id: payer_id,
            amount,
            description: description.into(),
            currency: None,
            participant_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = actor_id.into();
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    #[must_use]
    pub fn participant(mut self, user_id: impl Into<String>) -> Self {
        self.participant_ids.push(user_id.into());
        self
    }

    #[must_use]
    pub fn participants<I, S>(mut self, user_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participant_ids
            .extend(user_ids.into_iter().map(Into::into));
        self
    }
}

/// Change the terms of an existing debt. `None` fields are left untouched.
#[derive(Clone, Debug)]
pub struct EditDebtCmd {
    pub debt_id: Uuid,
    pub actor_id: String,
    pub amount: Option<Money>,
    pub description: Option<String>,
}

impl EditDebtCmd {
    #[must_use]
    pub fn new(debt_id: Uuid, actor_id: impl Into<String>) -> Self {
        Self {
            debt_id,
            actor_id: actor_id.into(),
            amount: None,
            description: None,
        }
    }

    #[must_use]
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// `true` when the command would not change anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.description.is_none()
    }
}
