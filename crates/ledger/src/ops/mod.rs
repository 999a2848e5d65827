use std::sync::Arc;

use sea_orm::{DatabaseConnection, prelude::*};
use uuid::Uuid;

use crate::{
    DebtRecord, LedgerError, LedgerOptions, MembershipOracle, ResultLedger, StoreMembership, debts,
};

mod balances;
mod debts_admin;
mod queries;
mod settlement;
mod split;

pub use balances::{Balance, BalanceDirection};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Entry point of every ledger operation.
///
/// `Ledger` holds no balance state: every read goes to the database, and every
/// write is either a single conditional statement or a DB transaction.
#[derive(Clone)]
pub struct Ledger {
    database: DatabaseConnection,
    membership: Arc<dyn MembershipOracle>,
    options: LedgerOptions,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("database", &self.database)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Ledger {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    async fn find_debt(&self, debt_id: Uuid) -> ResultLedger<debts::Model> {
        debts::Entity::find_by_id(debt_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("debt not exists".to_string()))
    }

    /// Returns a single debt by id.
    pub async fn debt(&self, debt_id: Uuid) -> ResultLedger<DebtRecord> {
        DebtRecord::try_from(self.find_debt(debt_id).await?)
    }
}

/// Emits the outcome event of a ledger operation.
///
/// Domain rejections are warnings; storage failures are errors and carry the
/// full error, which is never shown to the caller.
fn trace_outcome<T>(op: &'static str, actor: &str, result: &ResultLedger<T>) {
    match result {
        Ok(_) => tracing::info!(op, actor, outcome = "ok", "ledger operation succeeded"),
        Err(err) if err.is_internal() => {
            tracing::error!(op, actor, outcome = "error", error = %err, "ledger operation failed")
        }
        Err(err) => tracing::warn!(
            op,
            actor,
            outcome = "rejected",
            code = err.code(),
            reason = %err,
            "ledger operation rejected"
        ),
    }
}

/// The builder for `Ledger`
#[derive(Default)]
pub struct LedgerBuilder {
    database: DatabaseConnection,
    membership: Option<Arc<dyn MembershipOracle>>,
    options: LedgerOptions,
}

impl LedgerBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Use a custom membership oracle. Defaults to [`StoreMembership`] on the
    /// same database.
    pub fn membership(mut self, oracle: Arc<dyn MembershipOracle>) -> LedgerBuilder {
        self.membership = Some(oracle);
        self
    }

    pub fn options(mut self, options: LedgerOptions) -> LedgerBuilder {
        self.options = options;
        self
    }

    /// Construct `Ledger`
    pub fn build(self) -> Ledger {
        let membership = self
            .membership
            .unwrap_or_else(|| Arc::new(StoreMembership::new(self.database.clone())));
        Ledger {
            database: self.database,
            membership,
            options: self.options,
        }
    }
}
