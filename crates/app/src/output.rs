//! JSON envelope printed on stdout for every command.

use ledger::LedgerError;
use serde::Serialize;
use serde_json::{Value, json};

pub enum AppError {
    Ledger(LedgerError),
    Usage(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Ledger(err) => err.code(),
            AppError::Usage(_) => "VALIDATION_ERROR",
        }
    }

    pub fn message(&self) -> String {
        match self {
            AppError::Ledger(err) => err.public_message(),
            AppError::Usage(msg) => msg.clone(),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(value: sea_orm::DbErr) -> Self {
        tracing::error!("database error: {value}");
        Self::Ledger(LedgerError::Database(value))
    }
}

/// Successful outcome of a command.
pub struct Reply {
    pub message: String,
    pub data: Value,
}

impl Reply {
    pub fn new(message: impl Into<String>, data: impl Serialize) -> Result<Self, AppError> {
        let data = serde_json::to_value(data)
            .map_err(|err| AppError::Usage(format!("cannot encode response: {err}")))?;
        Ok(Self {
            message: message.into(),
            data,
        })
    }
}

pub fn envelope(outcome: &Result<Reply, AppError>) -> Value {
    match outcome {
        Ok(reply) => json!({
            "success": true,
            "message": reply.message,
            "data": reply.data,
        }),
        Err(err) => json!({
            "success": false,
            "error": {
                "code": err.code(),
                "message": err.message(),
            },
        }),
    }
}
