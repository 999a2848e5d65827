//! The module contains the errors the ledger can return.
//!
//! Every variant maps to a stable code (see [`LedgerError::code`]) so callers
//! can translate failures into their own transport without matching on
//! messages:
//!
//! - [`Validation`] malformed input or a participant outside the group.
//! - [`NotFound`] the group or the debt does not exist.
//! - [`Forbidden`] the actor lacks the relationship the operation requires.
//! - [`NotMember`] the payer is not a member of the group.
//! - [`AlreadySettled`] a status transition out of a terminal state.
//! - [`NotImplemented`] a declared operation without an implementation.
//!
//!  [`Validation`]: LedgerError::Validation
//!  [`NotFound`]: LedgerError::NotFound
//!  [`Forbidden`]: LedgerError::Forbidden
//!  [`NotMember`]: LedgerError::NotMember
//!  [`AlreadySettled`]: LedgerError::AlreadySettled
//!  [`NotImplemented`]: LedgerError::NotImplemented
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not a member: {0}")]
    NotMember(String),
    #[error("Already settled: {0}")]
    AlreadySettled(String),
    #[error("Not implemented: {0}")]
    NotImplemented(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl LedgerError {
    /// Stable, machine readable code for the error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotMember(_) => "NOT_MEMBER",
            Self::AlreadySettled(_) => "ALREADY_SETTLED",
            Self::NotImplemented(_) => "NOT_IMPLEMENTED",
            Self::Database(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to the caller. Storage errors are replaced by a
    /// generic text.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }

    /// `true` for failures caused by the store rather than by the request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::NotMember(a), Self::NotMember(b)) => a == b,
            (Self::AlreadySettled(a), Self::AlreadySettled(b)) => a == b,
            (Self::NotImplemented(a), Self::NotImplemented(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
