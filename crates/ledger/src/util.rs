//! Internal helpers for input validation and model conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so every operation enforces the same rules.

use sea_orm::DbErr;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{Currency, LedgerError, Money, ResultLedger};

/// Maximum description length, in characters.
pub(crate) const MAX_DESCRIPTION_LEN: usize = 200;

/// Trims and NFC-normalizes a description, enforcing the length bound.
pub(crate) fn normalize_description(value: &str) -> ResultLedger<String> {
    let normalized: String = value.trim().nfc().collect();
    if normalized.is_empty() {
        return Err(LedgerError::Validation(
            "description cannot be empty".to_string(),
        ));
    }
    if normalized.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(LedgerError::Validation(format!(
            "description cannot exceed {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(normalized)
}

/// Largest amount accepted for an expense or a debt (1 000 000 000.00).
///
/// Keeps the sum of any realistic number of debts far from `i64::MAX`.
pub(crate) const MAX_AMOUNT: Money = Money::new(100_000_000_000);

/// Rejects amounts below one cent or above [`MAX_AMOUNT`].
pub(crate) fn ensure_positive_amount(amount: Money, label: &str) -> ResultLedger<()> {
    if amount < Money::ONE_CENT {
        return Err(LedgerError::Validation(format!(
            "{label} must be at least 0.01"
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(LedgerError::Validation(format!(
            "{label} cannot exceed {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

/// Rejects blank identifiers.
pub(crate) fn require_id<'a>(value: &'a str, label: &str) -> ResultLedger<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation(format!("{label} id is required")));
    }
    Ok(trimmed)
}

/// A stored row that cannot be mapped back to the domain. Reported as a
/// storage failure: the caller's input is not at fault.
pub(crate) fn corrupt_row(detail: String) -> LedgerError {
    LedgerError::Database(DbErr::Custom(detail))
}

/// Parse a UUID from storage.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultLedger<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| corrupt_row(format!("invalid stored {label} id: \"{value}\"")))
}

/// Parse a currency code stored in the DB into a strongly typed `Currency`.
pub(crate) fn model_currency(value: &str) -> ResultLedger<Currency> {
    Currency::try_from(value)
        .map_err(|_| corrupt_row(format!("invalid stored currency: \"{value}\"")))
}
