use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// ISO currency code of a debt.
///
/// The ledger does not convert between currencies: a debt keeps the currency
/// it was created with, and amounts of different currencies are never
/// aggregated on purpose.
///
/// ## Minor units
///
/// Every supported currency uses 2 fraction digits, so amounts are stored as
/// an `i64` number of cents (see [`Money`](crate::Money)).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    #[default]
    Sar,
    Aed,
    Egp,
    Try,
}

impl Currency {
    pub const ALL: [Currency; 6] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Sar,
        Currency::Aed,
        Currency::Egp,
        Currency::Try,
    ];

    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Sar => "SAR",
            Currency::Aed => "AED",
            Currency::Egp => "EGP",
            Currency::Try => "TRY",
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let code = value.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| {
                LedgerError::Validation(format!(
                    "currency must be one of USD, EUR, SAR, AED, EGP, TRY (got \"{}\")",
                    value.trim()
                ))
            })
    }
}

impl FromStr for Currency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::try_from(s)
    }
}
