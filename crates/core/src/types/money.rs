//! Money helpers.
//!
//! Amounts are carried as [`Decimal`] in the currency's standard unit (naira,
//! not kobo). Payment gateways want integer minor units, so conversion happens
//! once, at the gateway boundary.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Convert a standard-unit amount to integer minor units (e.g. naira to kobo).
///
/// Rounds half away from zero at the minor unit. Returns `None` for negative
/// amounts or amounts that do not fit in an `i64`.
///
/// ```rust
/// # use rust_decimal::Decimal;
/// # use wear_with_pride_core::to_minor_units;
/// assert_eq!(to_minor_units(Decimal::new(2500, 0)), Some(250_000));
/// assert_eq!(to_minor_units(Decimal::new(1999, 2)), Some(1999));
/// assert_eq!(to_minor_units(Decimal::new(-1, 0)), None);
/// ```
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return None;
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Currencies accepted by the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    NGN,
    GHS,
    ZAR,
    KES,
    USD,
}

impl CurrencyCode {
    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NGN => "NGN",
            Self::GHS => "GHS",
            Self::ZAR => "ZAR",
            Self::KES => "KES",
            Self::USD => "USD",
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NGN" => Ok(Self::NGN),
            "GHS" => Ok(Self::GHS),
            "ZAR" => Ok(Self::ZAR),
            "KES" => Ok(Self::KES),
            "USD" => Ok(Self::USD),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}
