//! Decimal money amounts.
//!
//! Balances and prices are decimal dollar amounts. They are persisted as
//! TEXT and all arithmetic goes through [`rust_decimal`] so no floating-point
//! rounding ever touches a balance.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Money`] amount.
#[derive(thiserror::Error, Debug, Clone)]
pub enum MoneyError {
    /// The input string is not a decimal number.
    #[error("invalid money amount: {0}")]
    Invalid(String),
    /// Negative amounts are not representable.
    #[error("money amount cannot be negative")]
    Negative,
}

/// A non-negative decimal currency amount (USD).
///
/// Amounts are stored in the currency's standard unit (dollars, not cents)
/// with two-decimal display precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Parse a `Money` amount from a decimal string such as `"7.50"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a decimal number or is negative.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| MoneyError::Invalid(s.to_owned()))?;
        Self::from_decimal(amount)
    }

    /// Wrap a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` if the amount is below zero.
    pub fn from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Add two amounts, `None` on overflow.
    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Subtract `other`, `None` if the result would be negative.
    #[must_use]
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        let diff = self.0.checked_sub(other.0)?;
        if diff.is_sign_negative() && !diff.is_zero() {
            return None;
        }
        Some(Self(diff))
    }

    /// Multiply by a quantity (e.g. a unit price times a trade quantity).
    #[must_use]
    pub fn times(&self, quantity: i64) -> Option<Self> {
        if quantity < 0 {
            return None;
        }
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// The canonical storage form: two decimal places, no currency symbol.
    #[must_use]
    pub fn to_storage(&self) -> String {
        self.0.round_dp(2).to_string()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// SQLx support (with sqlite feature): persisted as TEXT
#[cfg(feature = "sqlite")]
impl sqlx::Type<sqlx::Sqlite> for Money {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

#[cfg(feature = "sqlite")]
impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for Money {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        let amount = Decimal::from_str(s)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "sqlite")]
impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<'q, sqlx::Sqlite>>::encode(self.to_storage(), buf)
    }
}
