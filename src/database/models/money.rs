use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use serde::{Deserialize, Serialize};

/// Monetary amount held at two decimal places, rounded half-up.
///
/// Persisted as TEXT so amounts never pass through floating point on the
/// way in or out of the database.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(BigDecimal);

impl Money {
    pub fn new(value: BigDecimal) -> Self {
        Money(value.with_scale_round(2, RoundingMode::HalfUp))
    }

    pub fn zero() -> Self {
        Money(BigDecimal::from(0).with_scale(2))
    }

    pub fn as_decimal(&self) -> &BigDecimal {
        &self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // BigDecimal's own Display drops the scale for zero, rendering "0";
        // pin the two-decimal form instead.
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = bigdecimal::ParseBigDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Money::new(BigDecimal::from_str(s)?))
    }
}

impl sqlx::Type<sqlx::Sqlite> for Money {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for Money {
    fn encode_by_ref(
        &self,
        args: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        // Goes through Display so stored amounts always carry two decimals.
        let s = self.to_string();
        <String as sqlx::Encode<'q, sqlx::Sqlite>>::encode_by_ref(&s, args)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for Money {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        s.parse::<Money>().map_err(|e| e.into())
    }
}
