use std::fmt;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// An amount of money held as integer cents.
///
/// On the wire it is a plain decimal number (`12.5`), in the database an
/// `INTEGER` column. Sums over cents are exact, so grouped totals always add
/// up to their grand total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest amount accepted from a client, in cents.
    pub const MAX_INPUT_CENTS: i64 = 1_000_000_000_000_000;

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Converts a decimal amount, rounding to the nearest cent.
    /// Returns `None` for NaN, infinities and values outside the `i64` range.
    pub fn from_decimal(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let cents = (value * 100.0).round();
        if cents < i64::MIN as f64 || cents >= i64::MAX as f64 {
            return None;
        }
        Some(Self(cents as i64))
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Arithmetic mean rounded half away from zero to the nearest cent; zero
    /// for no values. Summed in `i128`, so any number of `i64` amounts fits.
    pub fn mean<I: IntoIterator<Item = Money>>(values: I) -> Money {
        let (total, count) = values
            .into_iter()
            .fold((0i128, 0i128), |(total, count), m| (total + m.0 as i128, count + 1));
        if count == 0 {
            return Money::ZERO;
        }
        let half = count / 2;
        let rounded = if total >= 0 {
            (total + half) / count
        } else {
            (total - half) / count
        };
        // A rounded mean of i64 values lies between their min and max.
        Money(rounded as i64)
    }
}

/// Validates a client-supplied amount: present, not negative, and at most
/// [`Money::MAX_INPUT_CENTS`] once rounded to cents.
pub fn parse_amount(amount: Option<f64>) -> Result<Money, ValidationError> {
    let amount = amount.ok_or(ValidationError::AmountRequired)?;
    if amount < 0.0 {
        return Err(ValidationError::NegativeAmount);
    }
    Money::from_decimal(amount)
        .filter(|m| m.0 <= Money::MAX_INPUT_CENTS)
        .ok_or(ValidationError::AmountOutOfRange)
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs_cents = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_decimal(value)
            .ok_or_else(|| serde::de::Error::custom("amount is not a finite number"))
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Money)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_decimal_rounds_to_cents() {
        assert_eq!(Money::from_decimal(12.345).unwrap().cents(), 1235);
        assert_eq!(Money::from_decimal(0.1 + 0.2).unwrap().cents(), 30);
        assert_eq!(Money::from_decimal(-5.0).unwrap().cents(), -500);
        assert!(Money::from_decimal(f64::NAN).is_none());
        assert!(Money::from_decimal(f64::INFINITY).is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(123456).to_string(), "1234.56");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    fn cents(values: &[i64]) -> Vec<Money> {
        values.iter().copied().map(Money::from_cents).collect()
    }

    #[test]
    fn test_mean() {
        assert_eq!(Money::mean(cents(&[300, 300, 300])), Money::from_cents(300));
        assert_eq!(Money::mean(cents(&[100, 0, 0])), Money::from_cents(33));
        assert_eq!(Money::mean(cents(&[1, 2])), Money::from_cents(2));
        assert_eq!(Money::mean(cents(&[-1, -2])), Money::from_cents(-2));
        assert_eq!(Money::mean(Vec::new()), Money::ZERO);
    }

    #[test]
    fn test_mean_of_huge_amounts_does_not_overflow() {
        let huge = 5_000_000_000_000_000_000;
        assert_eq!(Money::mean(cents(&[huge, huge])), Money::from_cents(huge));
        assert_eq!(
            Money::mean(cents(&[i64::MAX, i64::MAX, i64::MAX])),
            Money::from_cents(i64::MAX)
        );
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(500).checked_sub(Money::from_cents(700)),
            Some(Money::from_cents(-200))
        );
    }

    #[test]
    fn test_from_decimal_rejects_values_beyond_i64() {
        assert!(Money::from_decimal(92_233_720_368_547_758.08).is_none());
        assert!(Money::from_decimal(1e30).is_none());
        assert!(Money::from_decimal(-1e30).is_none());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(Some(12.5)), Ok(Money::from_cents(1250)));
        assert_eq!(parse_amount(Some(0.0)), Ok(Money::ZERO));
        assert_eq!(parse_amount(None), Err(ValidationError::AmountRequired));
        assert_eq!(parse_amount(Some(-5.0)), Err(ValidationError::NegativeAmount));
        assert_eq!(
            parse_amount(Some(10_000_000_000_000.0)),
            Ok(Money::from_cents(Money::MAX_INPUT_CENTS))
        );
        assert_eq!(
            parse_amount(Some(10_000_000_000_000.01)),
            Err(ValidationError::AmountOutOfRange)
        );
        assert_eq!(parse_amount(Some(1e18)), Err(ValidationError::AmountOutOfRange));
        assert_eq!(parse_amount(Some(5e16)), Err(ValidationError::AmountOutOfRange));
    }

    #[test]
    fn test_serializes_as_decimal() {
        let json = serde_json::to_string(&Money::from_cents(25050)).unwrap();
        assert_eq!(json, "250.5");
        let parsed: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(parsed.cents(), 1999);
    }
}
