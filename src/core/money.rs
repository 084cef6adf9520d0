//! Monetary amount normalization.
//!
//! Accepts the formats that show up in spreadsheets and hand-typed input
//! (`"R$ 1.234,56"`, `"1,234.56"`, `"1234,56"`, plain numbers) and produces a
//! [`Decimal`]. Conversion to integer centavos happens only when the wire
//! payload is built, via [`to_cents`].

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::MonetaryError;

/// Raw monetary input: already numeric, or text in some locale format.
#[derive(Debug, Clone, PartialEq)]
pub enum MonetaryValue {
    Decimal(Decimal),
    Float(f64),
    Text(String),
}

impl From<Decimal> for MonetaryValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<f64> for MonetaryValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for MonetaryValue {
    fn from(value: i64) -> Self {
        Self::Decimal(Decimal::from(value))
    }
}

impl From<&str> for MonetaryValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MonetaryValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Parse a monetary value into a decimal amount.
///
/// Numbers pass through unchanged. For text, the currency symbol and all
/// whitespace are dropped; when both `,` and `.` appear, whichever comes last
/// is the decimal separator and the other is a thousands separator. A lone
/// `,` is a decimal separator.
///
/// ```
/// use boleto::core::parse_amount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(parse_amount("R$ 1.234,56").unwrap(), dec!(1234.56));
/// assert_eq!(parse_amount("1,234.56").unwrap(), dec!(1234.56));
/// assert_eq!(parse_amount(1234.56).unwrap(), dec!(1234.56));
/// ```
pub fn parse_amount(value: impl Into<MonetaryValue>) -> Result<Decimal, MonetaryError> {
    match value.into() {
        MonetaryValue::Decimal(d) => Ok(d),
        MonetaryValue::Float(f) => decimal_from_f64(f),
        MonetaryValue::Text(s) => parse_amount_str(&s),
    }
}

fn decimal_from_f64(value: f64) -> Result<Decimal, MonetaryError> {
    if !value.is_finite() {
        return Err(MonetaryError {
            value: value.to_string(),
        });
    }
    // Display gives the shortest representation that round-trips,
    // so 100.5 becomes "100.5" rather than its binary expansion.
    Decimal::from_str(&value.to_string())
        .or_else(|_| Decimal::from_scientific(&format!("{value:e}")))
        .map_err(|_| MonetaryError {
            value: value.to_string(),
        })
}

fn parse_amount_str(input: &str) -> Result<Decimal, MonetaryError> {
    let invalid = || MonetaryError {
        value: input.to_string(),
    };

    let cleaned: String = input
        .replace("R$", "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // Brazilian: 1.234,56
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        // American: 1,234.56
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        // 1234,56
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    let body = normalized.strip_prefix('-').unwrap_or(&normalized);
    let well_formed = body.chars().any(|c| c.is_ascii_digit())
        && body.chars().all(|c| c.is_ascii_digit() || c == '.')
        && body.matches('.').count() <= 1;
    if !well_formed {
        return Err(invalid());
    }

    Decimal::from_str(&normalized).map_err(|_| invalid())
}

/// Convert an amount to integer centavos, rounding half away from zero.
///
/// Returns `None` if the result does not fit in an `i64`.
pub fn to_cents(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}
