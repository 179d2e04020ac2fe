//! Integer-cent money helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount inside the costing pipeline is an `i64` count of cents;
//! `rust_decimal::Decimal` is only used at the edges (display, parsing).

use rust_decimal::prelude::*;
use thiserror::Error;

/// A signed monetary amount in cents.
pub type Cents = i64;

/// Errors converting between decimal amounts and cents.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount has more precision than one cent.
    #[error("Amount {0} has sub-cent precision")]
    SubCentPrecision(Decimal),

    /// The amount does not fit in an `i64` count of cents.
    #[error("Amount {0} is out of range")]
    OutOfRange(Decimal),
}

/// Converts a cent count into a two-decimal amount (e.g. `12345` -> `123.45`).
#[must_use]
pub fn cents_to_decimal(cents: Cents) -> Decimal {
    Decimal::new(cents, 2)
}

/// Converts a decimal amount into cents.
///
/// Rejects amounts with sub-cent precision instead of rounding them.
pub fn decimal_to_cents(amount: Decimal) -> Result<Cents, MoneyError> {
    let scaled = amount * Decimal::ONE_HUNDRED;
    if scaled.fract() != Decimal::ZERO {
        return Err(MoneyError::SubCentPrecision(amount));
    }
    scaled.to_i64().ok_or(MoneyError::OutOfRange(amount))
}

/// Formats cents as a dollar string, e.g. `-1050` -> `-$10.50`.
#[must_use]
pub fn format_cents(cents: Cents) -> String {
    let amount = cents_to_decimal(cents.abs());
    if cents < 0 {
        format!("-${amount:.2}")
    } else {
        format!("${amount:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cents_to_decimal() {
        assert_eq!(cents_to_decimal(12345), dec!(123.45));
        assert_eq!(cents_to_decimal(-5), dec!(-0.05));
        assert_eq!(cents_to_decimal(0), Decimal::ZERO);
    }

    #[test]
    fn test_decimal_to_cents() {
        assert_eq!(decimal_to_cents(dec!(123.45)), Ok(12345));
        assert_eq!(decimal_to_cents(dec!(-0.05)), Ok(-5));
        assert_eq!(decimal_to_cents(dec!(10)), Ok(1000));
    }

    #[test]
    fn test_decimal_to_cents_rejects_sub_cent() {
        assert_eq!(
            decimal_to_cents(dec!(1.005)),
            Err(MoneyError::SubCentPrecision(dec!(1.005)))
        );
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(12345), "$123.45");
        assert_eq!(format_cents(-1050), "-$10.50");
        assert_eq!(format_cents(7), "$0.07");
    }
}
