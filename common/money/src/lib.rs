use bigdecimal::{BigDecimal, Signed, ToPrimitive};
use thiserror::Error;
use tracing::warn;

/// Minor units per major unit (cents per peso).
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount {0} does not fit in minor units")]
    OutOfRange(String),
}

/// Normalize a monetary value to 2 decimal places, rounding half away from zero.
pub fn normalize_scale(value: &BigDecimal) -> BigDecimal {
    value.round(2).with_scale(2)
}

/// Convert a decimal amount into integer minor units.
///
/// The amount is scaled by 100 before it is reduced to an integer, so a value
/// like `24.24` becomes `2424` rather than losing a cent to an early truncation.
/// Sub-cent remainders round half to even: `0.125` gives `12`, `0.135` gives `14`.
pub fn to_minor_units(amount: &BigDecimal) -> Result<i64, MoneyError> {
    let out_of_range = || {
        warn!(amount = %amount, "amount out of range for minor units");
        MoneyError::OutOfRange(amount.to_string())
    };
    let scaled = amount.clone() * BigDecimal::from(MINOR_UNITS_PER_MAJOR);
    // with_scale(0) drops the fraction toward zero
    let truncated = scaled.with_scale(0);
    let remainder = (&scaled - &truncated).abs();
    let integral = truncated.to_i64().ok_or_else(out_of_range)?;

    let half = BigDecimal::new(5.into(), 1);
    let away = remainder > half || (remainder == half && integral % 2 != 0);
    if !away {
        return Ok(integral);
    }
    let step = if scaled.is_negative() { -1 } else { 1 };
    integral.checked_add(step).ok_or_else(out_of_range)
}

/// Convert integer minor units back into a decimal amount with scale 2.
pub fn from_minor_units(minor: i64) -> BigDecimal {
    (BigDecimal::from(minor) / BigDecimal::from(MINOR_UNITS_PER_MAJOR)).with_scale(2)
}
