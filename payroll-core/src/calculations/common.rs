//! Currency rounding shared by the salary calculations.
//!
//! Every monetary figure leaving the engine is quantized to the minor
//! currency unit (one thousandth of the main unit). Bracket sums are
//! carried at full decimal precision and only rounded on output.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places in the minor currency unit.
pub const MINOR_UNIT_SCALE: u32 = 3;

/// The smallest representable currency increment, `0.001`.
pub fn minor_unit() -> Decimal {
    Decimal::new(1, MINOR_UNIT_SCALE)
}

/// Rounds a decimal value to the minor currency unit using half-up rounding.
///
/// Values exactly halfway between two minor units are rounded away from
/// zero, so `0.0005` becomes `0.001`.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use payroll_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(757.4004)), dec!(757.400));
/// assert_eq!(round_half_up(dec!(757.4005)), dec!(757.401));
/// assert_eq!(round_half_up(dec!(-12.3455)), dec!(-12.346)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    // Keep a fixed scale so `1000` and `1000.000` print the same way.
    rounded.rescale(MINOR_UNIT_SCALE);
    rounded
}

/// Returns the maximum of two decimal values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}
