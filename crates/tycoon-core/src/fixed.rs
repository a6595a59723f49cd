use fixed::types::I32F32;
use rust_decimal::Decimal;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Money balances, incomes and costs. Idle-game money outgrows the
/// `Fixed64` integer range quickly, so money is decimal.
pub type Money = Decimal;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Decimal places kept when a `Fixed64` is converted to [`Money`].
const DECIMAL_SCALE: u32 = 10;
const DECIMAL_FACTOR: i128 = 10_000_000_000;

/// Exact conversion of a fixed-point value to money, truncated to ten
/// decimal places. Integer-only, so it is safe inside the tick.
pub fn fixed_to_decimal(v: Fixed64) -> Decimal {
    let bits = v.to_bits() as i128;
    let scaled = (bits * DECIMAL_FACTOR) >> 32;
    Decimal::from_i128_with_scale(scaled, DECIMAL_SCALE)
}

/// Multiplier `1 + percent / 100`, floored at `floor`.
#[inline]
pub fn percent_multiplier(percent: Fixed64, floor: Fixed64) -> Fixed64 {
    let m = Fixed64::ONE.saturating_add(percent / Fixed64::from_num(100));
    m.max(floor)
}

/// Convert a count to Fixed64, saturating at `Fixed64::MAX`.
#[inline]
pub fn count_to_fixed(count: u64) -> Fixed64 {
    Fixed64::saturating_from_num(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_to_decimal_exact_for_binary_fractions() {
        assert_eq!(fixed_to_decimal(Fixed64::from_num(1.25)), Decimal::new(125, 2));
        assert_eq!(fixed_to_decimal(Fixed64::from_num(-3)), Decimal::from(-3));
        assert_eq!(fixed_to_decimal(Fixed64::ZERO), Decimal::ZERO);
    }

    #[test]
    fn percent_multiplier_applies_floor() {
        let floor = Fixed64::from_num(0.1);
        assert_eq!(percent_multiplier(Fixed64::from_num(50), floor), Fixed64::from_num(1.5));
        assert_eq!(percent_multiplier(Fixed64::from_num(-200), floor), floor);
    }

    #[test]
    fn count_to_fixed_saturates() {
        assert_eq!(count_to_fixed(7), Fixed64::from_num(7));
        assert_eq!(count_to_fixed(u64::MAX), Fixed64::MAX);
    }
}
