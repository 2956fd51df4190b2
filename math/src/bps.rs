//! Basis-point helpers.

use crate::error::MathError;
use crate::wide::mul_div;

/// 100% in basis points.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// `amount * bps / 10000`, rounded down.
pub fn apply_bps(amount: u128, bps: u32) -> Result<u128, MathError> {
    mul_div(amount, bps as u128, BPS_DENOMINATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_percent() {
        assert_eq!(apply_bps(1_000_000, 25).unwrap(), 2_500);
    }

    #[test]
    fn full_amount_at_ten_thousand() {
        assert_eq!(apply_bps(u128::MAX, 10_000).unwrap(), u128::MAX);
    }

    #[test]
    fn rounds_down() {
        assert_eq!(apply_bps(3, 5_000).unwrap(), 1);
    }
}
