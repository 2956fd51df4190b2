//! 256-bit intermediates: mul-div without overflow and integer square roots.

use crate::error::MathError;

mod u256 {
    #![allow(clippy::assign_op_pattern, clippy::ptr_offset_with_cast, clippy::manual_range_contains)]
    use uint::construct_uint;

    construct_uint! {
        /// 256-bit unsigned integer.
        pub struct U256(4);
    }
}

pub use u256::U256;

/// The full 256-bit product of two amounts. Never overflows.
pub fn product(a: u128, b: u128) -> U256 {
    U256::from(a) * U256::from(b)
}

/// Narrow a 256-bit value back to `u128`.
pub fn to_u128(value: U256) -> Result<u128, MathError> {
    if value > U256::from(u128::MAX) {
        return Err(MathError::Overflow);
    }
    Ok(value.low_u128())
}

/// `a * b / denominator`, rounded down, with a 256-bit intermediate.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, MathError> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }
    to_u128(product(a, b) / U256::from(denominator))
}

/// `a * b / denominator`, rounded up.
pub fn mul_div_up(a: u128, b: u128, denominator: u128) -> Result<u128, MathError> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }
    let den = U256::from(denominator);
    let p = product(a, b);
    let mut q = p / den;
    if !(p % den).is_zero() {
        q += U256::one();
    }
    to_u128(q)
}

/// Floor square root of a `u128` (Newton iteration).
pub fn sqrt(y: u128) -> u128 {
    if y < 4 {
        return if y == 0 { 0 } else { 1 };
    }
    let mut z = y;
    let mut x = y / 2 + 1;
    while x < z {
        z = x;
        x = (y / x + x) / 2;
    }
    z
}

/// Floor of `sqrt(a * b)`; the product is taken at 256 bits so it cannot overflow.
pub fn sqrt_product(a: u128, b: u128) -> u128 {
    // sqrt of a value below 2^256 is below 2^128.
    product(a, b).integer_sqrt().low_u128()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_survives_wide_intermediate() {
        let big = u128::MAX / 3;
        assert_eq!(mul_div(big, 6, 3).unwrap(), big * 2);
    }

    #[test]
    fn mul_div_reports_overflowing_result() {
        assert_eq!(mul_div(u128::MAX, 2, 1), Err(MathError::Overflow));
    }

    #[test]
    fn mul_div_zero_denominator() {
        assert_eq!(mul_div(1, 1, 0), Err(MathError::DivisionByZero));
        assert_eq!(mul_div_up(1, 1, 0), Err(MathError::DivisionByZero));
    }

    #[test]
    fn mul_div_up_rounds_only_when_inexact() {
        assert_eq!(mul_div_up(10, 10, 3).unwrap(), 34);
        assert_eq!(mul_div_up(10, 9, 3).unwrap(), 30);
    }

    #[test]
    fn sqrt_small_values() {
        assert_eq!(sqrt(0), 0);
        assert_eq!(sqrt(1), 1);
        assert_eq!(sqrt(3), 1);
        assert_eq!(sqrt(4), 2);
        assert_eq!(sqrt(99), 9);
        assert_eq!(sqrt(100), 10);
    }

    #[test]
    fn sqrt_max() {
        let r = sqrt(u128::MAX);
        assert_eq!(r, u64::MAX as u128);
    }

    #[test]
    fn sqrt_product_beyond_u128() {
        let a = 1u128 << 100;
        let b = 1u128 << 100;
        assert_eq!(sqrt_product(a, b), 1u128 << 100);
        assert_eq!(sqrt_product(1_000, 4_000), 2_000);
    }

    #[test]
    fn to_u128_bounds() {
        assert_eq!(to_u128(U256::from(u128::MAX)).unwrap(), u128::MAX);
        assert_eq!(
            to_u128(U256::from(u128::MAX) + U256::one()),
            Err(MathError::Overflow)
        );
    }
}
