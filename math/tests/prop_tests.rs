use proptest::prelude::*;

use puddel_math::{mul_div, mul_div_up, sqrt, sqrt_product, MathError};

proptest! {
    /// sqrt is the floor square root: r^2 <= y < (r+1)^2.
    #[test]
    fn sqrt_is_floor_root(y in any::<u128>()) {
        let r = sqrt(y);
        prop_assert!(r.checked_mul(r).map_or(false, |sq| sq <= y));
        let next = r + 1;
        prop_assert!(next.checked_mul(next).map_or(true, |sq| sq > y));
    }

    /// The 256-bit product root agrees with the narrow root when the product fits.
    #[test]
    fn sqrt_product_matches_narrow(a in 0u128..(1u128 << 64), b in 0u128..(1u128 << 64)) {
        prop_assert_eq!(sqrt_product(a, b), sqrt(a * b));
    }

    /// mul_div agrees with naive math whenever the naive product fits.
    #[test]
    fn mul_div_matches_naive(a in 0u128..(1u128 << 64), b in 0u128..(1u128 << 64), d in 1u128..u128::MAX) {
        prop_assert_eq!(mul_div(a, b, d).unwrap(), a * b / d);
    }

    /// Rounding up differs from rounding down by at most one.
    #[test]
    fn mul_div_up_bounds(a in any::<u64>(), b in any::<u64>(), d in 1u128..1_000_000) {
        let (a, b) = (a as u128, b as u128);
        let down = mul_div(a, b, d).unwrap();
        let up = mul_div_up(a, b, d).unwrap();
        prop_assert!(up == down || up == down + 1);
    }

    /// x * y / y == x when y is non-zero (no precision loss through the wide path).
    #[test]
    fn mul_div_inverse(x in any::<u128>(), y in 1u128..u128::MAX) {
        prop_assert_eq!(mul_div(x, y, y), Ok(x));
    }

    #[test]
    fn mul_div_zero_denominator_always_errors(a in any::<u128>(), b in any::<u128>()) {
        prop_assert_eq!(mul_div(a, b, 0), Err(MathError::DivisionByZero));
    }
}
