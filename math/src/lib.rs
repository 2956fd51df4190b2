//! Fixed-point safe math for the exchange core.
//!
//! All amounts are raw `u128` units. Every operation that can overflow,
//! underflow or divide by zero returns a [`MathError`] instead of wrapping or
//! panicking. Products that may exceed 128 bits go through a 256-bit
//! intermediate ([`U256`]).

pub mod bps;
pub mod error;
pub mod safe;
pub mod serde_u256;
pub mod wide;

pub use bps::{apply_bps, BPS_DENOMINATOR};
pub use error::MathError;
pub use safe::SafeMath;
pub use wide::{mul_div, mul_div_up, product, sqrt, sqrt_product, to_u128, U256};
