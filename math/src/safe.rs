//! Checked arithmetic on raw amounts.

use crate::error::MathError;

/// Checked arithmetic that reports which way it failed.
pub trait SafeMath: Sized {
    fn safe_add(self, rhs: Self) -> Result<Self, MathError>;
    fn safe_sub(self, rhs: Self) -> Result<Self, MathError>;
    fn safe_mul(self, rhs: Self) -> Result<Self, MathError>;
    fn safe_div(self, rhs: Self) -> Result<Self, MathError>;
}

impl SafeMath for u128 {
    fn safe_add(self, rhs: Self) -> Result<Self, MathError> {
        self.checked_add(rhs).ok_or(MathError::Overflow)
    }

    fn safe_sub(self, rhs: Self) -> Result<Self, MathError> {
        self.checked_sub(rhs).ok_or(MathError::Underflow)
    }

    fn safe_mul(self, rhs: Self) -> Result<Self, MathError> {
        self.checked_mul(rhs).ok_or(MathError::Overflow)
    }

    fn safe_div(self, rhs: Self) -> Result<Self, MathError> {
        self.checked_div(rhs).ok_or(MathError::DivisionByZero)
    }
}
