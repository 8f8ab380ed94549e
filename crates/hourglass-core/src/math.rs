//! Overflow-checked u64 arithmetic for coin and hour quantities.
//!
//! Every accumulation in selection, distribution and verification goes
//! through these helpers so that an overflow surfaces as an error instead of
//! wrapping.

use crate::error::ArithmeticError;

/// `a + b`, failing on overflow.
pub fn add_u64(a: u64, b: u64) -> Result<u64, ArithmeticError> {
    a.checked_add(b).ok_or(ArithmeticError::AdditionOverflow)
}

/// `a - b`, failing on underflow.
pub fn sub_u64(a: u64, b: u64) -> Result<u64, ArithmeticError> {
    a.checked_sub(b).ok_or(ArithmeticError::SubtractionUnderflow)
}

/// `a * b`, failing on overflow.
pub fn mul_u64(a: u64, b: u64) -> Result<u64, ArithmeticError> {
    a.checked_mul(b).ok_or(ArithmeticError::MultiplicationOverflow)
}

/// Checked sum of a sequence of values.
pub fn sum_u64<I>(values: I) -> Result<u64, ArithmeticError>
where
    I: IntoIterator<Item = u64>,
{
    values.into_iter().try_fold(0u64, add_u64)
}
