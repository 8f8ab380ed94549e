//! Coin-hour burn policy.
//!
//! Every transaction destroys part of the hours it consumes. With burn factor
//! `bf`, at most `total / bf` hours may reappear in the outputs; the rest is
//! the fee. A burn factor of 1 disables the burn.

use crate::error::{HardConstraint, SoftConstraint, VerifyError};

/// Largest number of hours the outputs may carry.
pub fn remaining_hours(total_input_hours: u64, burn_factor: u64) -> u64 {
    total_input_hours / burn_factor.max(1)
}

/// Minimum number of hours that must be burned.
pub fn required_fee(total_input_hours: u64, burn_factor: u64) -> u64 {
    total_input_hours - remaining_hours(total_input_hours, burn_factor)
}

/// Check the hours of a transaction against the burn policy.
///
/// Creating hours is a hard violation. Burning less than
/// [`required_fee`], or nothing at all while a burn is in force, is a soft
/// one. Returns the fee on success.
pub fn check_fee(input_hours: u64, output_hours: u64, burn_factor: u64) -> Result<u64, VerifyError> {
    if input_hours < output_hours {
        return Err(HardConstraint::InsufficientHours {
            inputs: input_hours,
            outputs: output_hours,
        }
        .into());
    }

    let fee = input_hours - output_hours;
    let required = required_fee(input_hours, burn_factor);
    if fee < required {
        return Err(SoftConstraint::InsufficientFee { fee, required }.into());
    }
    if burn_factor > 1 && fee == 0 {
        return Err(SoftConstraint::ZeroFee.into());
    }
    Ok(fee)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_and_required() {
        assert_eq!(remaining_hours(20, 2), 10);
        assert_eq!(required_fee(20, 2), 10);
        assert_eq!(remaining_hours(21, 2), 10);
        assert_eq!(required_fee(21, 2), 11);
        assert_eq!(remaining_hours(10, 3), 3);
        assert_eq!(required_fee(10, 3), 7);
    }

    #[test]
    fn burn_factor_one_disables_burn() {
        assert_eq!(remaining_hours(17, 1), 17);
        assert_eq!(required_fee(17, 1), 0);
        assert_eq!(check_fee(17, 17, 1), Ok(0));
    }

    #[test]
    fn zero_burn_factor_treated_as_one() {
        assert_eq!(remaining_hours(9, 0), 9);
    }

    #[test]
    fn extreme_totals() {
        assert_eq!(remaining_hours(u64::MAX, 2), u64::MAX / 2);
        assert_eq!(required_fee(u64::MAX, 2), u64::MAX - u64::MAX / 2);
    }

    #[test]
    fn check_fee_accepts_exact_burn() {
        assert_eq!(check_fee(20, 10, 2), Ok(10));
        assert_eq!(check_fee(20, 0, 2), Ok(20));
    }

    #[test]
    fn check_fee_rejects_underburn() {
        assert_eq!(
            check_fee(20, 11, 2),
            Err(SoftConstraint::InsufficientFee { fee: 9, required: 10 }.into())
        );
    }

    #[test]
    fn check_fee_rejects_created_hours() {
        let err = check_fee(5, 6, 1).unwrap_err();
        assert!(err.is_hard());
    }

    #[test]
    fn check_fee_rejects_zero_fee_with_burn() {
        assert_eq!(check_fee(0, 0, 2), Err(SoftConstraint::ZeroFee.into()));
        assert_eq!(check_fee(0, 0, 1), Ok(0));
    }
}
