//! Transaction verification.
//!
//! Two tiers, both pure and both required to pass:
//!
//! - **Hard constraints** ([`verify_hard_constraints`]): structural rules. A
//!   transaction violating one can never become valid under any policy.
//! - **Soft constraints** ([`verify_soft_constraints`]): policy rules taken
//!   from a [`VerifyProfile`]: coin precision, size, minimum burn.
//!
//! [`verify_transaction`] resolves the inputs from a snapshot and runs both.
//! Every function returns the first violation found and never mutates the
//! transaction.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::accrual;
use crate::constants::TX_TYPE;
use crate::crypto;
use crate::droplet;
use crate::error::{ArithmeticError, HardConstraint, SoftConstraint, VerifyError};
use crate::fee;
use crate::math;
use crate::policy::VerifyProfile;
use crate::traits::UnspentSet;
use crate::types::{Transaction, UnspentOutput};

/// What the caller asserts about the signature slots.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SignatureMode {
    /// Every slot must hold the null signature.
    Unsigned,
    /// Every slot must hold a valid signature by the input's owner.
    Signed,
}

/// Totals of a transaction that passed verification.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VerifiedTransaction {
    pub input_coins: u64,
    /// Accrued hours of the inputs at verification time.
    pub input_hours: u64,
    pub output_coins: u64,
    pub output_hours: u64,
    /// `input_hours - output_hours`.
    pub fee: u64,
    /// Encoded size in bytes.
    pub size: usize,
}

/// Context-free hard constraints.
///
/// - Transaction type, at least one input and one output
/// - One signature slot per input
/// - Declared length and inner hash match the body
/// - No duplicate inputs, no duplicate outputs, no zero-coin outputs
/// - Output totals do not overflow
pub fn verify_structure(tx: &Transaction) -> Result<(), HardConstraint> {
    if tx.tx_type != TX_TYPE {
        return Err(HardConstraint::InvalidType(tx.tx_type));
    }
    if tx.inputs.is_empty() {
        return Err(HardConstraint::NoInputs);
    }
    if tx.outputs.is_empty() {
        return Err(HardConstraint::NoOutputs);
    }
    if tx.signatures.len() != tx.inputs.len() {
        return Err(HardConstraint::SignatureCountMismatch {
            signatures: tx.signatures.len(),
            inputs: tx.inputs.len(),
        });
    }

    let actual = tx.encoded_len();
    if tx.length as usize != actual {
        return Err(HardConstraint::LengthMismatch {
            declared: tx.length,
            actual,
        });
    }
    if tx.inner_hash != tx.compute_inner_hash() {
        return Err(HardConstraint::InnerHashMismatch);
    }

    let mut seen = HashSet::with_capacity(tx.inputs.len());
    for input in &tx.inputs {
        if !seen.insert(input) {
            return Err(HardConstraint::DuplicateInput(*input));
        }
    }

    let mut seen = HashSet::with_capacity(tx.outputs.len());
    for (i, output) in tx.outputs.iter().enumerate() {
        if output.coins == 0 {
            return Err(HardConstraint::ZeroCoinOutput(i));
        }
        if !seen.insert(output) {
            return Err(HardConstraint::DuplicateOutput);
        }
    }

    tx.output_coins().map_err(overflow("total output coins"))?;
    tx.output_hours().map_err(overflow("total output hours"))?;

    Ok(())
}

fn overflow(context: &'static str) -> impl Fn(ArithmeticError) -> HardConstraint {
    move |source| HardConstraint::Overflow { context, source }
}

/// Look up every input of `tx` in `snapshot`, in input order.
pub fn resolve_inputs<S>(tx: &Transaction, snapshot: &S) -> Result<Vec<UnspentOutput>, HardConstraint>
where
    S: UnspentSet + ?Sized,
{
    tx.inputs
        .iter()
        .map(|hash| {
            snapshot
                .get(hash)
                .cloned()
                .ok_or(HardConstraint::UnknownInput(*hash))
        })
        .collect()
}

/// All hard constraints.
///
/// `inputs` are the outputs spent by `tx`, in input order; hours are accrued
/// up to `now`. Beyond [`verify_structure`] this checks coin conservation,
/// that the outputs carry no more hours than the inputs, and the signature
/// slots against `mode`.
pub fn verify_hard_constraints(
    tx: &Transaction,
    inputs: &[UnspentOutput],
    now: u64,
    mode: SignatureMode,
) -> Result<VerifiedTransaction, HardConstraint> {
    verify_structure(tx)?;
    verify_spend(tx, inputs, now, mode)
}

fn verify_spend(
    tx: &Transaction,
    inputs: &[UnspentOutput],
    now: u64,
    mode: SignatureMode,
) -> Result<VerifiedTransaction, HardConstraint> {
    for (i, hash) in tx.inputs.iter().enumerate() {
        if inputs.get(i).map(|u| &u.hash) != Some(hash) {
            return Err(HardConstraint::UnknownInput(*hash));
        }
    }
    let inputs = &inputs[..tx.inputs.len()];

    let input_coins =
        math::sum_u64(inputs.iter().map(|u| u.coins)).map_err(overflow("total input coins"))?;
    let input_hours = math::sum_u64(inputs.iter().map(|u| accrual::accrued_hours(u, now)))
        .map_err(overflow("total input hours"))?;
    let output_coins = tx.output_coins().map_err(overflow("total output coins"))?;
    let output_hours = tx.output_hours().map_err(overflow("total output hours"))?;

    if input_coins != output_coins {
        return Err(HardConstraint::CoinsNotConserved {
            inputs: input_coins,
            outputs: output_coins,
        });
    }
    if input_hours < output_hours {
        return Err(HardConstraint::InsufficientHours {
            inputs: input_hours,
            outputs: output_hours,
        });
    }

    match mode {
        SignatureMode::Unsigned => {
            if let Some(i) = tx.signatures.iter().position(|s| !s.is_null()) {
                return Err(HardConstraint::SignedInput(i));
            }
        }
        SignatureMode::Signed => {
            if let Some(i) = tx.signatures.iter().position(|s| s.is_null()) {
                return Err(HardConstraint::UnsignedInput(i));
            }
            for (index, input) in inputs.iter().enumerate() {
                crypto::verify_transaction_input(tx, index, &input.address)
                    .map_err(|source| HardConstraint::InvalidSignature { index, source })?;
            }
        }
    }

    Ok(VerifiedTransaction {
        input_coins,
        input_hours,
        output_coins,
        output_hours,
        fee: input_hours - output_hours,
        size: tx.encoded_len(),
    })
}

/// Soft constraints under `profile`, given the totals from the hard pass.
pub fn verify_soft_constraints(
    tx: &Transaction,
    summary: &VerifiedTransaction,
    profile: &VerifyProfile,
) -> Result<(), VerifyError> {
    for (i, output) in tx.outputs.iter().enumerate() {
        if droplet::check_precision(output.coins, profile.max_decimals).is_err() {
            return Err(SoftConstraint::TooManyDecimals(i).into());
        }
    }

    if summary.size > profile.max_tx_size {
        return Err(SoftConstraint::Oversized {
            size: summary.size,
            max: profile.max_tx_size,
        }
        .into());
    }

    fee::check_fee(summary.input_hours, summary.output_hours, profile.burn_factor)?;
    Ok(())
}

/// Full verification of `tx` against a snapshot at time `now`.
pub fn verify_transaction<S>(
    tx: &Transaction,
    snapshot: &S,
    now: u64,
    profile: &VerifyProfile,
    mode: SignatureMode,
) -> Result<VerifiedTransaction, VerifyError>
where
    S: UnspentSet + ?Sized,
{
    verify_structure(tx)?;
    let inputs = resolve_inputs(tx, snapshot)?;
    let summary = verify_spend(tx, &inputs, now, mode)?;
    verify_soft_constraints(tx, &summary, profile)?;
    Ok(summary)
}
