//! Error types for the Hourglass core.
use thiserror::Error;

use crate::address::Address;
use crate::types::Hash256;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("uint64 addition overflow")] AdditionOverflow,
    #[error("uint64 subtraction underflow")] SubtractionUnderflow,
    #[error("uint64 multiplication overflow")] MultiplicationOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty amount")] Empty,
    #[error("invalid character {0:?} in amount")] InvalidCharacter(char),
    #[error("too many decimal places")] TooManyDecimals,
    #[error("amount too large")] Overflow,
    #[error("invalid hours: {0}")] InvalidHours(String),
    #[error("invalid share factor: {0}")] InvalidShareFactor(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58 encoding")] InvalidBase58,
    #[error("invalid length: {0}")] InvalidLength(usize),
    #[error("invalid checksum")] InvalidChecksum,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid secret key")] InvalidSecretKey,
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid signature bytes")] InvalidSignature,
    #[error("signing failed")] SigningFailed,
    #[error("null signature")] NullSignature,
    #[error("signature does not match address {0}")] AddressMismatch(Address),
    #[error("input index out of bounds: {index} >= {len}")] InputIndexOutOfBounds { index: usize, len: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid hex: {0}")] InvalidHex(String),
    #[error("truncated transaction: needed {needed} more bytes")] Truncated { needed: usize },
    #[error("{count} {section} do not fit in the remaining {remaining} bytes")] CountTooLarge { section: &'static str, count: u32, remaining: usize },
    #[error("{0} trailing bytes after transaction")] TrailingBytes(usize),
}

/// Structural rules; a transaction violating one can never become valid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HardConstraint {
    #[error("Invalid transaction type {0}")] InvalidType(u8),
    #[error("No inputs")] NoInputs,
    #[error("No outputs")] NoOutputs,
    #[error("Invalid number of signatures: {signatures} signatures for {inputs} inputs")] SignatureCountMismatch { signatures: usize, inputs: usize },
    #[error("Transaction length {declared} does not match encoded length {actual}")] LengthMismatch { declared: u32, actual: usize },
    #[error("Invalid inner hash")] InnerHashMismatch,
    #[error("Duplicate spend: {0}")] DuplicateInput(Hash256),
    #[error("Duplicate output in transaction")] DuplicateOutput,
    #[error("Zero coin output at index {0}")] ZeroCoinOutput(usize),
    #[error("Unspent output of {0} does not exist")] UnknownInput(Hash256),
    #[error("Transactions may not create or destroy coins: inputs {inputs}, outputs {outputs}")] CoinsNotConserved { inputs: u64, outputs: u64 },
    #[error("Insufficient coinhours for transaction outputs: inputs {inputs}, outputs {outputs}")] InsufficientHours { inputs: u64, outputs: u64 },
    #[error("Unsigned input in transaction")] UnsignedInput(usize),
    #[error("Unsigned transaction must contain a null signature")] SignedInput(usize),
    #[error("Signature not valid for output being spent at input {index}: {source}")] InvalidSignature { index: usize, source: CryptoError },
    #[error("{context} error: {source}")] Overflow { context: &'static str, source: ArithmeticError },
}

/// Policy rules; a violation depends on the verification profile in force.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SoftConstraint {
    #[error("Transaction output {0} has too many decimal places")] TooManyDecimals(usize),
    #[error("Transaction size {size} bytes exceeds maximum of {max}")] Oversized { size: usize, max: usize },
    #[error("Transaction coinhour fee {fee} is below the required burn of {required}")] InsufficientFee { fee: u64, required: u64 },
    #[error("Transaction has zero coinhour fee")] ZeroFee,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Transaction violates hard constraint: {0}")] Hard(#[from] HardConstraint),
    #[error("Transaction violates soft constraint: {0}")] Soft(#[from] SoftConstraint),
}

impl VerifyError {
    /// Hard violations can never be fixed by changing policy.
    pub fn is_hard(&self) -> bool {
        matches!(self, VerifyError::Hard(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("burn factor must be at least 1")] ZeroBurnFactor,
    #[error("max decimals {0} exceeds droplet precision")] TooManyDecimals(u8),
    #[error("max transaction size must be non-zero")] ZeroMaxSize,
}
