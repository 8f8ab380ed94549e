//! Wallet error types.

use hourglass_core::address::Address;
use hourglass_core::error::{
    AddressError, AmountError, ArithmeticError, CryptoError, DecodeError, HardConstraint,
    ProfileError, VerifyError,
};
use hourglass_core::types::Hash256;
use thiserror::Error;

/// Errors raised while selecting, building or signing a transaction.
///
/// Every error is terminal for the call that raised it; nothing partially
/// built is returned alongside.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// A checked sum over request or input values overflowed.
    #[error("{context} error: {source}")]
    ArithmeticOverflow {
        /// Which total overflowed.
        context: &'static str,
        source: ArithmeticError,
    },

    /// The candidate outputs do not hold enough coins.
    #[error("balance is not sufficient: have {have}, need {need}")]
    InsufficientBalance {
        /// Coins available in droplets.
        have: u64,
        /// Coins requested in droplets.
        need: u64,
    },

    /// The selected outputs do not hold enough hours for the request and the burn.
    #[error("hours are not sufficient: have {have}, need {need}")]
    InsufficientHours {
        /// Accrued input hours available.
        have: u64,
        /// Input hours required.
        need: u64,
    },

    /// An explicitly requested output is not in the snapshot.
    #[error("unspent output of {0} does not exist")]
    UnknownOutput(Hash256),

    /// An explicitly requested output belongs to an address outside the wallet.
    #[error("unspent output {0} is not owned by any address in the wallet")]
    OutputNotOwned(Hash256),

    /// A requested source address is not a wallet address.
    #[error("address {0} not found in wallet")]
    AddressNotInWallet(Address),

    /// Destination `index` uses more decimal places than the profile allows.
    #[error("to[{index}].coins has too many decimal places")]
    InvalidDecimalPrecision { index: usize },

    /// No signing key is available for an input's owner.
    #[error("no key available for address {0}")]
    UnknownAddress(Address),

    /// The request is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The transaction violates a hard or soft constraint.
    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

impl From<HardConstraint> for WalletError {
    fn from(e: HardConstraint) -> Self {
        WalletError::Verify(e.into())
    }
}

/// Adapter for `map_err` on checked arithmetic.
pub(crate) fn overflow(context: &'static str) -> impl Fn(ArithmeticError) -> WalletError {
    move |source| WalletError::ArithmeticOverflow { context, source }
}
