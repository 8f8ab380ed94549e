//! Verification profiles.
//!
//! A profile bundles the soft-constraint parameters in force for one
//! verification context. Profiles are plain values passed to every call that
//! needs them; several can coexist in one process.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BURN_FACTOR, DEFAULT_MAX_TX_SIZE, DEFAULT_USER_DECIMALS, MAX_DECIMALS};
use crate::error::ProfileError;

/// Soft-constraint parameters.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct VerifyProfile {
    /// Minimum burn: outputs may carry at most `input_hours / burn_factor`.
    pub burn_factor: u64,
    /// Maximum encoded transaction size in bytes.
    pub max_tx_size: usize,
    /// Decimal places allowed in output coin amounts.
    pub max_decimals: u8,
}

impl VerifyProfile {
    /// Rules for transactions submitted by users.
    pub const fn user() -> Self {
        Self {
            burn_factor: DEFAULT_BURN_FACTOR,
            max_tx_size: DEFAULT_MAX_TX_SIZE,
            max_decimals: DEFAULT_USER_DECIMALS,
        }
    }

    /// Rules for transactions already accepted into the ledger.
    pub const fn ledger() -> Self {
        Self {
            burn_factor: DEFAULT_BURN_FACTOR,
            max_tx_size: DEFAULT_MAX_TX_SIZE,
            max_decimals: MAX_DECIMALS,
        }
    }

    /// Relaxed rules for local previews: no burn, full precision.
    pub const fn preview() -> Self {
        Self {
            burn_factor: 1,
            max_tx_size: DEFAULT_MAX_TX_SIZE,
            max_decimals: MAX_DECIMALS,
        }
    }

    /// Look up a named profile.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "user" => Some(Self::user()),
            "ledger" => Some(Self::ledger()),
            "preview" => Some(Self::preview()),
            _ => None,
        }
    }

    /// Reject parameter combinations no transaction could satisfy sensibly.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.burn_factor == 0 {
            return Err(ProfileError::ZeroBurnFactor);
        }
        if self.max_decimals > MAX_DECIMALS {
            return Err(ProfileError::TooManyDecimals(self.max_decimals));
        }
        if self.max_tx_size == 0 {
            return Err(ProfileError::ZeroMaxSize);
        }
        Ok(())
    }
}

impl Default for VerifyProfile {
    fn default() -> Self {
        Self::user()
    }
}
