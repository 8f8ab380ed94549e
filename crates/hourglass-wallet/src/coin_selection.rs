//! Coin and hour aware UTXO selection.
//!
//! Builds the candidate set from the request's input source, then either
//! consumes an explicit list whole or greedily accumulates the largest
//! outputs first until both the coin target and the hour requirement are met.
//!
//! Greedy order is a total order: coins descending, then accrued hours
//! descending, then hash ascending. Large outputs first keeps the input count
//! (and so the transaction size) small.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use hourglass_core::accrual;
use hourglass_core::address::Address;
use hourglass_core::fee;
use hourglass_core::math;
use hourglass_core::traits::UnspentSet;
use hourglass_core::types::UnspentOutput;

use crate::error::{overflow, WalletError};
use crate::request::InputSource;

/// An unspent output with its hours accrued at selection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedInput {
    pub output: UnspentOutput,
    /// Accrued hours at `now`.
    pub hours: u64,
}

/// Outputs eligible for a spend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidates {
    pub outputs: Vec<UnspentOutput>,
    /// The caller named these outputs explicitly; all of them are spent.
    pub consume_all: bool,
}

/// What the selection must cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTarget {
    /// Droplets sent to destinations.
    pub coins: u64,
    /// Hours requested for destinations (manual mode), 0 otherwise.
    pub hours: u64,
    pub burn_factor: u64,
}

impl SelectionTarget {
    /// Whether inputs holding `hours` accrued hours can pay for this target.
    ///
    /// The budget `hours / burn_factor` must cover the requested hours, and
    /// with a burn in force there must be at least one hour to burn.
    pub fn hours_satisfied(&self, hours: u64) -> bool {
        fee::remaining_hours(hours, self.burn_factor) >= self.hours
            && (self.burn_factor <= 1 || hours > 0)
    }

    /// Smallest input hour total satisfying [`Self::hours_satisfied`].
    pub fn required_input_hours(&self) -> u64 {
        let needed = self.hours.saturating_mul(self.burn_factor.max(1));
        if self.burn_factor > 1 { needed.max(1) } else { needed }
    }
}

/// Result of coin selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinSelection {
    /// Inputs in the order they will appear in the transaction.
    pub selected: Vec<SelectedInput>,
    pub total_coins: u64,
    /// Sum of accrued hours.
    pub total_hours: u64,
}

/// Greedy coin selector.
pub struct CoinSelector;

impl CoinSelector {
    /// Resolve the candidate outputs for `source`.
    ///
    /// - `Outputs`: each must exist in the snapshot and be owned by a wallet
    ///   address; duplicates are rejected; order is kept.
    /// - `Addresses`: each must be a wallet address.
    /// - `All`: every output owned by the wallet.
    pub fn candidates<S>(
        snapshot: &S,
        wallet: &BTreeSet<Address>,
        source: &InputSource,
    ) -> Result<Candidates, WalletError>
    where
        S: UnspentSet + ?Sized,
    {
        match source {
            InputSource::Outputs(hashes) => {
                if hashes.is_empty() {
                    return Err(WalletError::InvalidRequest("no unspent outputs given".into()));
                }
                let mut seen = HashSet::with_capacity(hashes.len());
                let mut outputs = Vec::with_capacity(hashes.len());
                for hash in hashes {
                    if !seen.insert(hash) {
                        return Err(WalletError::InvalidRequest(format!(
                            "duplicate unspent output {hash}"
                        )));
                    }
                    let output = snapshot.get(hash).ok_or(WalletError::UnknownOutput(*hash))?;
                    if !wallet.contains(&output.address) {
                        return Err(WalletError::OutputNotOwned(*hash));
                    }
                    outputs.push(output.clone());
                }
                Ok(Candidates { outputs, consume_all: true })
            }
            InputSource::Addresses(addresses) => {
                if addresses.is_empty() {
                    return Err(WalletError::InvalidRequest("no addresses given".into()));
                }
                let mut subset = BTreeSet::new();
                for address in addresses {
                    if !wallet.contains(address) {
                        return Err(WalletError::AddressNotInWallet(*address));
                    }
                    subset.insert(*address);
                }
                let outputs = snapshot.owned_by(&subset).into_iter().cloned().collect();
                Ok(Candidates { outputs, consume_all: false })
            }
            InputSource::All => {
                let outputs = snapshot.owned_by(wallet).into_iter().cloned().collect();
                Ok(Candidates { outputs, consume_all: false })
            }
        }
    }

    /// Select inputs from `candidates` covering `target` at time `now`.
    pub fn select(
        candidates: Candidates,
        target: SelectionTarget,
        now: u64,
    ) -> Result<CoinSelection, WalletError> {
        let mut pool: Vec<SelectedInput> = candidates
            .outputs
            .into_iter()
            .map(|output| {
                let hours = accrual::accrued_hours(&output, now);
                SelectedInput { output, hours }
            })
            .collect();

        if candidates.consume_all {
            let total_coins = math::sum_u64(pool.iter().map(|s| s.output.coins))
                .map_err(overflow("total input coins"))?;
            let total_hours = math::sum_u64(pool.iter().map(|s| s.hours))
                .map_err(overflow("total input hours"))?;
            check_totals(total_coins, total_hours, &target)?;
            debug!(inputs = pool.len(), total_coins, total_hours, "consuming explicit outputs");
            return Ok(CoinSelection { selected: pool, total_coins, total_hours });
        }

        pool.sort_by(|a, b| {
            b.output
                .coins
                .cmp(&a.output.coins)
                .then(b.hours.cmp(&a.hours))
                .then(a.output.hash.cmp(&b.output.hash))
        });

        let mut selected = Vec::new();
        let mut total_coins: u64 = 0;
        let mut total_hours: u64 = 0;

        for input in pool {
            total_coins = math::add_u64(total_coins, input.output.coins)
                .map_err(overflow("total input coins"))?;
            total_hours = math::add_u64(total_hours, input.hours)
                .map_err(overflow("total input hours"))?;
            selected.push(input);

            if total_coins >= target.coins && target.hours_satisfied(total_hours) {
                debug!(inputs = selected.len(), total_coins, total_hours, "selected inputs");
                return Ok(CoinSelection { selected, total_coins, total_hours });
            }
        }

        check_totals(total_coins, total_hours, &target)?;
        Ok(CoinSelection { selected, total_coins, total_hours })
    }
}

fn check_totals(coins: u64, hours: u64, target: &SelectionTarget) -> Result<(), WalletError> {
    if coins < target.coins {
        return Err(WalletError::InsufficientBalance { have: coins, need: target.coins });
    }
    if !target.hours_satisfied(hours) {
        return Err(WalletError::InsufficientHours {
            have: hours,
            need: target.required_input_hours(),
        });
    }
    Ok(())
}
