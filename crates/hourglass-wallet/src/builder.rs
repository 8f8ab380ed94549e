//! Transaction builder.
//!
//! Turns a spend request into an unsigned transaction:
//! 1. Validate the request against the profile
//! 2. Select inputs ([`CoinSelector`])
//! 3. Compute change and split hours ([`distribute`])
//! 4. Assemble outputs (destinations in request order, change last), refresh
//!    the header and check the result with the verifier

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use hourglass_core::address::Address;
use hourglass_core::droplet;
use hourglass_core::encoding;
use hourglass_core::math;
use hourglass_core::policy::VerifyProfile;
use hourglass_core::traits::UnspentSet;
use hourglass_core::types::{Hash256, Transaction, TxOutput, UnspentOutput};
use hourglass_core::validation::{self, SignatureMode};

use crate::coin_selection::{CoinSelector, SelectionTarget};
use crate::distribution::distribute;
use crate::error::{overflow, WalletError};
use crate::request::{HoursSelection, InputSource, Receiver, SpendRequest};

/// One input of a created transaction, as reported to the caller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreatedInput {
    pub hash: Hash256,
    pub address: Address,
    pub coins: u64,
    /// Base hours recorded on the output.
    pub hours: u64,
    /// Hours accrued at build time; never less than `hours`.
    pub calculated_hours: u64,
}

/// A built transaction with per-input details and its fee.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreatedTransaction {
    pub transaction: Transaction,
    pub inputs: Vec<CreatedInput>,
    /// Hours burned.
    pub fee: u64,
}

impl CreatedTransaction {
    /// Canonical binary encoding.
    pub fn encode(&self) -> Vec<u8> {
        encoding::encode(&self.transaction)
    }

    /// Canonical hex encoding.
    pub fn encode_hex(&self) -> String {
        encoding::encode_hex(&self.transaction)
    }

    /// Transaction hash; changes when signatures are added.
    pub fn txid(&self) -> Hash256 {
        self.transaction.hash()
    }
}

/// Builder for spend transactions.
///
/// # Example
/// ```ignore
/// let created = TransactionBuilder::new()
///     .add_destination(address, 1_000_000, None)
///     .set_hours_selection(HoursSelection::Auto { share_factor: ShareFactor::parse("0.5")? })
///     .build(&snapshot, &keys.addresses(), now)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    destinations: Vec<Receiver>,
    hours_selection: HoursSelection,
    change_address: Option<Address>,
    source: InputSource,
    profile: VerifyProfile,
}

impl TransactionBuilder {
    /// A builder with no destinations, auto hours (share factor 1), inputs
    /// from the whole wallet and the user profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder configured from a spend request.
    pub fn from_request(request: &SpendRequest) -> Self {
        Self {
            destinations: request.destinations.clone(),
            hours_selection: request.hours_selection,
            change_address: request.change_address,
            source: request.source.clone(),
            profile: VerifyProfile::default(),
        }
    }

    /// Add a destination. `hours` must be set in manual mode and unset in auto mode.
    pub fn add_destination(&mut self, address: Address, coins: u64, hours: Option<u64>) -> &mut Self {
        self.destinations.push(Receiver { address, coins, hours });
        self
    }

    pub fn set_hours_selection(&mut self, selection: HoursSelection) -> &mut Self {
        self.hours_selection = selection;
        self
    }

    /// Send change here instead of to the first input's address.
    pub fn set_change_address(&mut self, address: Address) -> &mut Self {
        self.change_address = Some(address);
        self
    }

    /// Spend exactly these outputs, all of them, in this order.
    pub fn spend_outputs(&mut self, outputs: Vec<Hash256>) -> &mut Self {
        self.source = InputSource::Outputs(outputs);
        self
    }

    /// Spend only outputs owned by these wallet addresses.
    pub fn spend_from_addresses(&mut self, addresses: Vec<Address>) -> &mut Self {
        self.source = InputSource::Addresses(addresses);
        self
    }

    /// Override the verification profile (default: [`VerifyProfile::user`]).
    pub fn set_profile(&mut self, profile: VerifyProfile) -> &mut Self {
        self.profile = profile;
        self
    }

    pub fn profile(&self) -> &VerifyProfile {
        &self.profile
    }

    /// Build an unsigned transaction.
    ///
    /// `wallet` is the set of addresses the caller controls; `now` is the unix
    /// time hours are accrued to.
    pub fn build<S>(
        &self,
        snapshot: &S,
        wallet: &BTreeSet<Address>,
        now: u64,
    ) -> Result<CreatedTransaction, WalletError>
    where
        S: UnspentSet + ?Sized,
    {
        self.profile.validate()?;
        let (coins, hours) = self.validate_destinations()?;

        let candidates = CoinSelector::candidates(snapshot, wallet, &self.source)?;
        let target = SelectionTarget {
            coins,
            hours,
            burn_factor: self.profile.burn_factor,
        };
        let selection = CoinSelector::select(candidates, target, now)?;

        let change_coins =
            math::sub_u64(selection.total_coins, coins).map_err(overflow("change coins"))?;
        let has_change = change_coins > 0;

        let hours = distribute(
            selection.total_hours,
            self.profile.burn_factor,
            &self.destinations,
            &self.hours_selection,
            has_change,
        )?;

        let mut tx = Transaction::new();
        for input in &selection.selected {
            tx.push_input(input.output.hash);
        }
        for (dest, &dest_hours) in self.destinations.iter().zip(&hours.destination_hours) {
            tx.push_output(TxOutput {
                address: dest.address,
                coins: dest.coins,
                hours: dest_hours,
            });
        }
        if let Some(mut change_hours) = hours.change_hours {
            let address = match (self.change_address, selection.selected.first()) {
                (Some(address), _) => address,
                (None, Some(first)) => first.output.address,
                (None, None) => return Err(WalletError::InvalidRequest("no change address".into())),
            };
            // Change must differ from every destination; burn change hours until it does.
            while let Some(index) = tx.outputs.iter().position(|o| {
                o.address == address && o.coins == change_coins && o.hours == change_hours
            }) {
                if change_hours == 0 {
                    return Err(WalletError::InvalidRequest(format!(
                        "change output duplicates to[{index}]; set a different change address"
                    )));
                }
                change_hours -= 1;
                debug!(index, change_hours, "burned a change hour to avoid a duplicate output");
            }
            tx.push_output(TxOutput {
                address,
                coins: change_coins,
                hours: change_hours,
            });
        }
        tx.update_header();

        let spent: Vec<UnspentOutput> = selection.selected.iter().map(|s| s.output.clone()).collect();
        let summary = validation::verify_hard_constraints(&tx, &spent, now, SignatureMode::Unsigned)
            .map_err(Into::into)
            .and_then(|summary| {
                validation::verify_soft_constraints(&tx, &summary, &self.profile).map(|()| summary)
            })
            .map_err(|e| {
                warn!(error = %e, "built transaction failed verification");
                WalletError::Verify(e)
            })?;

        let inputs = selection
            .selected
            .iter()
            .map(|s| CreatedInput {
                hash: s.output.hash,
                address: s.output.address,
                coins: s.output.coins,
                hours: s.output.hours,
                calculated_hours: s.hours,
            })
            .collect();

        info!(
            txid = %tx.hash(),
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            fee = summary.fee,
            "built transaction"
        );
        Ok(CreatedTransaction {
            transaction: tx,
            inputs,
            fee: summary.fee,
        })
    }

    /// Check destinations against the hours mode and profile.
    ///
    /// Returns the total destination coins and (manual mode) hours.
    fn validate_destinations(&self) -> Result<(u64, u64), WalletError> {
        if self.destinations.is_empty() {
            return Err(WalletError::InvalidRequest("no destinations".into()));
        }

        let manual = matches!(self.hours_selection, HoursSelection::Manual);
        let mut seen = HashSet::with_capacity(self.destinations.len());
        for (index, dest) in self.destinations.iter().enumerate() {
            if dest.address.is_null() {
                return Err(WalletError::InvalidRequest(format!("to[{index}].address is null")));
            }
            if dest.coins == 0 {
                return Err(WalletError::InvalidRequest(format!("to[{index}].coins must be non-zero")));
            }
            if droplet::check_precision(dest.coins, self.profile.max_decimals).is_err() {
                return Err(WalletError::InvalidDecimalPrecision { index });
            }
            match (manual, dest.hours) {
                (true, None) => {
                    return Err(WalletError::InvalidRequest(format!(
                        "to[{index}].hours is required in manual mode"
                    )));
                }
                (false, Some(_)) => {
                    return Err(WalletError::InvalidRequest(format!(
                        "to[{index}].hours must not be set in auto mode"
                    )));
                }
                _ => {}
            }
            if !seen.insert((dest.address, dest.coins, dest.hours)) {
                return Err(WalletError::InvalidRequest(format!("to[{index}] is a duplicate destination")));
            }
        }

        let coins = math::sum_u64(self.destinations.iter().map(|d| d.coins))
            .map_err(overflow("total output coins"))?;
        let hours = math::sum_u64(self.destinations.iter().filter_map(|d| d.hours))
            .map_err(overflow("total output hours"))?;
        Ok((coins, hours))
    }
}
