//! Shared fixtures for the integration tests.

use hourglass_core::address::Address;
use hourglass_core::crypto::KeyPair;
use hourglass_core::policy::VerifyProfile;
use hourglass_core::traits::UnspentPool;
use hourglass_core::types::{Hash256, UnspentOutput};
use hourglass_wallet::request::{HoursSelection, InputSource, Receiver, SpendRequest};
use hourglass_wallet::{KeyRing, Wallet};

/// Unix time the fixtures are created at.
pub const GENESIS: u64 = 1_700_000_000;

/// Deterministic key pair from a seed byte. Seed 0 is not a valid scalar.
pub fn key(seed: u8) -> KeyPair {
    KeyPair::from_secret_bytes(&[seed.max(1); 32]).expect("non-zero scalar below the curve order")
}

pub fn addr(seed: u8) -> Address {
    key(seed).address()
}

/// An unspent output with a hash built from `tag`.
pub fn utxo(tag: u8, owner: Address, coins: u64, hours: u64, created_at: u64) -> UnspentOutput {
    UnspentOutput {
        hash: Hash256([tag; 32]),
        address: owner,
        coins,
        hours,
        created_at,
    }
}

pub fn pool(outputs: impl IntoIterator<Item = UnspentOutput>) -> UnspentPool {
    outputs.into_iter().collect()
}

/// A wallet holding the keys for `seeds`.
pub fn wallet(seeds: &[u8], profile: VerifyProfile) -> Wallet {
    let keys: KeyRing = seeds.iter().map(|&s| key(s)).collect();
    Wallet::new(keys, profile)
}

/// A manual-hours spend to a single destination.
pub fn manual_send(to: Address, coins: u64, hours: u64, unsigned: bool) -> SpendRequest {
    SpendRequest {
        source: InputSource::All,
        destinations: vec![Receiver { address: to, coins, hours: Some(hours) }],
        hours_selection: HoursSelection::Manual,
        change_address: None,
        unsigned,
    }
}

/// An auto-hours spend across several destinations.
pub fn auto_send(to: &[(Address, u64)], selection: HoursSelection, unsigned: bool) -> SpendRequest {
    SpendRequest {
        source: InputSource::All,
        destinations: to
            .iter()
            .map(|&(address, coins)| Receiver { address, coins, hours: None })
            .collect(),
        hours_selection: selection,
        change_address: None,
        unsigned,
    }
}
