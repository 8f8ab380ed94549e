//! Wallet composition: keys, profile, building and signing.
//!
//! [`Wallet`] ties a [`KeyRing`] to a verification profile and runs the full
//! create flow against a caller-supplied snapshot: build, sign unless the
//! request asks for an unsigned transaction, then verify the result.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use hourglass_core::accrual;
use hourglass_core::address::Address;
use hourglass_core::math;
use hourglass_core::policy::VerifyProfile;
use hourglass_core::traits::UnspentSet;
use hourglass_core::types::Transaction;
use hourglass_core::validation::{self, SignatureMode, VerifiedTransaction};

use crate::builder::{CreatedTransaction, TransactionBuilder};
use crate::error::{overflow, WalletError};
use crate::keys::{KeyRing, Seed};
use crate::request::SpendRequest;
use crate::signer;

/// Balance of every output the wallet owns.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalletBalance {
    /// Droplets.
    pub coins: u64,
    /// Accrued hours at query time.
    pub hours: u64,
    /// Number of unspent outputs.
    pub outputs: usize,
}

/// A set of signing keys plus the profile used to build and check spends.
#[derive(Debug, Clone)]
pub struct Wallet {
    keys: KeyRing,
    profile: VerifyProfile,
}

impl Wallet {
    pub fn new(keys: KeyRing, profile: VerifyProfile) -> Self {
        Self { keys, profile }
    }

    /// A wallet of the first `count` keys derived from `seed`.
    pub fn from_seed(seed: &Seed, count: u32, profile: VerifyProfile) -> Result<Self, WalletError> {
        Ok(Self::new(KeyRing::from_seed(seed, count)?, profile))
    }

    pub fn keys(&self) -> &KeyRing {
        &self.keys
    }

    pub fn profile(&self) -> &VerifyProfile {
        &self.profile
    }

    pub fn addresses(&self) -> BTreeSet<Address> {
        self.keys.addresses()
    }

    /// Coins and accrued hours across all owned outputs at `now`.
    pub fn balance<S>(&self, snapshot: &S, now: u64) -> Result<WalletBalance, WalletError>
    where
        S: UnspentSet + ?Sized,
    {
        let owned = snapshot.owned_by(&self.addresses());
        let coins = math::sum_u64(owned.iter().map(|o| o.coins)).map_err(overflow("total coins"))?;
        let hours = math::sum_u64(owned.iter().map(|o| accrual::accrued_hours(o, now)))
            .map_err(overflow("total hours"))?;
        Ok(WalletBalance { coins, hours, outputs: owned.len() })
    }

    /// Build a transaction for `request`, signing every input unless
    /// `request.unsigned` is set, and verify it in the matching mode.
    pub fn create_transaction<S>(
        &self,
        request: &SpendRequest,
        snapshot: &S,
        now: u64,
    ) -> Result<CreatedTransaction, WalletError>
    where
        S: UnspentSet + ?Sized,
    {
        let mut builder = TransactionBuilder::from_request(request);
        builder.set_profile(self.profile);
        let mut created = builder.build(snapshot, &self.addresses(), now)?;

        if !request.unsigned {
            created.transaction = signer::sign_transaction(&created.transaction, snapshot, &self.keys, None)?;
            self.verify(&created.transaction, snapshot, now, SignatureMode::Signed)?;
        }
        Ok(created)
    }

    /// Sign `tx` with this wallet's keys; see [`signer::sign_transaction`].
    pub fn sign<S>(
        &self,
        tx: &Transaction,
        snapshot: &S,
        indexes: Option<&[usize]>,
    ) -> Result<Transaction, WalletError>
    where
        S: UnspentSet + ?Sized,
    {
        signer::sign_transaction(tx, snapshot, &self.keys, indexes)
    }

    /// Verify `tx` under this wallet's profile.
    pub fn verify<S>(
        &self,
        tx: &Transaction,
        snapshot: &S,
        now: u64,
        mode: SignatureMode,
    ) -> Result<VerifiedTransaction, WalletError>
    where
        S: UnspentSet + ?Sized,
    {
        Ok(validation::verify_transaction(tx, snapshot, now, &self.profile, mode)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{HoursSelection, InputSource, Receiver};
    use hourglass_core::crypto::KeyPair;
    use hourglass_core::traits::UnspentPool;
    use hourglass_core::types::{Hash256, UnspentOutput};

    const NOW: u64 = 1_700_000_000;

    fn setup() -> (Wallet, UnspentPool) {
        let seed = Seed::from_bytes([4u8; 32]);
        let wallet = Wallet::from_seed(&seed, 2, VerifyProfile::user()).unwrap();
        let addrs: Vec<Address> = wallet.addresses().into_iter().collect();
        let pool: UnspentPool = vec![
            UnspentOutput { hash: Hash256([1; 32]), address: addrs[0], coins: 3_000_000, hours: 40, created_at: NOW },
            UnspentOutput { hash: Hash256([2; 32]), address: addrs[1], coins: 1_000_000, hours: 2, created_at: NOW - 3_600 },
            UnspentOutput { hash: Hash256([3; 32]), address: Address([0xEE; 20]), coins: 9_000_000, hours: 0, created_at: NOW },
        ]
        .into();
        (wallet, pool)
    }

    fn request(unsigned: bool) -> SpendRequest {
        SpendRequest {
            source: InputSource::All,
            destinations: vec![Receiver {
                address: KeyPair::from_secret_bytes(&[0xAA; 32]).unwrap().address(),
                coins: 3_500_000,
                hours: Some(3),
            }],
            hours_selection: HoursSelection::Manual,
            change_address: None,
            unsigned,
        }
    }

    #[test]
    fn balance_counts_owned_outputs_only() {
        let (wallet, pool) = setup();
        let bal = wallet.balance(&pool, NOW).unwrap();
        assert_eq!(bal, WalletBalance { coins: 4_000_000, hours: 43, outputs: 2 });
    }

    #[test]
    fn create_signed() {
        let (wallet, pool) = setup();
        let created = wallet.create_transaction(&request(false), &pool, NOW).unwrap();
        assert!(created.transaction.is_fully_signed());
        assert_eq!(created.transaction.inputs.len(), 2);
        assert!(wallet.verify(&created.transaction, &pool, NOW, SignatureMode::Signed).is_ok());
    }

    #[test]
    fn create_unsigned() {
        let (wallet, pool) = setup();
        let created = wallet.create_transaction(&request(true), &pool, NOW).unwrap();
        assert!(created.transaction.is_unsigned());
        assert!(wallet.verify(&created.transaction, &pool, NOW, SignatureMode::Unsigned).is_ok());

        let signed = wallet.sign(&created.transaction, &pool, None).unwrap();
        assert!(wallet.verify(&signed, &pool, NOW, SignatureMode::Signed).is_ok());
    }

    #[test]
    fn create_uses_wallet_profile() {
        let (wallet, pool) = setup();
        let mut req = request(true);
        req.destinations[0].coins = 3_500_001;
        assert_eq!(
            wallet.create_transaction(&req, &pool, NOW),
            Err(WalletError::InvalidDecimalPrecision { index: 0 })
        );
    }
}
