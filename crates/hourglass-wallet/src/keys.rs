//! Seeds and the key ring used for signing.
//!
//! Child keys are derived with BLAKE3's key derivation mode from a 32-byte
//! seed and a little-endian index. A derived scalar outside the curve order
//! (vanishingly rare) is rejected rather than reduced.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use hourglass_core::address::Address;
use hourglass_core::crypto::KeyPair;

use crate::error::WalletError;

/// BLAKE3 KDF context for child key derivation.
const KDF_CONTEXT: &str = "hourglass-wallet 2026 secp256k1 child key v1";

/// A 32-byte master seed. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    bytes: [u8; 32],
}

impl Seed {
    /// Generate a random seed from the OS cryptographic RNG.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Parse a 64-character hex seed.
    pub fn from_hex(s: &str) -> Result<Self, WalletError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim(), &mut bytes)
            .map_err(|e| WalletError::InvalidRequest(format!("invalid seed: {e}")))?;
        Ok(Self { bytes })
    }

    /// Raw seed bytes. Handle with care.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Derive the key pair at `index`.
    pub fn derive_keypair(&self, index: u32) -> Result<KeyPair, WalletError> {
        let mut ikm = [0u8; 36];
        ikm[..32].copy_from_slice(&self.bytes);
        ikm[32..].copy_from_slice(&index.to_le_bytes());
        let mut derived = blake3::derive_key(KDF_CONTEXT, &ikm);
        ikm.zeroize();
        let keypair = KeyPair::from_secret_bytes(&derived);
        derived.zeroize();
        Ok(keypair?)
    }
}

impl Clone for Seed {
    fn clone(&self) -> Self {
        Self { bytes: self.bytes }
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed").field("bytes", &"[REDACTED]").finish()
    }
}

/// Signing keys indexed by the address they own.
#[derive(Clone, Default)]
pub struct KeyRing {
    keys: BTreeMap<Address, KeyPair>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the first `count` keys of `seed`.
    pub fn from_seed(seed: &Seed, count: u32) -> Result<Self, WalletError> {
        let mut ring = Self::new();
        for index in 0..count {
            ring.insert(seed.derive_keypair(index)?);
        }
        Ok(ring)
    }

    /// Add a key pair, returning its address.
    pub fn insert(&mut self, keypair: KeyPair) -> Address {
        let address = keypair.address();
        self.keys.insert(address, keypair);
        address
    }

    /// Key pair owning `address`, if present.
    pub fn get(&self, address: &Address) -> Option<&KeyPair> {
        self.keys.get(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.keys.contains_key(address)
    }

    /// All addresses with a key, in address order.
    pub fn addresses(&self) -> BTreeSet<Address> {
        self.keys.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<KeyPair> for KeyRing {
    fn from_iter<I: IntoIterator<Item = KeyPair>>(iter: I) -> Self {
        let mut ring = Self::new();
        for kp in iter {
            ring.insert(kp);
        }
        ring
    }
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("addresses", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}
