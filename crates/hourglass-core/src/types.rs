//! Core ledger types: hashes, signatures, outputs and transactions.
//!
//! Coin values are droplets (1 coin = 10^6 droplets); hours are whole coin
//! hours. All numeric fields are u64 except the wire-level `length` (u32).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::address::Address;
use crate::constants::{HASH_LEN, SIGNATURE_LEN, TX_TYPE};
use crate::encoding;
use crate::error::{ArithmeticError, DecodeError};
use crate::math;

/// A 32-byte SHA-256 digest.
///
/// Identifies unspent outputs and transactions, and is the inner hash of a
/// transaction body.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256(pub [u8; HASH_LEN]);

impl Hash256 {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; HASH_LEN]);

    /// Create a Hash256 from a byte array.
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LEN]
    }

    /// SHA-256 of `data`.
    pub fn digest(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, DecodeError> {
        let mut bytes = [0u8; HASH_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({self})")
    }
}

impl FromStr for Hash256 {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; HASH_LEN]> for Hash256 {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A 65-byte recoverable signature; all zeroes means "not signed yet".
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; SIGNATURE_LEN]);

impl Signature {
    /// The null signature occupying an unsigned input slot.
    pub const NULL: Self = Self([0u8; SIGNATURE_LEN]);

    /// Check if this slot is unsigned.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; SIGNATURE_LEN]
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Parse a 130-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, DecodeError> {
        let mut bytes = [0u8; SIGNATURE_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("Signature(null)")
        } else {
            write!(f, "Signature({self})")
        }
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A transaction output: destination, coins and hours.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TxOutput {
    /// Owner of the new unspent output.
    pub address: Address,
    /// Value in droplets. Must be non-zero.
    pub coins: u64,
    /// Coin hours carried by the output.
    pub hours: u64,
}

/// An unspent output in the ledger snapshot.
///
/// `hours` is the base balance recorded when the output was created; the
/// spendable balance grows with time (see [`crate::accrual`]).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UnspentOutput {
    /// Identity, derived from the creating transaction and output index.
    pub hash: Hash256,
    /// Owner address.
    pub address: Address,
    /// Value in droplets.
    pub coins: u64,
    /// Base coin hours at creation.
    pub hours: u64,
    /// Unix time (seconds) of the block that created the output.
    pub created_at: u64,
}

impl UnspentOutput {
    /// Materialise output `index` of transaction `source_tx`.
    pub fn new(source_tx: Hash256, index: u32, output: &TxOutput, created_at: u64) -> Self {
        Self {
            hash: output_hash(&source_tx, index, output),
            address: output.address,
            coins: output.coins,
            hours: output.hours,
            created_at,
        }
    }
}

/// Identity of output `index` created by `source_tx`.
pub fn output_hash(source_tx: &Hash256, index: u32, output: &TxOutput) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(source_tx.as_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(output.address.as_bytes());
    hasher.update(output.coins.to_le_bytes());
    hasher.update(output.hours.to_le_bytes());
    Hash256(hasher.finalize().into())
}

/// A transaction spending unspent outputs into new outputs.
///
/// `length` and `inner_hash` are stored rather than derived so that a decoded
/// transaction re-encodes byte for byte; [`Transaction::update_header`]
/// recomputes them after the body changes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Declared encoded length in bytes.
    pub length: u32,
    /// Transaction type; only [`TX_TYPE`] is valid.
    pub tx_type: u8,
    /// SHA-256 over the encoded inputs and outputs.
    pub inner_hash: Hash256,
    /// Hashes of the unspent outputs consumed.
    pub inputs: Vec<Hash256>,
    /// Outputs created.
    pub outputs: Vec<TxOutput>,
    /// One signature slot per input.
    pub signatures: Vec<Signature>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    /// An empty transaction with a current header.
    pub fn new() -> Self {
        let mut tx = Self {
            length: 0,
            tx_type: TX_TYPE,
            inner_hash: Hash256::ZERO,
            inputs: Vec::new(),
            outputs: Vec::new(),
            signatures: Vec::new(),
        };
        tx.update_header();
        tx
    }

    /// Append an input together with its null signature slot.
    pub fn push_input(&mut self, input: Hash256) {
        self.inputs.push(input);
        self.signatures.push(Signature::NULL);
    }

    /// Append an output.
    pub fn push_output(&mut self, output: TxOutput) {
        self.outputs.push(output);
    }

    /// Recompute the inner hash from the current inputs and outputs.
    pub fn compute_inner_hash(&self) -> Hash256 {
        encoding::inner_hash(&self.inputs, &self.outputs)
    }

    /// Refresh `inner_hash` and `length` after mutating inputs or outputs.
    pub fn update_header(&mut self) {
        self.inner_hash = self.compute_inner_hash();
        self.length = u32::try_from(self.encoded_len()).unwrap_or(u32::MAX);
    }

    /// Size of the canonical encoding in bytes.
    pub fn encoded_len(&self) -> usize {
        encoding::encoded_len(self.inputs.len(), self.outputs.len(), self.signatures.len())
    }

    /// Transaction hash: SHA-256 over the full encoding, signatures included.
    pub fn hash(&self) -> Hash256 {
        Hash256::digest(&encoding::encode(self))
    }

    /// Checked sum of output coins.
    pub fn output_coins(&self) -> Result<u64, ArithmeticError> {
        math::sum_u64(self.outputs.iter().map(|o| o.coins))
    }

    /// Checked sum of output hours.
    pub fn output_hours(&self) -> Result<u64, ArithmeticError> {
        math::sum_u64(self.outputs.iter().map(|o| o.hours))
    }

    /// Every signature slot is null.
    pub fn is_unsigned(&self) -> bool {
        self.signatures.iter().all(Signature::is_null)
    }

    /// Every signature slot is filled.
    pub fn is_fully_signed(&self) -> bool {
        !self.signatures.is_empty() && self.signatures.iter().all(|s| !s.is_null())
    }

    /// The unspent outputs this transaction creates once included at `created_at`.
    pub fn unspent_outputs(&self, created_at: u64) -> Vec<UnspentOutput> {
        let txid = self.hash();
        self.outputs
            .iter()
            .enumerate()
            .map(|(i, o)| UnspentOutput::new(txid, i as u32, o, created_at))
            .collect()
    }
}
