//! Addresses: 20-byte owner identifiers derived from secp256k1 public keys.
//!
//! The text form is base58 over the 20 address bytes followed by a 4-byte
//! BLAKE3 checksum, so a mistyped address is rejected before it can receive
//! coins.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::ADDRESS_LEN;
use crate::crypto::PublicKey;
use crate::error::AddressError;

const CHECKSUM_LEN: usize = 4;

/// An address identifying the owner of an output.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address, used as an "unset" marker.
    pub const NULL: Self = Self([0u8; ADDRESS_LEN]);

    /// Create an address from raw bytes.
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive the address owned by a public key: the first 20 bytes of
    /// BLAKE3 over the compressed key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let digest = blake3::hash(&public_key.to_bytes());
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest.as_bytes()[..ADDRESS_LEN]);
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Check if this is the null address.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// Encode as base58 with checksum.
    pub fn encode(&self) -> String {
        let mut payload = Vec::with_capacity(ADDRESS_LEN + CHECKSUM_LEN);
        payload.extend_from_slice(&self.0);
        payload.extend_from_slice(&checksum(&self.0));
        bs58::encode(payload).into_string()
    }

    /// Decode a base58 address string, verifying its checksum.
    pub fn decode(s: &str) -> Result<Self, AddressError> {
        let payload = bs58::decode(s)
            .into_vec()
            .map_err(|_| AddressError::InvalidBase58)?;
        if payload.len() != ADDRESS_LEN + CHECKSUM_LEN {
            return Err(AddressError::InvalidLength(payload.len()));
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&payload[..ADDRESS_LEN]);
        if payload[ADDRESS_LEN..] != checksum(&bytes) {
            return Err(AddressError::InvalidChecksum);
        }
        Ok(Self(bytes))
    }
}

fn checksum(bytes: &[u8; ADDRESS_LEN]) -> [u8; CHECKSUM_LEN] {
    let digest = blake3::hash(bytes);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest.as_bytes()[..CHECKSUM_LEN]);
    out
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encode())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}
