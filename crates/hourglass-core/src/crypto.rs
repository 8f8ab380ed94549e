//! secp256k1 cryptographic operations for Hourglass.
//!
//! Keys, recoverable ECDSA signatures and address recovery. Uses `k256` for
//! the curve arithmetic and SHA-256 for signing hashes.
//!
//! # Signing scheme
//!
//! Input `i` is signed over `SHA256(inner_hash || inputs[i])`. The inner hash
//! covers every input and output but no signature, so inputs can be signed
//! independently, in any order, by different parties. Signatures are 65 bytes:
//! the 64-byte compact `(r, s)` followed by the recovery id, which lets the
//! verifier recover the public key and compare its address with the owner of
//! the spent output.

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::address::Address;
use crate::error::CryptoError;
use crate::types::{Hash256, Signature, Transaction};

/// secp256k1 key pair for signing transaction inputs.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a random key pair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Create a key pair from a 32-byte secret scalar.
    ///
    /// Fails for zero and for values not below the curve order.
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| CryptoError::InvalidSecretKey)?;
        Ok(Self { signing_key })
    }

    /// Raw secret scalar. Handle with care.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }

    /// Public half of this key pair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: *self.signing_key.verifying_key(),
        }
    }

    /// Address owned by this key pair.
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key())
    }

    /// Sign a 32-byte digest, producing a recoverable signature.
    pub fn sign_hash(&self, hash: &Hash256) -> Result<Signature, CryptoError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(hash.as_bytes())
            .map_err(|_| CryptoError::SigningFailed)?;

        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = recovery_id.to_byte();
        Ok(Signature(bytes))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// secp256k1 public key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    /// Parse a 33-byte compressed SEC1 public key.
    pub fn from_bytes(bytes: &[u8; 33]) -> Result<Self, CryptoError> {
        let verifying_key =
            VerifyingKey::from_sec1_bytes(bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self { verifying_key })
    }

    /// Compressed SEC1 encoding (33 bytes).
    pub fn to_bytes(&self) -> [u8; 33] {
        let point = self.verifying_key.to_encoded_point(true);
        let mut out = [0u8; 33];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Address owned by this key.
    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.to_bytes()))
    }
}

/// Recover the public key that produced `signature` over `hash`.
pub fn recover_public_key(hash: &Hash256, signature: &Signature) -> Result<PublicKey, CryptoError> {
    if signature.is_null() {
        return Err(CryptoError::NullSignature);
    }
    let sig = EcdsaSignature::from_slice(&signature.0[..64])
        .map_err(|_| CryptoError::InvalidSignature)?;
    let recovery_id =
        RecoveryId::from_byte(signature.0[64]).ok_or(CryptoError::InvalidSignature)?;
    let verifying_key = VerifyingKey::recover_from_prehash(hash.as_bytes(), &sig, recovery_id)
        .map_err(|_| CryptoError::InvalidSignature)?;
    Ok(PublicKey { verifying_key })
}

/// Check that `signature` over `hash` was made by the key owning `address`.
pub fn verify_signed_hash(
    address: &Address,
    hash: &Hash256,
    signature: &Signature,
) -> Result<(), CryptoError> {
    let public_key = recover_public_key(hash, signature)?;
    if public_key.address() != *address {
        return Err(CryptoError::AddressMismatch(*address));
    }
    Ok(())
}

/// Signing hash for input `input_index`: `SHA256(inner_hash || inputs[i])`.
pub fn signing_hash(tx: &Transaction, input_index: usize) -> Result<Hash256, CryptoError> {
    let input = tx
        .inputs
        .get(input_index)
        .ok_or(CryptoError::InputIndexOutOfBounds {
            index: input_index,
            len: tx.inputs.len(),
        })?;

    let mut hasher = Sha256::new();
    hasher.update(tx.inner_hash.as_bytes());
    hasher.update(input.as_bytes());
    Ok(Hash256(hasher.finalize().into()))
}

/// Sign one input in place. Other signature slots are left untouched.
pub fn sign_transaction_input(
    tx: &mut Transaction,
    input_index: usize,
    keypair: &KeyPair,
) -> Result<(), CryptoError> {
    let sighash = signing_hash(tx, input_index)?;
    let signature = keypair.sign_hash(&sighash)?;
    let len = tx.signatures.len();
    let slot = tx
        .signatures
        .get_mut(input_index)
        .ok_or(CryptoError::InputIndexOutOfBounds { index: input_index, len })?;
    *slot = signature;
    Ok(())
}

/// Verify the signature on input `input_index` against the owner address of
/// the output it spends.
pub fn verify_transaction_input(
    tx: &Transaction,
    input_index: usize,
    owner: &Address,
) -> Result<(), CryptoError> {
    let signature = tx
        .signatures
        .get(input_index)
        .ok_or(CryptoError::InputIndexOutOfBounds {
            index: input_index,
            len: tx.signatures.len(),
        })?;
    let sighash = signing_hash(tx, input_index)?;
    verify_signed_hash(owner, &sighash, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TxOutput;

    fn sample_tx() -> Transaction {
        let mut tx = Transaction::new();
        tx.push_input(Hash256([0x11; 32]));
        tx.push_input(Hash256([0x22; 32]));
        tx.push_output(TxOutput {
            address: Address([0xAA; 20]),
            coins: 1_000_000,
            hours: 5,
        });
        tx.update_header();
        tx
    }

    // --- KeyPair ---

    #[test]
    fn keypair_from_secret_deterministic() {
        let kp1 = KeyPair::from_secret_bytes(&[42u8; 32]).unwrap();
        let kp2 = KeyPair::from_secret_bytes(&[42u8; 32]).unwrap();
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.secret_bytes(), [42u8; 32]);
    }

    #[test]
    fn keypair_rejects_zero_scalar() {
        assert_eq!(
            KeyPair::from_secret_bytes(&[0u8; 32]).unwrap_err(),
            CryptoError::InvalidSecretKey
        );
    }

    #[test]
    fn keypair_generate_unique() {
        assert_ne!(KeyPair::generate().address(), KeyPair::generate().address());
    }

    #[test]
    fn keypair_debug_redacts_secret() {
        let kp = KeyPair::from_secret_bytes(&[9u8; 32]).unwrap();
        let debug = format!("{kp:?}");
        assert!(debug.contains("KeyPair"));
        assert!(!debug.contains(&hex::encode([9u8; 32])));
    }

    // --- PublicKey ---

    #[test]
    fn public_key_bytes_round_trip() {
        let kp = KeyPair::from_secret_bytes(&[3u8; 32]).unwrap();
        let pk = kp.public_key();
        assert_eq!(PublicKey::from_bytes(&pk.to_bytes()).unwrap(), pk);
    }

    #[test]
    fn public_key_rejects_garbage() {
        assert_eq!(
            PublicKey::from_bytes(&[0xFF; 33]).unwrap_err(),
            CryptoError::InvalidPublicKey
        );
    }

    // --- Recovery ---

    #[test]
    fn sign_and_recover() {
        let kp = KeyPair::from_secret_bytes(&[5u8; 32]).unwrap();
        let hash = Hash256([0x77; 32]);
        let sig = kp.sign_hash(&hash).unwrap();
        assert!(!sig.is_null());
        assert_eq!(recover_public_key(&hash, &sig).unwrap(), kp.public_key());
        assert!(verify_signed_hash(&kp.address(), &hash, &sig).is_ok());
    }

    #[test]
    fn verify_rejects_other_address() {
        let kp = KeyPair::from_secret_bytes(&[5u8; 32]).unwrap();
        let other = KeyPair::from_secret_bytes(&[6u8; 32]).unwrap();
        let hash = Hash256([0x77; 32]);
        let sig = kp.sign_hash(&hash).unwrap();
        assert_eq!(
            verify_signed_hash(&other.address(), &hash, &sig).unwrap_err(),
            CryptoError::AddressMismatch(other.address())
        );
    }

    #[test]
    fn verify_rejects_other_message() {
        let kp = KeyPair::from_secret_bytes(&[5u8; 32]).unwrap();
        let sig = kp.sign_hash(&Hash256([0x77; 32])).unwrap();
        assert!(verify_signed_hash(&kp.address(), &Hash256([0x78; 32]), &sig).is_err());
    }

    #[test]
    fn recover_rejects_null_signature() {
        assert_eq!(
            recover_public_key(&Hash256::ZERO, &Signature::NULL).unwrap_err(),
            CryptoError::NullSignature
        );
    }

    // --- Transaction inputs ---

    #[test]
    fn signing_hash_differs_per_input() {
        let tx = sample_tx();
        assert_ne!(signing_hash(&tx, 0).unwrap(), signing_hash(&tx, 1).unwrap());
    }

    #[test]
    fn signing_hash_out_of_bounds() {
        let tx = sample_tx();
        assert_eq!(
            signing_hash(&tx, 2).unwrap_err(),
            CryptoError::InputIndexOutOfBounds { index: 2, len: 2 }
        );
    }

    #[test]
    fn sign_input_touches_only_its_slot() {
        let kp = KeyPair::from_secret_bytes(&[8u8; 32]).unwrap();
        let mut tx = sample_tx();
        sign_transaction_input(&mut tx, 1, &kp).unwrap();
        assert!(tx.signatures[0].is_null());
        assert!(!tx.signatures[1].is_null());
        assert!(verify_transaction_input(&tx, 1, &kp.address()).is_ok());
        assert_eq!(
            verify_transaction_input(&tx, 0, &kp.address()).unwrap_err(),
            CryptoError::NullSignature
        );
    }

    #[test]
    fn signature_invalid_after_output_change() {
        let kp = KeyPair::from_secret_bytes(&[8u8; 32]).unwrap();
        let mut tx = sample_tx();
        sign_transaction_input(&mut tx, 0, &kp).unwrap();
        tx.outputs[0].hours = 6;
        tx.update_header();
        assert!(verify_transaction_input(&tx, 0, &kp.address()).is_err());
    }
}
