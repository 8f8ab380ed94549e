//! Full, partial and incremental signing.
//!
//! Each input slot is either null or signed. Signing fills the targeted slots
//! and leaves every other slot exactly as it was, so a transaction can be
//! completed over several calls or by several parties. Length and inner hash
//! never change; the transaction hash does.

use tracing::{debug, info};

use hourglass_core::address::Address;
use hourglass_core::crypto;
use hourglass_core::error::CryptoError;
use hourglass_core::traits::UnspentSet;
use hourglass_core::types::Transaction;
use hourglass_core::validation;

use crate::error::WalletError;
use crate::keys::KeyRing;

/// Sign `tx`, returning the signed copy.
///
/// With `indexes` set, exactly those inputs are signed and each must have
/// its owner's key in `keys`. With `None`, every input whose owner's key is
/// present is signed; it is an error if there is none.
///
/// The input is left untouched; on error nothing is returned.
pub fn sign_transaction<S>(
    tx: &Transaction,
    snapshot: &S,
    keys: &KeyRing,
    indexes: Option<&[usize]>,
) -> Result<Transaction, WalletError>
where
    S: UnspentSet + ?Sized,
{
    validation::verify_structure(tx)?;

    let owner = |index: usize| -> Result<Address, WalletError> {
        let hash = tx.inputs.get(index).ok_or(CryptoError::InputIndexOutOfBounds {
            index,
            len: tx.inputs.len(),
        })?;
        snapshot
            .get(hash)
            .map(|o| o.address)
            .ok_or(WalletError::UnknownOutput(*hash))
    };

    let mut targets = Vec::new();
    match indexes {
        Some(indexes) => {
            for &index in indexes {
                let address = owner(index)?;
                let keypair = keys.get(&address).ok_or(WalletError::UnknownAddress(address))?;
                targets.push((index, keypair));
            }
        }
        None => {
            for index in 0..tx.inputs.len() {
                let address = owner(index)?;
                if let Some(keypair) = keys.get(&address) {
                    targets.push((index, keypair));
                }
            }
            if targets.is_empty() {
                return Err(WalletError::UnknownAddress(owner(0)?));
            }
        }
    }

    let mut signed = tx.clone();
    for (index, keypair) in targets {
        crypto::sign_transaction_input(&mut signed, index, keypair)?;
        debug!(index, "signed input");
    }

    let filled = signed.signatures.iter().filter(|s| !s.is_null()).count();
    info!(
        txid = %signed.hash(),
        signed = filled,
        inputs = signed.inputs.len(),
        "signed transaction"
    );
    Ok(signed)
}
