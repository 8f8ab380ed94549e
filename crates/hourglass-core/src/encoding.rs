//! Canonical binary encoding of transactions.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! length u32 | type u8 | inner_hash [32]
//! n_in  u32 | n_in  x hash [32]
//! n_out u32 | n_out x (address [20] | coins u64 | hours u64)
//! n_sig u32 | n_sig x signature [65]
//! ```
//!
//! The inner hash is SHA-256 over the `n_in .. outputs` section. Decoding
//! keeps the declared length and inner hash as read, so `encode(decode(b))`
//! reproduces `b` exactly even for a transaction whose header is stale; the
//! verifier is what rejects such a transaction.

use bytes::{Buf, BufMut, BytesMut};

use crate::address::Address;
use crate::constants::{ADDRESS_LEN, HASH_LEN, OUTPUT_LEN, SIGNATURE_LEN, TX_HEADER_LEN};
use crate::error::DecodeError;
use crate::types::{Hash256, Signature, Transaction, TxOutput};

/// Encoded size of a transaction with the given section counts.
pub fn encoded_len(inputs: usize, outputs: usize, signatures: usize) -> usize {
    TX_HEADER_LEN + inputs * HASH_LEN + outputs * OUTPUT_LEN + signatures * SIGNATURE_LEN
}

fn put_body(buf: &mut BytesMut, inputs: &[Hash256], outputs: &[TxOutput]) {
    buf.put_u32_le(inputs.len() as u32);
    for input in inputs {
        buf.put_slice(input.as_bytes());
    }
    buf.put_u32_le(outputs.len() as u32);
    for output in outputs {
        buf.put_slice(output.address.as_bytes());
        buf.put_u64_le(output.coins);
        buf.put_u64_le(output.hours);
    }
}

/// SHA-256 over the encoded inputs and outputs.
pub fn inner_hash(inputs: &[Hash256], outputs: &[TxOutput]) -> Hash256 {
    let mut buf = BytesMut::with_capacity(8 + inputs.len() * HASH_LEN + outputs.len() * OUTPUT_LEN);
    put_body(&mut buf, inputs, outputs);
    Hash256::digest(&buf)
}

/// Encode a transaction to its canonical bytes.
pub fn encode(tx: &Transaction) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(tx.encoded_len());
    buf.put_u32_le(tx.length);
    buf.put_u8(tx.tx_type);
    buf.put_slice(tx.inner_hash.as_bytes());
    put_body(&mut buf, &tx.inputs, &tx.outputs);
    buf.put_u32_le(tx.signatures.len() as u32);
    for sig in &tx.signatures {
        buf.put_slice(sig.as_bytes());
    }
    buf.to_vec()
}

/// Encode a transaction as lowercase hex.
pub fn encode_hex(tx: &Transaction) -> String {
    hex::encode(encode(tx))
}

fn ensure(buf: &[u8], n: usize) -> Result<(), DecodeError> {
    if buf.remaining() < n {
        return Err(DecodeError::Truncated { needed: n - buf.remaining() });
    }
    Ok(())
}

fn read_count(buf: &mut &[u8], section: &'static str, item_len: usize) -> Result<usize, DecodeError> {
    ensure(buf, 4)?;
    let count = buf.get_u32_le();
    let fits = (count as usize)
        .checked_mul(item_len)
        .is_some_and(|n| n <= buf.remaining());
    if !fits {
        return Err(DecodeError::CountTooLarge {
            section,
            count,
            remaining: buf.remaining(),
        });
    }
    Ok(count as usize)
}

fn read_array<const N: usize>(buf: &mut &[u8]) -> Result<[u8; N], DecodeError> {
    ensure(buf, N)?;
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

/// Decode a transaction from its canonical bytes.
///
/// The whole input must be consumed.
pub fn decode(data: &[u8]) -> Result<Transaction, DecodeError> {
    let mut buf = data;

    ensure(buf, 4 + 1 + HASH_LEN)?;
    let length = buf.get_u32_le();
    let tx_type = buf.get_u8();
    let inner_hash = Hash256(read_array::<HASH_LEN>(&mut buf)?);

    let n_in = read_count(&mut buf, "inputs", HASH_LEN)?;
    let mut inputs = Vec::with_capacity(n_in);
    for _ in 0..n_in {
        inputs.push(Hash256(read_array::<HASH_LEN>(&mut buf)?));
    }

    let n_out = read_count(&mut buf, "outputs", OUTPUT_LEN)?;
    let mut outputs = Vec::with_capacity(n_out);
    for _ in 0..n_out {
        let address = Address(read_array::<ADDRESS_LEN>(&mut buf)?);
        ensure(buf, 16)?;
        let coins = buf.get_u64_le();
        let hours = buf.get_u64_le();
        outputs.push(TxOutput { address, coins, hours });
    }

    let n_sig = read_count(&mut buf, "signatures", SIGNATURE_LEN)?;
    let mut signatures = Vec::with_capacity(n_sig);
    for _ in 0..n_sig {
        signatures.push(Signature(read_array::<SIGNATURE_LEN>(&mut buf)?));
    }

    if buf.has_remaining() {
        return Err(DecodeError::TrailingBytes(buf.remaining()));
    }

    Ok(Transaction {
        length,
        tx_type,
        inner_hash,
        inputs,
        outputs,
        signatures,
    })
}

/// Decode a transaction from hex.
pub fn decode_hex(s: &str) -> Result<Transaction, DecodeError> {
    let data = hex::decode(s.trim()).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
    decode(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        let mut tx = Transaction::new();
        tx.push_input(Hash256([0x01; 32]));
        tx.push_input(Hash256([0x02; 32]));
        tx.push_output(TxOutput { address: Address([0xAA; 20]), coins: 1_999_000, hours: 1 });
        tx.push_output(TxOutput { address: Address([0xBB; 20]), coins: 1_000, hours: 9 });
        tx.update_header();
        tx.signatures[1] = Signature([0x5C; 65]);
        tx
    }

    #[test]
    fn encoded_len_matches_bytes() {
        let tx = sample_tx();
        let bytes = encode(&tx);
        assert_eq!(bytes.len(), tx.encoded_len());
        assert_eq!(bytes.len(), tx.length as usize);
        assert_eq!(bytes.len(), 49 + 2 * 32 + 2 * 36 + 2 * 65);
    }

    #[test]
    fn field_layout_is_little_endian() {
        let tx = sample_tx();
        let bytes = encode(&tx);
        assert_eq!(&bytes[..4], &tx.length.to_le_bytes());
        assert_eq!(bytes[4], 0);
        assert_eq!(&bytes[5..37], tx.inner_hash.as_bytes());
        assert_eq!(&bytes[37..41], &2u32.to_le_bytes());
    }

    #[test]
    fn decode_reproduces_transaction() {
        let tx = sample_tx();
        let back = decode(&encode(&tx)).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn stale_header_survives_round_trip() {
        let mut tx = sample_tx();
        tx.length = 7;
        tx.inner_hash = Hash256([0xEE; 32]);
        let bytes = encode(&tx);
        assert_eq!(encode(&decode(&bytes).unwrap()), bytes);
    }

    #[test]
    fn hex_round_trip() {
        let tx = sample_tx();
        let s = encode_hex(&tx);
        assert_eq!(decode_hex(&s).unwrap(), tx);
        assert!(matches!(decode_hex("xyz"), Err(DecodeError::InvalidHex(_))));
    }

    #[test]
    fn inner_hash_excludes_header_and_signatures() {
        let tx = sample_tx();
        let mut other = tx.clone();
        other.signatures[0] = Signature([0x11; 65]);
        other.length = 0;
        assert_eq!(
            inner_hash(&tx.inputs, &tx.outputs),
            inner_hash(&other.inputs, &other.outputs)
        );
    }

    // --- Malformed input ---

    #[test]
    fn decode_rejects_truncation() {
        let bytes = encode(&sample_tx());
        assert!(matches!(decode(&bytes[..10]), Err(DecodeError::Truncated { .. })));
        assert!(decode(&bytes[..bytes.len() - 1]).is_err());
        assert!(matches!(decode(&[]), Err(DecodeError::Truncated { needed: 37 })));
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut bytes = encode(&sample_tx());
        bytes.extend_from_slice(&[0, 0, 0]);
        assert_eq!(decode(&bytes), Err(DecodeError::TrailingBytes(3)));
    }

    #[test]
    fn decode_rejects_huge_count() {
        let mut bytes = encode(&sample_tx());
        bytes[37..41].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(DecodeError::CountTooLarge { section: "inputs", count: u32::MAX, .. })
        ));
    }
}
