//! End-to-end spend scenarios.
//!
//! Each test drives a wallet from a spend request and a snapshot to a
//! transaction, then checks the transaction the way a receiving node would:
//! decode, resolve inputs, verify under a profile, apply to the pool.

use hourglass_core::encoding;
use hourglass_core::error::{HardConstraint, SoftConstraint, VerifyError};
use hourglass_core::policy::VerifyProfile;
use hourglass_core::traits::UnspentSet;
use hourglass_core::types::{Hash256, TxOutput};
use hourglass_core::validation::{verify_transaction, SignatureMode};
use hourglass_tests::helpers::*;
use hourglass_wallet::request::{HoursSelection, InputSource, ShareFactor, SpendRequest};
use hourglass_wallet::WalletError;

// ---------------------------------------------------------------------------
// Reference scenarios
// ---------------------------------------------------------------------------

#[test]
fn manual_send_leaves_change_and_burns_half() {
    let w = wallet(&[1], VerifyProfile::user());
    let snapshot = pool([utxo(1, addr(1), 2_000_000, 20, GENESIS)]);

    let created = w
        .create_transaction(&manual_send(addr(2), 2_000_000 - 1_000, 1, false), &snapshot, GENESIS)
        .unwrap();

    let tx = &created.transaction;
    assert_eq!(
        tx.outputs,
        vec![
            TxOutput { address: addr(2), coins: 1_999_000, hours: 1 },
            TxOutput { address: addr(1), coins: 1_000, hours: 9 },
        ]
    );
    assert_eq!(created.fee, 10);
    assert!(tx.is_fully_signed());

    let verified = verify_transaction(tx, &snapshot, GENESIS, &VerifyProfile::user(), SignatureMode::Signed).unwrap();
    assert_eq!(verified.fee, 10);
    assert_eq!(verified.input_hours, 20);
    assert_eq!(verified.output_hours, 10);
}

#[test]
fn one_droplet_over_balance() {
    let w = wallet(&[1], VerifyProfile::ledger());
    let snapshot = pool([utxo(1, addr(1), 2_000_000, 20, GENESIS)]);
    let request = manual_send(addr(2), 2_000_001, 1, false);
    assert_eq!(
        w.create_transaction(&request, &snapshot, GENESIS),
        Err(WalletError::InsufficientBalance { have: 2_000_000, need: 2_000_001 })
    );
}

#[test]
fn destination_hours_overflow() {
    let w = wallet(&[1], VerifyProfile::user());
    let snapshot = pool([utxo(1, addr(1), 2_000_000, 20, GENESIS)]);
    let mut request = manual_send(addr(2), 1_000_000, u64::MAX, false);
    request.destinations.push(hourglass_wallet::Receiver {
        address: addr(3),
        coins: 1_000_000,
        hours: Some(u64::MAX - 1),
    });
    assert!(matches!(
        w.create_transaction(&request, &snapshot, GENESIS),
        Err(WalletError::ArithmeticOverflow { .. })
    ));
}

// ---------------------------------------------------------------------------
// Verifier symmetry
// ---------------------------------------------------------------------------

#[test]
fn unsigned_and_signed_modes_are_exclusive() {
    let profile = VerifyProfile::user();
    let w = wallet(&[1, 2], profile);
    let snapshot = pool([
        utxo(1, addr(1), 1_000_000, 10, GENESIS),
        utxo(2, addr(2), 1_000_000, 10, GENESIS),
    ]);

    let unsigned = w
        .create_transaction(&manual_send(addr(7), 1_500_000, 2, true), &snapshot, GENESIS)
        .unwrap()
        .transaction;
    assert_eq!(unsigned.inputs.len(), 2);
    assert!(verify_transaction(&unsigned, &snapshot, GENESIS, &profile, SignatureMode::Unsigned).is_ok());
    assert_eq!(
        verify_transaction(&unsigned, &snapshot, GENESIS, &profile, SignatureMode::Signed),
        Err(HardConstraint::UnsignedInput(0).into())
    );

    let signed = w.sign(&unsigned, &snapshot, None).unwrap();
    assert!(verify_transaction(&signed, &snapshot, GENESIS, &profile, SignatureMode::Signed).is_ok());
    assert_eq!(
        verify_transaction(&signed, &snapshot, GENESIS, &profile, SignatureMode::Unsigned),
        Err(HardConstraint::SignedInput(0).into())
    );
}

#[test]
fn two_parties_complete_a_transaction() {
    let both = wallet(&[1, 2], VerifyProfile::user());
    let alice = wallet(&[1], VerifyProfile::user());
    let bob = wallet(&[2], VerifyProfile::user());
    let snapshot = pool([
        utxo(1, addr(1), 1_000_000, 10, GENESIS),
        utxo(2, addr(2), 1_000_000, 10, GENESIS),
    ]);

    let unsigned = both
        .create_transaction(&manual_send(addr(7), 2_000_000, 4, true), &snapshot, GENESIS)
        .unwrap()
        .transaction;

    let half = alice.sign(&unsigned, &snapshot, None).unwrap();
    assert!(!half.is_fully_signed());
    assert!(matches!(
        alice.verify(&half, &snapshot, GENESIS, SignatureMode::Signed),
        Err(WalletError::Verify(VerifyError::Hard(HardConstraint::UnsignedInput(_))))
    ));

    let full = bob.sign(&half, &snapshot, None).unwrap();
    assert!(full.is_fully_signed());
    assert!(bob.verify(&full, &snapshot, GENESIS, SignatureMode::Signed).is_ok());
    assert_eq!(full.inner_hash, unsigned.inner_hash);
}

#[test]
fn signature_from_wrong_key_is_rejected() {
    let profile = VerifyProfile::user();
    let w = wallet(&[1], profile);
    let snapshot = pool([utxo(1, addr(1), 1_000_000, 10, GENESIS)]);
    let mut tx = w
        .create_transaction(&manual_send(addr(7), 1_000_000, 1, false), &snapshot, GENESIS)
        .unwrap()
        .transaction;

    let forged = wallet(&[9], profile);
    let other = pool([utxo(1, addr(9), 1_000_000, 10, GENESIS)]);
    tx.signatures[0] = forged.sign(&tx, &other, None).unwrap().signatures[0];

    assert!(matches!(
        verify_transaction(&tx, &snapshot, GENESIS, &profile, SignatureMode::Signed),
        Err(VerifyError::Hard(HardConstraint::InvalidSignature { index: 0, .. }))
    ));
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[test]
fn preview_profile_allows_zero_fee_user_profile_does_not() {
    let w = wallet(&[1], VerifyProfile::preview());
    let snapshot = pool([utxo(1, addr(1), 1_000_000, 10, GENESIS)]);

    let created = w
        .create_transaction(&manual_send(addr(2), 1_000_000, 10, false), &snapshot, GENESIS)
        .unwrap();
    assert_eq!(created.fee, 0);
    assert_eq!(created.transaction.outputs.len(), 1);

    assert_eq!(
        verify_transaction(&created.transaction, &snapshot, GENESIS, &VerifyProfile::user(), SignatureMode::Signed),
        Err(SoftConstraint::InsufficientFee { fee: 0, required: 5 }.into())
    );
}

#[test]
fn user_profile_rejects_ledger_precision() {
    let w = wallet(&[1], VerifyProfile::ledger());
    let snapshot = pool([utxo(1, addr(1), 2_000_000, 20, GENESIS)]);
    let created = w
        .create_transaction(&manual_send(addr(2), 1_000_001, 1, false), &snapshot, GENESIS)
        .unwrap();

    let err = verify_transaction(&created.transaction, &snapshot, GENESIS, &VerifyProfile::user(), SignatureMode::Signed)
        .unwrap_err();
    assert!(!err.is_hard());
    assert_eq!(err, SoftConstraint::TooManyDecimals(0).into());
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[test]
fn signed_transaction_survives_the_wire() {
    let w = wallet(&[1, 2], VerifyProfile::user());
    let snapshot = pool([
        utxo(1, addr(1), 3_000_000, 30, GENESIS),
        utxo(2, addr(2), 2_000_000, 12, GENESIS),
    ]);
    let created = w
        .create_transaction(&manual_send(addr(5), 4_000_000, 6, false), &snapshot, GENESIS)
        .unwrap();

    let bytes = created.encode();
    assert_eq!(bytes.len(), created.transaction.length as usize);

    let decoded = encoding::decode(&bytes).unwrap();
    assert_eq!(decoded, created.transaction);
    assert_eq!(encoding::encode(&decoded), bytes);
    assert_eq!(decoded.hash(), created.txid());

    let from_hex = encoding::decode_hex(&created.encode_hex()).unwrap();
    assert!(w.verify(&from_hex, &snapshot, GENESIS, SignatureMode::Signed).is_ok());
}

#[test]
fn tampered_encoding_fails_verification() {
    let w = wallet(&[1], VerifyProfile::user());
    let snapshot = pool([utxo(1, addr(1), 2_000_000, 20, GENESIS)]);
    let created = w
        .create_transaction(&manual_send(addr(2), 1_000_000, 1, false), &snapshot, GENESIS)
        .unwrap();

    // low byte of the first output's hours: header, one input, address, coins
    let mut bytes = created.encode();
    let hours_offset = (4 + 1 + 32) + (4 + 32) + 4 + 20 + 8;
    bytes[hours_offset] = bytes[hours_offset].wrapping_add(1);

    let tampered = encoding::decode(&bytes).unwrap();
    assert_eq!(
        w.verify(&tampered, &snapshot, GENESIS, SignatureMode::Signed),
        Err(WalletError::Verify(HardConstraint::InnerHashMismatch.into()))
    );
}

// ---------------------------------------------------------------------------
// Chained spends
// ---------------------------------------------------------------------------

#[test]
fn received_outputs_accrue_and_can_be_respent() {
    let profile = VerifyProfile::user();
    let alice = wallet(&[1], profile);
    let bob = wallet(&[2], profile);
    let mut snapshot = pool([utxo(1, addr(1), 2_000_000, 20, GENESIS)]);

    let first = alice
        .create_transaction(&manual_send(addr(2), 1_999_000, 1, false), &snapshot, GENESIS)
        .unwrap();
    let t1 = GENESIS + 3_600;
    snapshot.apply(&first.transaction, t1);

    assert!(!snapshot.contains(&Hash256([1; 32])));
    assert_eq!(snapshot.len(), 2);
    assert_eq!(
        verify_transaction(&first.transaction, &snapshot, t1, &profile, SignatureMode::Signed),
        Err(HardConstraint::UnknownInput(Hash256([1; 32])).into())
    );

    let received = bob.balance(&snapshot, t1).unwrap();
    assert_eq!((received.coins, received.hours), (1_999_000, 1));

    // ten hours later 1.999 coins have earned 19 more hours
    let t2 = t1 + 36_000;
    assert_eq!(bob.balance(&snapshot, t2).unwrap().hours, 20);

    let request = auto_send(&[(addr(3), 1_000_000)], HoursSelection::Auto { share_factor: ShareFactor::ONE }, false);
    let second = bob.create_transaction(&request, &snapshot, t2).unwrap();
    let tx = &second.transaction;
    assert_eq!(tx.outputs[0], TxOutput { address: addr(3), coins: 1_000_000, hours: 10 });
    assert_eq!(tx.outputs[1], TxOutput { address: addr(2), coins: 999_000, hours: 0 });
    assert_eq!(second.fee, 10);
    assert_eq!(second.inputs[0].hours, 1);
    assert_eq!(second.inputs[0].calculated_hours, 20);

    snapshot.apply(tx, t2);
    assert_eq!(alice.balance(&snapshot, t2).unwrap().coins, 1_000);
    assert_eq!(bob.balance(&snapshot, t2).unwrap().coins, 999_000);
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn explicit_outputs_are_spent_in_request_order() {
    let w = wallet(&[1, 2], VerifyProfile::user());
    let snapshot = pool([
        utxo(1, addr(1), 5_000_000, 50, GENESIS),
        utxo(2, addr(2), 1_000_000, 4, GENESIS),
        utxo(3, addr(1), 1_000_000, 6, GENESIS),
    ]);
    let mut request = manual_send(addr(4), 1_000_000, 1, true);
    request.source = InputSource::Outputs(vec![Hash256([3; 32]), Hash256([2; 32])]);

    let created = w.create_transaction(&request, &snapshot, GENESIS).unwrap();
    assert_eq!(created.transaction.inputs, vec![Hash256([3; 32]), Hash256([2; 32])]);
    // change goes to the first selected input's owner
    assert_eq!(created.transaction.outputs[1].address, addr(1));
    assert_eq!(created.transaction.outputs[1].coins, 1_000_000);
}

#[test]
fn foreign_outputs_cannot_be_requested() {
    let w = wallet(&[1], VerifyProfile::user());
    let snapshot = pool([utxo(1, addr(1), 1_000_000, 10, GENESIS), utxo(2, addr(2), 1_000_000, 10, GENESIS)]);

    let mut request = manual_send(addr(4), 1_000_000, 1, true);
    request.source = InputSource::Outputs(vec![Hash256([2; 32])]);
    assert_eq!(
        w.create_transaction(&request, &snapshot, GENESIS),
        Err(WalletError::OutputNotOwned(Hash256([2; 32])))
    );

    request.source = InputSource::Addresses(vec![addr(2)]);
    assert_eq!(
        w.create_transaction(&request, &snapshot, GENESIS),
        Err(WalletError::AddressNotInWallet(addr(2)))
    );

    request.source = InputSource::Outputs(vec![Hash256([8; 32])]);
    assert_eq!(
        w.create_transaction(&request, &snapshot, GENESIS),
        Err(WalletError::UnknownOutput(Hash256([8; 32])))
    );
}

#[test]
fn request_from_json() {
    let w = wallet(&[1], VerifyProfile::user());
    let snapshot = pool([utxo(1, addr(1), 4_000_000, 40, GENESIS)]);
    let json = format!(
        r#"{{
            "to": [
                {{"address": "{a}", "coins": "1.5"}},
                {{"address": "{b}", "coins": "0.5"}}
            ],
            "hours_selection": {{"type": "auto", "share_factor": "0.5"}},
            "change_address": "{c}"
        }}"#,
        a = addr(2),
        b = addr(3),
        c = addr(4),
    );
    let request: SpendRequest = serde_json::from_str(&json).unwrap();
    assert!(!request.unsigned);

    let created = w.create_transaction(&request, &snapshot, GENESIS).unwrap();
    let hours: Vec<u64> = created.transaction.outputs.iter().map(|o| o.hours).collect();
    // budget 20, award 10 split 3:1, change keeps the other 10
    assert_eq!(hours, vec![8, 2, 10]);
    assert_eq!(created.transaction.outputs[2].address, addr(4));
    assert_eq!(created.fee, 20);
}
