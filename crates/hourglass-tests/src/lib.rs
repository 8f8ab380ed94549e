//! End-to-end and property test suite for Hourglass.
//!
//! Integration tests live under `tests/`; they drive the wallet the way a
//! caller would, from a spend request and a snapshot to a signed, verified
//! transaction and its canonical encoding.

pub mod helpers;
