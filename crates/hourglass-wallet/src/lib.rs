//! # hourglass-wallet — spend construction and signing.
//!
//! Turns a spend request and a snapshot of unspent outputs into an unsigned
//! transaction, then signs it with keys derived from a seed.
//!
//! # Modules
//!
//! - [`error`] — `WalletError` enum
//! - [`request`] — Spend requests, hour selection modes and share factors
//! - [`coin_selection`] — Explicit and greedy input selection
//! - [`distribution`] — Hour allocation between destinations, change and the burn
//! - [`builder`] — Transaction builder
//! - [`keys`] — Seed, KeyRing, BLAKE3-based key derivation
//! - [`signer`] — Full, partial and incremental signing
//! - [`wallet`] — High-level wallet composition

pub mod builder;
pub mod coin_selection;
pub mod distribution;
pub mod error;
pub mod keys;
pub mod request;
pub mod signer;
pub mod wallet;

pub use builder::{CreatedInput, CreatedTransaction, TransactionBuilder};
pub use coin_selection::{CoinSelection, CoinSelector};
pub use distribution::HourDistribution;
pub use error::WalletError;
pub use keys::{KeyRing, Seed};
pub use request::{HoursSelection, InputSource, Receiver, ShareFactor, SpendRequest};
pub use signer::sign_transaction;
pub use wallet::{Wallet, WalletBalance};
