//! # hourglass-core
//! Foundation types, arithmetic and verification for the Hourglass ledger.
//!
//! All quantities are integer droplets (1 coin = 10^6 droplets) and integer
//! coin hours. Nothing in this crate touches floating point, wall clocks or
//! unordered iteration, so every computation is reproducible across nodes.

pub mod accrual;
pub mod address;
pub mod constants;
pub mod crypto;
pub mod droplet;
pub mod encoding;
pub mod error;
pub mod fee;
pub mod math;
pub mod policy;
pub mod traits;
pub mod types;
pub mod validation;
