//! Coin-hour accrual.
//!
//! An unspent output earns one coin hour per whole coin for every hour it
//! stays unspent, on top of the base hours it was created with. The balance is
//! derived at query time from an explicit `now`, never stored.
//!
//! All arithmetic is integer-only with u128 intermediates; results saturate at
//! `u64::MAX` since accrual is informational until the output is spent.

use serde::{Deserialize, Serialize};

use crate::constants::{DROPLETS_PER_COIN, SECONDS_PER_HOUR};
use crate::types::UnspentOutput;

/// Coins and accrued hours of an output at a point in time.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SpendableBalance {
    pub coins: u64,
    pub hours: u64,
}

/// Hours earned by `coins` droplets held for `elapsed` seconds.
pub fn earned_hours(coins: u64, elapsed: u64) -> u64 {
    let earned = coins as u128 * elapsed as u128 / (DROPLETS_PER_COIN as u128 * SECONDS_PER_HOUR as u128);
    u64::try_from(earned).unwrap_or(u64::MAX)
}

/// Spendable hours of `output` at unix time `now`.
///
/// A `now` earlier than the creation time counts as zero elapsed seconds.
pub fn accrued_hours(output: &UnspentOutput, now: u64) -> u64 {
    let elapsed = now.saturating_sub(output.created_at);
    output.hours.saturating_add(earned_hours(output.coins, elapsed))
}

/// Coins and accrued hours of `output` at unix time `now`.
pub fn spendable(output: &UnspentOutput, now: u64) -> SpendableBalance {
    SpendableBalance {
        coins: output.coins,
        hours: accrued_hours(output, now),
    }
}
