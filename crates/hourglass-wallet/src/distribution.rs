//! Hour distribution between destinations, change and the burn.
//!
//! The budget is what the burn policy leaves spendable:
//! `remaining_hours(total_input_hours, burn_factor)`.
//!
//! - **Manual**: destinations get exactly the requested hours. Change gets
//!   whatever budget is left; without change it is burned.
//! - **Auto**: destinations share `floor(budget * share_factor)` in
//!   proportion to their coins. Each gets `floor(award * coins_i / coins)`;
//!   the rounding remainder adds one hour to each of the first destinations
//!   in request order, so the shares sum to the award exactly. Change gets
//!   `budget - award`; without change it is burned.

use tracing::debug;

use hourglass_core::fee;
use hourglass_core::math;

use crate::error::{overflow, WalletError};
use crate::request::{HoursSelection, Receiver};

/// Hours per output and the resulting fee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourDistribution {
    /// One entry per destination, in request order.
    pub destination_hours: Vec<u64>,
    /// Hours on the change output; `None` when there is no change output.
    pub change_hours: Option<u64>,
    /// Hours burned: inputs minus all outputs.
    pub fee: u64,
}

/// Split `total_hours` of input hours across the outputs of a spend.
///
/// `has_change` says whether a change output will be created. Manual mode
/// requires every destination to carry hours.
pub fn distribute(
    total_hours: u64,
    burn_factor: u64,
    destinations: &[Receiver],
    selection: &HoursSelection,
    has_change: bool,
) -> Result<HourDistribution, WalletError> {
    let budget = fee::remaining_hours(total_hours, burn_factor);

    let (destination_hours, change) = match selection {
        HoursSelection::Manual => {
            let requested = destinations
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    d.hours.ok_or_else(|| {
                        WalletError::InvalidRequest(format!("to[{i}].hours is required in manual mode"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let sum = math::sum_u64(requested.iter().copied()).map_err(overflow("total output hours"))?;
            if sum > budget {
                return Err(WalletError::InsufficientHours {
                    have: total_hours,
                    need: sum.saturating_mul(burn_factor.max(1)),
                });
            }
            (requested, budget - sum)
        }
        HoursSelection::Auto { share_factor } => {
            let award = share_factor.apply(budget);
            let coins: Vec<u64> = destinations.iter().map(|d| d.coins).collect();
            (split_proportionally(award, &coins)?, budget - award)
        }
    };

    let change_hours = has_change.then_some(change);
    let allocated = math::add_u64(
        math::sum_u64(destination_hours.iter().copied()).map_err(overflow("total output hours"))?,
        change_hours.unwrap_or(0),
    )
    .map_err(overflow("total output hours"))?;
    let fee = math::sub_u64(total_hours, allocated).map_err(overflow("fee"))?;

    debug!(total_hours, budget, ?change_hours, fee, "distributed hours");
    Ok(HourDistribution { destination_hours, change_hours, fee })
}

/// Split `award` across outputs in proportion to `coins`.
///
/// Shares are floored; the remainder (always fewer hours than outputs) adds
/// one hour to each of the first outputs.
pub fn split_proportionally(award: u64, coins: &[u64]) -> Result<Vec<u64>, WalletError> {
    if coins.is_empty() {
        return Ok(Vec::new());
    }
    let total = math::sum_u64(coins.iter().copied()).map_err(overflow("total output coins"))?;
    if total == 0 {
        return Err(WalletError::InvalidRequest("destination coins must be non-zero".into()));
    }

    let mut shares: Vec<u64> = coins
        .iter()
        .map(|&c| (award as u128 * c as u128 / total as u128) as u64)
        .collect();

    // each share is at most `award`, and they sum to at most `award`
    let distributed: u64 = shares.iter().sum();
    let remainder = (award - distributed) as usize;
    for share in shares.iter_mut().take(remainder) {
        *share += 1;
    }
    Ok(shares)
}
