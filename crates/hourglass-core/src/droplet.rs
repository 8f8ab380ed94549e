//! Fixed-point decimal coin amounts.
//!
//! Coin amounts travel as decimal strings ("1.5") and are held as integer
//! droplets (1_500_000). Parsing is exact: a string either maps to one droplet
//! value or is rejected, so `parse(&format(x)) == x` for every `x`.

use crate::constants::{DROPLETS_PER_COIN, MAX_DECIMALS};
use crate::error::AmountError;

/// Parse a decimal coin string into droplets.
///
/// Accepts `digits`, `digits.digits` and `.digits`. Rejects signs,
/// whitespace, exponents, more than [`MAX_DECIMALS`] fractional digits
/// (trailing zeros included) and values above `u64::MAX` droplets.
pub fn parse(s: &str) -> Result<u64, AmountError> {
    if s.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (s, None),
    };

    if let Some(c) = whole.chars().find(|c| !c.is_ascii_digit()) {
        return Err(AmountError::InvalidCharacter(c));
    }

    let frac = match frac {
        Some("") => return Err(AmountError::InvalidCharacter('.')),
        Some(f) => {
            if let Some(c) = f.chars().find(|c| !c.is_ascii_digit()) {
                return Err(AmountError::InvalidCharacter(c));
            }
            f
        }
        None => "",
    };

    if frac.len() > MAX_DECIMALS as usize {
        return Err(AmountError::TooManyDecimals);
    }

    let mut whole_value: u64 = 0;
    for d in whole.bytes() {
        whole_value = whole_value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(d - b'0')))
            .ok_or(AmountError::Overflow)?;
    }

    let mut frac_value: u64 = 0;
    for i in 0..MAX_DECIMALS as usize {
        let digit = frac.as_bytes().get(i).map_or(0, |d| u64::from(d - b'0'));
        frac_value = frac_value * 10 + digit;
    }

    whole_value
        .checked_mul(DROPLETS_PER_COIN)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or(AmountError::Overflow)
}

/// Render droplets as the canonical decimal coin string.
pub fn format(droplets: u64) -> String {
    let whole = droplets / DROPLETS_PER_COIN;
    let frac = droplets % DROPLETS_PER_COIN;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:06}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Check that `droplets` uses at most `max_decimals` decimal places.
pub fn check_precision(droplets: u64, max_decimals: u8) -> Result<(), AmountError> {
    if max_decimals >= MAX_DECIMALS {
        return Ok(());
    }
    let divisor = 10u64.pow(u32::from(MAX_DECIMALS - max_decimals));
    if droplets % divisor != 0 {
        return Err(AmountError::TooManyDecimals);
    }
    Ok(())
}

/// Parse an unsigned base-10 coin hour string.
pub fn parse_hours(s: &str) -> Result<u64, AmountError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::InvalidHours(s.to_string()));
    }
    s.parse::<u64>()
        .map_err(|_| AmountError::InvalidHours(s.to_string()))
}
