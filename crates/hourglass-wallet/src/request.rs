//! Spend requests.
//!
//! The request surface handed to the wallet by an outer API layer: where the
//! inputs may come from, who gets paid, and how hours are allocated. Coin
//! amounts serialize as decimal coin strings and hours as base-10 strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use hourglass_core::address::Address;
use hourglass_core::error::AmountError;
use hourglass_core::types::Hash256;

/// Maximum fractional digits accepted in a share factor string.
pub const MAX_SHARE_FACTOR_DECIMALS: usize = 18;

/// One destination of a spend.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Receiver {
    pub address: Address,
    /// Droplets.
    #[serde(with = "coin_string")]
    pub coins: u64,
    /// Hours, required in manual mode and absent in auto mode.
    #[serde(default, with = "hours_string", skip_serializing_if = "Option::is_none")]
    pub hours: Option<u64>,
}

/// Exact share factor `numerator / denominator` in `[0, 1]`.
#[derive(Clone, Copy, Debug)]
pub struct ShareFactor {
    numerator: u64,
    denominator: u64,
}

impl ShareFactor {
    pub const ZERO: Self = Self { numerator: 0, denominator: 1 };
    pub const ONE: Self = Self { numerator: 1, denominator: 1 };

    /// Create a share factor from a fraction. Fails unless `0 <= n/d <= 1`.
    pub fn new(numerator: u64, denominator: u64) -> Result<Self, AmountError> {
        if denominator == 0 || numerator > denominator {
            return Err(AmountError::InvalidShareFactor(format!("{numerator}/{denominator}")));
        }
        Ok(Self { numerator, denominator })
    }

    /// Parse a decimal string such as `"0.5"` or `"1"`.
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        let invalid = || AmountError::InvalidShareFactor(s.to_string());

        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if s.ends_with('.') || frac.len() > MAX_SHARE_FACTOR_DECIMALS {
            return Err(invalid());
        }
        if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let denominator = 10u64.pow(frac.len() as u32);
        let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
        let frac: u64 = if frac.is_empty() { 0 } else { frac.parse().map_err(|_| invalid())? };
        let numerator = whole
            .checked_mul(denominator)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(invalid)?;
        Self::new(numerator, denominator).map_err(|_| invalid())
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    pub fn is_one(&self) -> bool {
        self.numerator == self.denominator
    }

    /// `floor(value * self)`.
    pub fn apply(&self, value: u64) -> u64 {
        let scaled = value as u128 * self.numerator as u128 / self.denominator as u128;
        // numerator <= denominator, so this never exceeds `value`
        scaled as u64
    }
}

impl PartialEq for ShareFactor {
    fn eq(&self, other: &Self) -> bool {
        self.numerator as u128 * other.denominator as u128
            == other.numerator as u128 * self.denominator as u128
    }
}

impl Eq for ShareFactor {}

impl Default for ShareFactor {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for ShareFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.numerator / self.denominator;
        let rem = self.numerator % self.denominator;
        if rem == 0 {
            return write!(f, "{whole}");
        }
        // denominators from `parse` are powers of ten; others print as a fraction
        let digits = self.denominator.ilog10();
        if 10u64.pow(digits) == self.denominator {
            let frac = format!("{rem:0width$}", width = digits as usize);
            write!(f, "{whole}.{}", frac.trim_end_matches('0'))
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl FromStr for ShareFactor {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ShareFactor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ShareFactor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// How the post-burn hour budget is allocated.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HoursSelection {
    /// Each destination carries the hours given in the request.
    Manual,
    /// `floor(budget * share_factor)` goes to the destinations in proportion
    /// to their coins; the rest goes to change.
    Auto { share_factor: ShareFactor },
}

impl Default for HoursSelection {
    fn default() -> Self {
        HoursSelection::Auto { share_factor: ShareFactor::default() }
    }
}

/// Where the inputs of a spend may come from.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    /// Any output owned by a wallet address.
    #[default]
    All,
    /// Exactly these outputs, all of them, in this order.
    Outputs(Vec<Hash256>),
    /// Any output owned by one of these wallet addresses.
    Addresses(Vec<Address>),
}

/// A complete spend request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SpendRequest {
    #[serde(default)]
    pub source: InputSource,
    #[serde(alias = "to")]
    pub destinations: Vec<Receiver>,
    #[serde(default)]
    pub hours_selection: HoursSelection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_address: Option<Address>,
    /// Leave every signature slot null.
    #[serde(default)]
    pub unsigned: bool,
}

mod coin_string {
    use hourglass_core::droplet;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(coins: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&droplet::format(*coins))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        droplet::parse(&s).map_err(serde::de::Error::custom)
    }
}

mod hours_string {
    use hourglass_core::droplet;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hours: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match hours {
            Some(h) => serializer.serialize_some(&h.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| droplet::parse_hours(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
