//! Protocol constants. Coin values in droplets (1 coin = 10^6 droplets).

/// Droplets per whole coin.
pub const DROPLETS_PER_COIN: u64 = 1_000_000;

/// Number of decimal places a droplet amount can carry (`log10(DROPLETS_PER_COIN)`).
pub const MAX_DECIMALS: u8 = 6;

/// Seconds in one hour; one whole coin accrues one coin hour per hour held.
pub const SECONDS_PER_HOUR: u64 = 3_600;

/// The only transaction type currently defined.
pub const TX_TYPE: u8 = 0;

/// Length of an address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Length of a hash in bytes.
pub const HASH_LEN: usize = 32;

/// Length of a recoverable signature (64-byte compact ECDSA + recovery id).
pub const SIGNATURE_LEN: usize = 65;

/// Encoded size of one output: address, coins (u64), hours (u64).
pub const OUTPUT_LEN: usize = ADDRESS_LEN + 8 + 8;

/// Fixed part of an encoded transaction: length (u32), type (u8), inner hash,
/// and the three u32 section counts.
pub const TX_HEADER_LEN: usize = 4 + 1 + HASH_LEN + 3 * 4;

/// Default maximum encoded transaction size in bytes.
pub const DEFAULT_MAX_TX_SIZE: usize = 32 * 1024;

/// Default burn factor: at least half of the input hours must be destroyed.
pub const DEFAULT_BURN_FACTOR: u64 = 2;

/// Decimal places accepted for user-submitted coin amounts.
pub const DEFAULT_USER_DECIMALS: u8 = 3;
