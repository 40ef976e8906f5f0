/// House edge applied to every outcome, in basis points (3.50%)
pub const HOUSE_EDGE_BPS: u128 = 350;

/// Basis point denominator
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Lowest crash multiplier (1.00x, instant crash), scaled by 100
pub const MIN_CRASH_X100: u32 = 100;

/// Highest crash multiplier (500.00x), scaled by 100
pub const MAX_CRASH_X100: u32 = 50_000;

/// Lowest accepted auto-cashout threshold (1.01x), scaled by 100
pub const MIN_AUTO_CASHOUT_X100: u32 = 101;

/// Curve growth factor: multiplier = 1 + A * t^B (t in seconds)
pub const CURVE_A: f64 = 0.62;

/// Curve exponent: multiplier = 1 + A * t^B (t in seconds)
pub const CURVE_B: f64 = 1.25;

/// Number of fractional bits in the seed-derived fixed-point fraction
pub const FRACTION_BITS: u32 = 52;

/// Random bytes in a locally generated seed (hex encoded to twice as many chars)
pub const SEED_BYTES: usize = 16;

/// Volatility fraction used when no token supplies one
pub const DEFAULT_VOLATILITY: f64 = 0.6;

/// Lowest volatility level (highest variance)
pub const MIN_VOLATILITY_LEVEL: u8 = 1;

/// Highest volatility level (lowest variance)
pub const MAX_VOLATILITY_LEVEL: u8 = 5;

/// Rounds kept in the in-memory history trail
pub const HISTORY_LENGTH: usize = 12;

/// Tag carried by every outcome report
pub const REPORT_KIND: &str = "crash_v1";
