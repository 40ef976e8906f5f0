use liftoff_types::crash::MIN_CRASH_X100;
use std::fmt;

// Scaling factor for displayed and reported multipliers
// Using 100 for two decimal places (hundredths)
pub const SCALE: u32 = 100;

/// Fixed-point multiplier with 2 decimal places of precision
///
/// Conversions from floating point always truncate, never round, so a
/// displayed or reported value can never exceed what the curve produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Multiplier(u32);

impl Multiplier {
    /// 1.00x
    pub const ONE: Self = Multiplier(SCALE);

    /// Create from a value already scaled by 100
    pub fn from_x100(value: u32) -> Self {
        Multiplier(value)
    }

    /// Truncate a floating point multiplier to hundredths
    pub fn floor_from(value: f64) -> Self {
        let scaled = (value * SCALE as f64).floor();
        if scaled.is_nan() || scaled < MIN_CRASH_X100 as f64 {
            return Self::ONE;
        }
        if scaled >= u32::MAX as f64 {
            return Multiplier(u32::MAX);
        }
        Multiplier(scaled as u32)
    }

    /// Get the raw scaled value
    pub fn x100(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    /// Total return on a stake cashed out at this multiplier
    pub fn payout(self, bet: f64) -> f64 {
        bet * self.0 as f64 / SCALE as f64
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}×", self.0 / SCALE, self.0 % SCALE)
    }
}
