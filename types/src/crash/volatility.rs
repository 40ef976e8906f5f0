use super::{MAX_VOLATILITY_LEVEL, MIN_VOLATILITY_LEVEL};
use std::fmt;
use thiserror::Error;

/// Input rejected before it can reach the round state machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("bet must be a number greater than 0")]
    Amount,
    #[error("auto-cashout must be between 1.01x and 500.00x")]
    AutoCashout,
    #[error("volatility must be a finite number (got {0})")]
    Volatility(f64),
}

/// Exponent applied to the seed fraction by the fairness engine.
///
/// Level 1 produces the widest spread of crash points, level 5 the
/// narrowest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VolatilityLevel(u8);

impl VolatilityLevel {
    pub const MIN: Self = Self(MIN_VOLATILITY_LEVEL);
    pub const MAX: Self = Self(MAX_VOLATILITY_LEVEL);

    /// Create a level, returning `None` outside `[1, 5]`.
    pub fn new(level: u8) -> Option<Self> {
        (MIN_VOLATILITY_LEVEL..=MAX_VOLATILITY_LEVEL)
            .contains(&level)
            .then_some(Self(level))
    }

    /// Map an issuer volatility fraction (nominally `[0, 1]`) onto a level.
    ///
    /// `level = clamp(5 - round(vol * 4), 1, 5)`, so a fraction of 1 maps to
    /// the highest variance.
    pub fn from_fraction(volatility: f64) -> Result<Self, ValidationError> {
        if !volatility.is_finite() {
            return Err(ValidationError::Volatility(volatility));
        }
        let level = MAX_VOLATILITY_LEVEL as f64 - (volatility * 4.0).round();
        let level = level.clamp(MIN_VOLATILITY_LEVEL as f64, MAX_VOLATILITY_LEVEL as f64);
        Ok(Self(level as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Power the fixed-point fraction is raised to.
    pub fn exponent(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for VolatilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
