use super::{ValidationError, MAX_CRASH_X100, MIN_AUTO_CASHOUT_X100};

/// Parse a money-like amount typed by a player.
///
/// Accepts a comma as the decimal separator. Empty or non-numeric input
/// yields `None`.
pub fn parse_amount(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.replacen(',', ".", 1);
    let value: f64 = normalized.parse().ok()?;
    value.is_finite().then_some(value)
}

/// A validated wager for a single round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bet {
    pub amount: f64,
    pub auto_cashout_x100: Option<u32>,
}

impl Bet {
    /// Validate a stake and an optional auto-cashout multiplier.
    pub fn new(amount: f64, auto_cashout: Option<f64>) -> Result<Self, ValidationError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::Amount);
        }
        let auto_cashout_x100 = match auto_cashout {
            None => None,
            Some(multiplier) => Some(auto_cashout_x100(multiplier)?),
        };
        Ok(Self {
            amount,
            auto_cashout_x100,
        })
    }

    /// Validate raw form input. An empty auto-cashout field disables it.
    pub fn from_input(amount: &str, auto_cashout: &str) -> Result<Self, ValidationError> {
        let amount = parse_amount(amount).ok_or(ValidationError::Amount)?;
        let auto_cashout = if auto_cashout.trim().is_empty() {
            None
        } else {
            Some(parse_amount(auto_cashout).ok_or(ValidationError::AutoCashout)?)
        };
        Self::new(amount, auto_cashout)
    }
}

fn auto_cashout_x100(multiplier: f64) -> Result<u32, ValidationError> {
    if !multiplier.is_finite() {
        return Err(ValidationError::AutoCashout);
    }
    // Nudge before flooring so "1.15" stays 115 instead of 114.99999.
    let scaled = (multiplier * 100.0 + 1e-9).floor();
    if scaled < MIN_AUTO_CASHOUT_X100 as f64 || scaled > MAX_CRASH_X100 as f64 {
        return Err(ValidationError::AutoCashout);
    }
    Ok(scaled as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("10"), Some(10.0));
        assert_eq!(parse_amount("  2.5 "), Some(2.5));
        assert_eq!(parse_amount("2,5"), Some(2.5));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("ten"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_bet_amount_validation() {
        assert_eq!(Bet::new(0.0, None), Err(ValidationError::Amount));
        assert_eq!(Bet::new(-1.0, None), Err(ValidationError::Amount));
        assert_eq!(Bet::new(f64::NAN, None), Err(ValidationError::Amount));
        let bet = Bet::new(10.0, None).unwrap();
        assert_eq!(bet.amount, 10.0);
        assert_eq!(bet.auto_cashout_x100, None);
    }

    #[test]
    fn test_auto_cashout_floors_to_hundredths() {
        assert_eq!(Bet::new(1.0, Some(2.0)).unwrap().auto_cashout_x100, Some(200));
        assert_eq!(Bet::new(1.0, Some(1.15)).unwrap().auto_cashout_x100, Some(115));
        assert_eq!(Bet::new(1.0, Some(1.019)).unwrap().auto_cashout_x100, Some(101));
        assert_eq!(Bet::new(1.0, Some(500.0)).unwrap().auto_cashout_x100, Some(50_000));
    }

    #[test]
    fn test_auto_cashout_bounds() {
        assert_eq!(Bet::new(1.0, Some(1.0)), Err(ValidationError::AutoCashout));
        assert_eq!(Bet::new(1.0, Some(1.009)), Err(ValidationError::AutoCashout));
        assert_eq!(Bet::new(1.0, Some(500.01)), Err(ValidationError::AutoCashout));
        assert_eq!(Bet::new(1.0, Some(f64::INFINITY)), Err(ValidationError::AutoCashout));
    }

    #[test]
    fn test_from_input() {
        let bet = Bet::from_input("10", "").unwrap();
        assert_eq!(bet, Bet { amount: 10.0, auto_cashout_x100: None });

        let bet = Bet::from_input("5,5", "2,25").unwrap();
        assert_eq!(bet, Bet { amount: 5.5, auto_cashout_x100: Some(225) });

        assert_eq!(Bet::from_input("", "2"), Err(ValidationError::Amount));
        assert_eq!(Bet::from_input("0", ""), Err(ValidationError::Amount));
        assert_eq!(Bet::from_input("1", "abc"), Err(ValidationError::AutoCashout));
    }
}
