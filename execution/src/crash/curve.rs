//! Multiplier-time curve.
//!
//! `multiplier = 1 + A * t^B` with `t` in seconds. Display-only floats live
//! here; crash points themselves are derived with integer math.

use crate::fixed::Multiplier;
use liftoff_types::crash::{CURVE_A, CURVE_B};

/// Multiplier reached after `elapsed_ms` of flight.
pub fn multiplier_at(elapsed_ms: f64) -> f64 {
    let seconds = elapsed_ms.max(0.0) / 1000.0;
    1.0 + CURVE_A * seconds.powf(CURVE_B)
}

/// Elapsed milliseconds at which the curve reaches `multiplier`.
pub fn time_for_multiplier(multiplier: f64) -> f64 {
    let x = ((multiplier.max(1.0) - 1.0) / CURVE_A).max(0.0);
    x.powf(1.0 / CURVE_B) * 1000.0
}

/// Elapsed milliseconds at which a round with this crash point must end.
pub fn crash_time_ms(crash: Multiplier) -> f64 {
    time_for_multiplier(crash.as_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let tolerance = 1e-6 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_sample_at_one_second() {
        assert_close(multiplier_at(1000.0), 1.62);
    }

    #[test]
    fn test_origin() {
        assert_eq!(multiplier_at(0.0), 1.0);
        assert_eq!(time_for_multiplier(1.0), 0.0);
    }

    #[test]
    fn test_clamps_inputs() {
        assert_eq!(multiplier_at(-500.0), 1.0);
        assert_eq!(time_for_multiplier(0.5), 0.0);
    }

    #[test]
    fn test_round_trip() {
        for m in [1.0, 1.62, 5.0, 100.0] {
            assert_close(multiplier_at(time_for_multiplier(m)), m);
        }
    }

    #[test]
    fn test_monotonic() {
        let mut previous = multiplier_at(0.0);
        for ms in (16..20_000).step_by(16) {
            let current = multiplier_at(ms as f64);
            assert!(current > previous);
            previous = current;
        }
    }

    #[test]
    fn test_crash_time() {
        assert_eq!(crash_time_ms(Multiplier::ONE), 0.0);
        assert_close(crash_time_ms(Multiplier::from_x100(162)), 1000.0);
        // 2.00x is reached a little under 1.5s into the flight.
        let two = crash_time_ms(Multiplier::from_x100(200));
        assert!(two > 1460.0 && two < 1470.0, "{two}");
    }
}
