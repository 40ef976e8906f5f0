//! Crash game execution module.
//!
//! This module contains the game logic for the crash game:
//! - Fairness engine (seed -> crash multiplier)
//! - Multiplier-time curve
//! - Round state machine
//! - Round history

pub mod curve;
pub mod history;
#[cfg(test)]
mod integration_tests;
pub mod round;

pub use curve::{crash_time_ms, multiplier_at, time_for_multiplier};
pub use history::{History, HistoryEntry};
pub use round::{
    Cashout, Event, Phase, Prepared, Preparation, Round, RoundConfig, RoundError, RoundMachine,
    SeedSource, Settlement,
};

use crate::fixed::Multiplier;
use commonware_cryptography::sha256::Sha256;
use commonware_cryptography::Hasher;
use commonware_utils::hex;
use liftoff_types::crash::{
    VolatilityLevel, BPS_DENOMINATOR, FRACTION_BITS, HOUSE_EDGE_BPS, MAX_CRASH_X100,
    MIN_CRASH_X100, SEED_BYTES,
};
use rand::RngCore;

/// 1.0 in the seed fraction's fixed-point representation (2^52).
const FRACTION_ONE: u128 = 1 << FRACTION_BITS;

/// Derive the 52-bit fixed-point fraction for a seed.
///
/// Hashes the seed's UTF-8 bytes with SHA256 and keeps the leading 56 bits
/// of the digest, shifted right by 4.
pub fn seed_fraction(seed: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize().0;

    let mut leading = [0u8; 8];
    leading[1..].copy_from_slice(&digest[..7]);
    u64::from_be_bytes(leading) >> 4
}

/// Map a 52-bit fraction onto a crash multiplier.
///
/// All arithmetic is exact integer math. Only the low 52 bits of `fraction`
/// are used.
pub fn crash_from_fraction(fraction: u64, level: VolatilityLevel) -> Multiplier {
    let r = fraction as u128 & (FRACTION_ONE - 1);

    // r^k, renormalizing after every multiply
    let mut r_pow = r;
    for _ in 1..level.exponent() {
        r_pow = (r_pow * r) >> FRACTION_BITS;
    }

    // Safety clamp: r_pow < 2^52 for any masked input, so this never fires.
    let denom = match FRACTION_ONE.checked_sub(r_pow) {
        Some(denom) if denom > 0 => denom,
        _ => return Multiplier::from_x100(MIN_CRASH_X100),
    };

    let numerator = (BPS_DENOMINATOR - HOUSE_EDGE_BPS) * 100 * FRACTION_ONE;
    let x100 = numerator / (BPS_DENOMINATOR * denom);
    let x100 = x100.clamp(MIN_CRASH_X100 as u128, MAX_CRASH_X100 as u128);
    Multiplier::from_x100(x100 as u32)
}

/// Derive the crash multiplier for a round.
///
/// Deterministic and total: the same `(seed, level)` always yields the same
/// multiplier in `[1.00x, 500.00x]`.
pub fn derive_crash_multiplier(seed: &str, level: VolatilityLevel) -> Multiplier {
    crash_from_fraction(seed_fraction(seed), level)
}

/// Generate a fresh hex seed from a cryptographically secure source.
pub fn fresh_seed<R: RngCore + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; SEED_BYTES];
    rng.fill_bytes(&mut bytes);
    hex(&bytes)
}
