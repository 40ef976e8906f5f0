use crate::{
    crash::{RoundConfig, RoundMachine, SeedSource},
    Multiplier,
};
use liftoff_types::crash::{Token, TokenPayload};
use rand::{rngs::StdRng, SeedableRng};

/// Creates a deterministic RNG for seed generation
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Creates a token carrying the given seed and volatility
pub fn create_token(seed: &str, volatility: f64) -> Token {
    let payload = TokenPayload {
        seed: seed.to_string(),
        vol: Some(volatility),
    };
    let raw = Token::encode(&payload, "test-signature").expect("payload encodes");
    Token::parse(&raw).expect("token parses")
}

/// Creates a machine with a round ready at a fixed crash point
pub fn prepared_machine(config: RoundConfig, crash_x100: u32) -> RoundMachine {
    let mut machine = RoundMachine::new(config, SeedSource::local()).expect("valid source");
    let mut rng = create_rng(0);
    let preparation = machine.prepare(&mut rng).expect("machine is idle");
    machine
        .complete(preparation.run_with(Multiplier::from_x100(crash_x100)))
        .expect("preparation is current");
    machine
}

/// Drives a running round in fixed frames until it stops ticking
///
/// Returns the time of the last tick.
pub fn run_to_end(machine: &mut RoundMachine, start_ms: f64, frame_ms: f64) -> f64 {
    let mut now = start_ms;
    while machine.phase().is_ticking() {
        now += frame_ms;
        machine.tick(now);
    }
    now
}
