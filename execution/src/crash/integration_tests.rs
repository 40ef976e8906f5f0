//! End-to-end round flows driven with fixed frame intervals.

use super::*;
use crate::mocks::{create_rng, create_token, prepared_machine, run_to_end};
use crate::Multiplier;
use liftoff_types::crash::{Bet, OutcomeReport, VolatilityLevel};

const FRAME_MS: f64 = 16.0;

fn collect_events(machine: &mut RoundMachine, start_ms: f64) -> Vec<(f64, Event)> {
    let mut events = Vec::new();
    let mut now = start_ms;
    while machine.phase().is_ticking() {
        now += FRAME_MS;
        if let Some(event) = machine.tick(now) {
            if !matches!(event, Event::Flying { .. }) {
                events.push((now, event));
            }
        }
    }
    events
}

#[test]
fn test_auto_cashout_then_crash() {
    let mut machine = prepared_machine(RoundConfig::default(), 500);
    let bet = Bet::new(10.0, Some(2.0)).unwrap();
    machine.place_bet(bet, 0.0).unwrap();

    let events = collect_events(&mut machine, 0.0);
    assert_eq!(events.len(), 2, "{events:?}");

    // First frame whose truncated multiplier reaches 2.00x.
    let (at, event) = events[0];
    assert_eq!(at, 1_472.0);
    let Event::CashedOut { cashout, automatic } = event else {
        panic!("expected cashout, got {event:?}");
    };
    assert!(automatic);
    assert_eq!(cashout.elapsed_ms, 1_472);
    assert_eq!(cashout.multiplier, Multiplier::from_x100(200));
    assert_eq!(cashout.payout, 20.0);

    // Flight continues to the crash instant (~4443.6ms).
    let (at, event) = events[1];
    assert_eq!(at, 4_448.0);
    assert_eq!(
        event,
        Event::Crashed {
            crash: Multiplier::from_x100(500),
            cashout: Some(cashout),
        }
    );

    let report = machine.take_report().unwrap();
    assert_eq!(
        report,
        OutcomeReport {
            kind: Default::default(),
            token: None,
            seed: machine.round().unwrap().seed().to_string(),
            volatility: 0.6,
            bet: 10.0,
            auto_x100: Some(200),
            cashed_out: true,
            cashout_ms: Some(1_472),
            init_data: String::new(),
        }
    );
    assert!(machine.take_report().is_none());

    let settlement = machine.settlement().unwrap();
    assert!(settlement.won());
    assert_eq!(settlement.payout(), 20.0);
    assert_eq!(settlement.crash.x100(), 500);
}

#[test]
fn test_auto_cashout_above_crash_loses() {
    let mut machine = prepared_machine(RoundConfig::default(), 150);
    machine
        .place_bet(Bet::new(3.0, Some(2.0)).unwrap(), 0.0)
        .unwrap();

    let events = collect_events(&mut machine, 0.0);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0].1,
        Event::Crashed {
            cashout: None,
            ..
        }
    ));

    let report = machine.take_report().unwrap();
    assert!(!report.cashed_out);
    assert_eq!(report.cashout_ms, None);
    assert_eq!(machine.settlement().unwrap().payout(), 0.0);
    let latest = machine.history().latest().unwrap();
    assert_eq!(latest.multiplier.x100(), 150);
    assert!(!latest.cashed_out);
}

#[test]
fn test_frame_jitter_never_cashes_out_past_crash() {
    // Irregular frames: one huge gap skips straight past the crash instant.
    let mut machine = prepared_machine(RoundConfig::default(), 200);
    machine
        .place_bet(Bet::new(1.0, Some(1.99)).unwrap(), 0.0)
        .unwrap();

    assert!(matches!(machine.tick(16.0), Some(Event::Flying { .. })));
    let event = machine.tick(5_000.0).unwrap();
    assert!(matches!(event, Event::Crashed { cashout: None, .. }));
    assert!(!machine.take_report().unwrap().cashed_out);
}

#[test]
fn test_token_rounds_report_token() {
    let token = create_token("abc", 0.0);
    let raw = token.raw().to_string();
    let config = RoundConfig {
        init_data: "user=1".to_string(),
        ..RoundConfig::default()
    };
    let mut machine = RoundMachine::new(config, SeedSource::Token(token)).unwrap();
    assert_eq!(machine.volatility_level(), VolatilityLevel::MAX);

    let mut rng = create_rng(1);
    let preparation = machine.prepare(&mut rng).unwrap();
    let crash = machine.complete(preparation.run()).unwrap();
    assert_eq!(crash.x100(), 121);

    machine
        .place_bet(Bet::new(2.5, None).unwrap(), 10_000.0)
        .unwrap();
    run_to_end(&mut machine, 10_000.0, FRAME_MS);

    let report = machine.take_report().unwrap();
    assert_eq!(report.token.as_deref(), Some(raw.as_str()));
    assert_eq!(report.seed, "abc");
    assert_eq!(report.volatility, 0.0);
    assert_eq!(report.init_data, "user=1");
    assert_eq!(report.auto_x100, None);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["kind"], "crash_v1");
    assert_eq!(json["t"], raw.as_str());
    assert_eq!(json["cashed_out"], false);
    assert!(json["cashout_ms"].is_null());
}

#[test]
fn test_consecutive_rounds() {
    let mut machine = RoundMachine::new(RoundConfig::default(), SeedSource::local()).unwrap();
    let mut rng = create_rng(42);
    let mut now = 0.0;
    let mut reports = 0;

    for round in 1..=5u64 {
        let preparation = machine.prepare(&mut rng).unwrap();
        assert_eq!(preparation.generation(), round);
        let crash = machine.complete(preparation.run()).unwrap();

        machine.place_bet(Bet::new(1.0, None).unwrap(), now).unwrap();
        now = run_to_end(&mut machine, now, FRAME_MS);
        assert_eq!(machine.phase(), Phase::Crashed);

        if machine.take_report().is_some() {
            reports += 1;
        }
        assert_eq!(machine.settlement().unwrap().crash, crash);
        assert_eq!(machine.settlement().unwrap().generation, round);
    }

    assert_eq!(reports, 5);
    assert_eq!(machine.history().iter().count(), 5);
}

#[test]
fn test_stale_preparation_after_supersede() {
    let mut machine = RoundMachine::new(RoundConfig::default(), SeedSource::local()).unwrap();
    let mut rng = create_rng(8);

    let slow = machine.prepare(&mut rng).unwrap();
    let fast = machine.prepare(&mut rng).unwrap();
    let fast_seed = fast.seed().to_string();

    // Newer preparation lands first, older one afterwards.
    machine.complete(fast.run()).unwrap();
    assert!(matches!(
        machine.complete(slow.run()),
        Err(RoundError::Stale { current: 2, got: 1 })
    ));

    let round = machine.round().unwrap();
    assert_eq!(round.seed(), fast_seed);
    assert_eq!(machine.phase(), Phase::Ready);
}
