//! Round state machine.
//!
//! Lifecycle:
//! `Idle -> Preparing -> Ready -> Running -> {Crashed | CashedOutWaiting | CashedOut} -> Reported`
//!
//! The machine never reads a clock. Callers pass the current wall-clock time
//! in milliseconds to every time-dependent transition, and run the
//! [Preparation] returned by [RoundMachine::prepare] wherever they like
//! before handing the [Prepared] result back.
//!
//! Within a tick the crash check runs before the auto-cashout check: a
//! player can never cash out at or after the crash instant.

use super::{
    crash_time_ms, derive_crash_multiplier, fresh_seed, multiplier_at, History, HistoryEntry,
};
use crate::fixed::Multiplier;
use liftoff_types::crash::{
    Bet, OutcomeReport, ReportKind, Token, ValidationError, VolatilityLevel, DEFAULT_VOLATILITY,
};
use rand::RngCore;
use thiserror::Error;
use tracing::{debug, info};

/// Round lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No round has been requested yet.
    Idle,
    /// Crash point is being derived.
    Preparing,
    /// Crash point is fixed, waiting for a bet.
    Ready,
    /// Rocket is flying with the player's stake on board.
    Running,
    /// Player cashed out, flight continues to the crash instant.
    CashedOutWaiting,
    /// Player cashed out and the round ended at that instant.
    CashedOut,
    /// Crash instant reached.
    Crashed,
    /// Outcome report handed out.
    Reported,
}

impl Phase {
    /// Phases that need a tick every frame.
    pub fn is_ticking(self) -> bool {
        matches!(self, Phase::Running | Phase::CashedOutWaiting)
    }

    /// Phases holding an outcome that has not been reported yet.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Crashed | Phase::CashedOut)
    }
}

/// Error during a round transition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoundError {
    #[error("a round is already in flight")]
    Busy,
    #[error("round is still being prepared")]
    Preparing,
    #[error("no round is ready for a bet")]
    NotReady,
    #[error("no round is running")]
    NotRunning,
    #[error("player already cashed out")]
    AlreadyCashedOut,
    #[error("previous round has not been reported")]
    Unreported,
    #[error("stale preparation (current generation {current}, got {got})")]
    Stale { current: u64, got: u64 },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Behaviour switches for the machine.
#[derive(Clone, Debug)]
pub struct RoundConfig {
    /// Draw a new local seed for every round instead of reusing the first.
    /// Has no effect when a token pins the seed.
    pub regenerate_seed_on_start: bool,

    /// Keep flying after a cashout until the crash instant. When false the
    /// round ends (and is reported) at the cashout.
    pub wait_for_crash: bool,

    /// Opaque host data copied into every outcome report.
    pub init_data: String,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            regenerate_seed_on_start: true,
            wait_for_crash: true,
            init_data: String::new(),
        }
    }
}

/// Where round seeds come from.
#[derive(Clone, Debug)]
pub enum SeedSource {
    /// Seed and volatility issued externally.
    Token(Token),
    /// Seeds generated locally.
    Local { volatility: f64 },
}

impl SeedSource {
    pub fn local() -> Self {
        SeedSource::Local {
            volatility: DEFAULT_VOLATILITY,
        }
    }

    fn volatility(&self) -> f64 {
        match self {
            SeedSource::Token(token) => token.volatility(),
            SeedSource::Local { volatility } => *volatility,
        }
    }

    fn level(&self) -> Result<VolatilityLevel, ValidationError> {
        match self {
            SeedSource::Token(token) => Ok(token.volatility_level()),
            SeedSource::Local { volatility } => VolatilityLevel::from_fraction(*volatility),
        }
    }
}

/// Work needed to fix a round's crash point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preparation {
    generation: u64,
    seed: String,
    level: VolatilityLevel,
}

impl Preparation {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn level(&self) -> VolatilityLevel {
        self.level
    }

    /// Derive the crash point and crash instant.
    pub fn run(self) -> Prepared {
        let crash = derive_crash_multiplier(&self.seed, self.level);
        self.resolve(crash)
    }

    /// Resolve with a fixed crash point instead of the derived one.
    #[cfg(any(test, feature = "mocks"))]
    pub fn run_with(self, crash: Multiplier) -> Prepared {
        self.resolve(crash)
    }

    fn resolve(self, crash: Multiplier) -> Prepared {
        Prepared {
            generation: self.generation,
            crash,
            crash_time_ms: crash_time_ms(crash),
        }
    }
}

/// Result of a [Preparation], tagged with the generation it belongs to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prepared {
    generation: u64,
    crash: Multiplier,
    crash_time_ms: f64,
}

impl Prepared {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn crash(&self) -> Multiplier {
        self.crash
    }

    pub fn crash_time_ms(&self) -> f64 {
        self.crash_time_ms
    }
}

/// Player's exit from a round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cashout {
    /// Flight time at cashout, floored to whole milliseconds.
    pub elapsed_ms: u64,
    /// Curve value at cashout, truncated to hundredths.
    pub multiplier: Multiplier,
    /// Total return (stake included).
    pub payout: f64,
}

/// Something observable that happened during a transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    Flying {
        multiplier: Multiplier,
    },
    CashedOut {
        cashout: Cashout,
        automatic: bool,
    },
    Crashed {
        crash: Multiplier,
        cashout: Option<Cashout>,
    },
}

/// Final result of a finished round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settlement {
    pub generation: u64,
    pub crash: Multiplier,
    pub bet: f64,
    pub cashout: Option<Cashout>,
}

impl Settlement {
    pub fn won(&self) -> bool {
        self.cashout.is_some()
    }

    /// Total return to the player (0 when the stake was lost).
    pub fn payout(&self) -> f64 {
        self.cashout.map_or(0.0, |cashout| cashout.payout)
    }
}

/// The live round.
#[derive(Clone, Debug, PartialEq)]
pub struct Round {
    token: Option<String>,
    seed: String,
    volatility: f64,
    level: VolatilityLevel,
    crash: Multiplier,
    crash_time_ms: f64,
    bet: Option<Bet>,
    started_at_ms: f64,
    cashout: Option<Cashout>,
    result_reported: bool,
}

impl Round {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn volatility_level(&self) -> VolatilityLevel {
        self.level
    }

    pub fn crash(&self) -> Multiplier {
        self.crash
    }

    pub fn crash_time_ms(&self) -> f64 {
        self.crash_time_ms
    }

    pub fn bet(&self) -> Option<&Bet> {
        self.bet.as_ref()
    }

    pub fn cashed_out(&self) -> bool {
        self.cashout.is_some()
    }

    pub fn cashout(&self) -> Option<&Cashout> {
        self.cashout.as_ref()
    }

    pub fn result_reported(&self) -> bool {
        self.result_reported
    }

    fn elapsed(&self, now_ms: f64) -> f64 {
        (now_ms - self.started_at_ms).max(0.0)
    }

    fn stake(&self) -> f64 {
        self.bet.map_or(0.0, |bet| bet.amount)
    }

    fn auto_cashout_x100(&self) -> Option<u32> {
        self.bet.and_then(|bet| bet.auto_cashout_x100)
    }
}

/// Sequences a single live round at a time.
pub struct RoundMachine {
    config: RoundConfig,
    source: SeedSource,
    level: VolatilityLevel,
    phase: Phase,
    generation: u64,
    local_seed: Option<String>,
    pending: Option<Preparation>,
    round: Option<Round>,
    settlement: Option<Settlement>,
    history: History,
}

impl RoundMachine {
    pub fn new(config: RoundConfig, source: SeedSource) -> Result<Self, ValidationError> {
        let level = source.level()?;
        Ok(Self {
            config,
            source,
            level,
            phase: Phase::Idle,
            generation: 0,
            local_seed: None,
            pending: None,
            round: None,
            settlement: None,
            history: History::default(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Generation of the most recent preparation request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    /// Result of the most recently finished round.
    pub fn settlement(&self) -> Option<&Settlement> {
        self.settlement.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn volatility_level(&self) -> VolatilityLevel {
        self.level
    }

    /// Request a new round.
    ///
    /// Any preparation still outstanding is superseded: its result will be
    /// rejected as stale.
    pub fn prepare<R: RngCore + ?Sized>(&mut self, rng: &mut R) -> Result<Preparation, RoundError> {
        match self.phase {
            Phase::Idle | Phase::Preparing | Phase::Ready | Phase::Reported => {}
            Phase::Running | Phase::CashedOutWaiting => return Err(RoundError::Busy),
            Phase::Crashed | Phase::CashedOut => return Err(RoundError::Unreported),
        }

        let seed = match &self.source {
            SeedSource::Token(token) => token.seed().to_string(),
            SeedSource::Local { .. } => {
                let reused = self
                    .local_seed
                    .clone()
                    .filter(|_| !self.config.regenerate_seed_on_start);
                match reused {
                    Some(seed) => seed,
                    None => {
                        let seed = fresh_seed(rng);
                        self.local_seed = Some(seed.clone());
                        seed
                    }
                }
            }
        };

        if self.phase == Phase::Preparing {
            debug!(superseded = self.generation, "preparation superseded");
        }
        self.generation += 1;
        self.phase = Phase::Preparing;
        self.round = None;

        let preparation = Preparation {
            generation: self.generation,
            seed,
            level: self.level,
        };
        self.pending = Some(preparation.clone());
        Ok(preparation)
    }

    /// Apply a finished preparation.
    pub fn complete(&mut self, prepared: Prepared) -> Result<Multiplier, RoundError> {
        if prepared.generation != self.generation || self.phase != Phase::Preparing {
            return Err(RoundError::Stale {
                current: self.generation,
                got: prepared.generation,
            });
        }
        let Some(pending) = self.pending.take() else {
            return Err(RoundError::Stale {
                current: self.generation,
                got: prepared.generation,
            });
        };

        let token = match &self.source {
            SeedSource::Token(token) => Some(token.raw().to_string()),
            SeedSource::Local { .. } => None,
        };
        self.round = Some(Round {
            token,
            seed: pending.seed,
            volatility: self.source.volatility(),
            level: pending.level,
            crash: prepared.crash,
            crash_time_ms: prepared.crash_time_ms,
            bet: None,
            started_at_ms: 0.0,
            cashout: None,
            result_reported: false,
        });
        self.phase = Phase::Ready;
        debug!(
            generation = self.generation,
            crash = prepared.crash.x100(),
            crash_ms = prepared.crash_time_ms,
            "round ready"
        );
        Ok(prepared.crash)
    }

    /// Start the flight with a validated bet.
    pub fn place_bet(&mut self, bet: Bet, now_ms: f64) -> Result<(), RoundError> {
        match self.phase {
            Phase::Ready => {}
            Phase::Preparing => return Err(RoundError::Preparing),
            Phase::Running | Phase::CashedOutWaiting => return Err(RoundError::Busy),
            _ => return Err(RoundError::NotReady),
        }
        let round = self.round.as_mut().ok_or(RoundError::NotReady)?;
        round.bet = Some(bet);
        round.started_at_ms = now_ms;
        round.cashout = None;
        round.result_reported = false;
        self.phase = Phase::Running;
        info!(
            generation = self.generation,
            bet = bet.amount,
            auto_x100 = ?bet.auto_cashout_x100,
            "round started"
        );
        Ok(())
    }

    /// Validate raw form input and start the flight.
    ///
    /// On a validation error the round stays where it was.
    pub fn place_bet_input(
        &mut self,
        amount: &str,
        auto_cashout: &str,
        now_ms: f64,
    ) -> Result<(), RoundError> {
        let bet = Bet::from_input(amount, auto_cashout)?;
        self.place_bet(bet, now_ms)
    }

    /// Advance the flight to `now_ms`.
    ///
    /// Returns `None` outside a flight.
    pub fn tick(&mut self, now_ms: f64) -> Option<Event> {
        if !self.phase.is_ticking() {
            return None;
        }
        let round = self.round.as_ref()?;
        let elapsed = round.elapsed(now_ms);

        // Crash first: it preempts any cashout on the same tick.
        if elapsed >= round.crash_time_ms {
            return self.crash();
        }

        let multiplier = Multiplier::floor_from(multiplier_at(elapsed));
        if self.phase == Phase::Running {
            if let Some(threshold) = round.auto_cashout_x100() {
                if multiplier.x100() >= threshold {
                    return self.cash_out_at(elapsed, true);
                }
            }
        }
        Some(Event::Flying { multiplier })
    }

    /// Manual cashout request.
    ///
    /// If the crash instant has already passed the round crashes instead.
    pub fn cash_out(&mut self, now_ms: f64) -> Result<Event, RoundError> {
        match self.phase {
            Phase::Running => {}
            Phase::CashedOutWaiting | Phase::CashedOut => {
                return Err(RoundError::AlreadyCashedOut)
            }
            _ => return Err(RoundError::NotRunning),
        }
        let round = self.round.as_ref().ok_or(RoundError::NotRunning)?;
        let elapsed = round.elapsed(now_ms);
        let event = if elapsed >= round.crash_time_ms {
            self.crash()
        } else {
            self.cash_out_at(elapsed, false)
        };
        event.ok_or(RoundError::NotRunning)
    }

    /// Hand out the outcome report for a finished round, exactly once.
    pub fn take_report(&mut self) -> Option<OutcomeReport> {
        if !self.phase.is_terminal() {
            return None;
        }
        let round = self.round.as_mut()?;
        if round.result_reported {
            return None;
        }
        round.result_reported = true;
        self.phase = Phase::Reported;

        Some(OutcomeReport {
            kind: ReportKind::CrashV1,
            token: round.token.clone(),
            seed: round.seed.clone(),
            volatility: round.volatility,
            bet: round.stake(),
            auto_x100: round.auto_cashout_x100(),
            cashed_out: round.cashout.is_some(),
            cashout_ms: round.cashout.map(|cashout| cashout.elapsed_ms),
            init_data: self.config.init_data.clone(),
        })
    }

    /// Multiplier to display at `now_ms`.
    pub fn display_multiplier(&self, now_ms: f64) -> Multiplier {
        let Some(round) = &self.round else {
            return Multiplier::ONE;
        };
        match self.phase {
            Phase::Running | Phase::CashedOutWaiting => {
                Multiplier::floor_from(multiplier_at(round.elapsed(now_ms)))
            }
            Phase::CashedOut => round
                .cashout
                .map_or(round.crash, |cashout| cashout.multiplier),
            Phase::Crashed => round.crash,
            Phase::Reported => match (self.config.wait_for_crash, round.cashout) {
                (false, Some(cashout)) => cashout.multiplier,
                _ => round.crash,
            },
            Phase::Idle | Phase::Preparing | Phase::Ready => Multiplier::ONE,
        }
    }

    fn cash_out_at(&mut self, elapsed: f64, automatic: bool) -> Option<Event> {
        let wait_for_crash = self.config.wait_for_crash;
        let round = self.round.as_mut()?;
        let multiplier = Multiplier::floor_from(multiplier_at(elapsed));
        let cashout = Cashout {
            elapsed_ms: elapsed.floor() as u64,
            multiplier,
            payout: multiplier.payout(round.stake()),
        };
        round.cashout = Some(cashout);
        info!(
            generation = self.generation,
            multiplier = %multiplier,
            payout = cashout.payout,
            automatic,
            "cashed out"
        );

        if wait_for_crash {
            self.phase = Phase::CashedOutWaiting;
        } else {
            self.phase = Phase::CashedOut;
            self.settle();
        }
        Some(Event::CashedOut { cashout, automatic })
    }

    fn crash(&mut self) -> Option<Event> {
        let round = self.round.as_ref()?;
        let (crash, cashout) = (round.crash, round.cashout);
        self.phase = Phase::Crashed;
        self.settle();
        info!(
            generation = self.generation,
            crash = %crash,
            cashed_out = cashout.is_some(),
            "crashed"
        );
        Some(Event::Crashed { crash, cashout })
    }

    fn settle(&mut self) {
        let Some(round) = &self.round else {
            return;
        };
        let settlement = Settlement {
            generation: self.generation,
            crash: round.crash,
            bet: round.stake(),
            cashout: round.cashout,
        };
        self.history.push(HistoryEntry {
            multiplier: round
                .cashout
                .map_or(round.crash, |cashout| cashout.multiplier),
            cashed_out: round.cashout.is_some(),
        });
        self.settlement = Some(settlement);
    }
}
