use crate::{
    reporter::Reporter,
    scheduler::{
        ingress::{Mailbox, Message, Snapshot},
        Config,
    },
};
use commonware_macros::select;
use commonware_runtime::{Clock, Handle, Metrics, Spawner};
use futures::{
    channel::{mpsc, oneshot},
    StreamExt,
};
use liftoff_execution::crash::{Event, Phase, Prepared, RoundError, RoundMachine, Settlement};
use liftoff_types::crash::{Bet, ValidationError};
use prometheus_client::metrics::counter::Counter;
use rand::RngCore;
use std::{
    sync::atomic::AtomicU64,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tracing::{debug, info, warn};

/// What woke the actor.
enum Wake {
    Message(Option<Message>),
    Frame,
}

#[derive(Default)]
struct Counters {
    rounds_prepared: Counter<u64, AtomicU64>,
    stale_preparations: Counter<u64, AtomicU64>,
    rounds_started: Counter<u64, AtomicU64>,
    cashouts: Counter<u64, AtomicU64>,
    crashes: Counter<u64, AtomicU64>,
    reports_sent: Counter<u64, AtomicU64>,
    reports_failed: Counter<u64, AtomicU64>,
}

pub struct Actor<E: Clock + Spawner + Metrics + RngCore, R: Reporter> {
    context: E,
    frame_interval: Duration,
    machine: RoundMachine,
    reporter: R,
    inbound: Mailbox,
    mailbox: mpsc::Receiver<Message>,
    next_frame: SystemTime,
    counters: Counters,
    ready_listeners: Vec<oneshot::Sender<u64>>,
    settled_listeners: Vec<oneshot::Sender<Settlement>>,
}

impl<E: Clock + Spawner + Metrics + RngCore, R: Reporter> Actor<E, R> {
    pub fn new(context: E, config: Config, reporter: R) -> Result<(Self, Mailbox), ValidationError> {
        let machine = RoundMachine::new(config.round, config.source)?;

        // Create mailbox
        let (sender, mailbox) = mpsc::channel(config.mailbox_size);
        let inbound = Mailbox::new(sender, context.stopped());

        // Register metrics
        let counters = Counters::default();
        context.register(
            "rounds_prepared",
            "Number of rounds submitted for preparation",
            counters.rounds_prepared.clone(),
        );
        context.register(
            "stale_preparations",
            "Number of preparations discarded after being superseded",
            counters.stale_preparations.clone(),
        );
        context.register(
            "rounds_started",
            "Number of rounds that accepted a bet",
            counters.rounds_started.clone(),
        );
        context.register(
            "cashouts",
            "Number of rounds the player cashed out of",
            counters.cashouts.clone(),
        );
        context.register(
            "crashes",
            "Number of rounds that reached their crash point",
            counters.crashes.clone(),
        );
        context.register(
            "reports_sent",
            "Number of outcome reports delivered",
            counters.reports_sent.clone(),
        );
        context.register(
            "reports_failed",
            "Number of outcome reports the reporter rejected",
            counters.reports_failed.clone(),
        );

        let next_frame = context.current();
        Ok((
            Self {
                context,
                frame_interval: config.frame_interval,
                machine,
                reporter,
                inbound: inbound.clone(),
                mailbox,
                next_frame,
                counters,
                ready_listeners: Vec::new(),
                settled_listeners: Vec::new(),
            },
            inbound,
        ))
    }

    pub fn start(mut self) -> Handle<()> {
        self.context.spawn_ref()(self.run())
    }

    async fn run(mut self) {
        loop {
            // Only wait on frames while a round is in flight
            let wake = if self.machine.phase().is_ticking() {
                let wait = self
                    .next_frame
                    .duration_since(self.context.current())
                    .unwrap_or(Duration::ZERO);
                select! {
                    message = self.mailbox.next() => {
                        Wake::Message(message)
                    },
                    _ = self.context.sleep(wait) => {
                        Wake::Frame
                    },
                }
            } else {
                Wake::Message(self.mailbox.next().await)
            };

            match wake {
                Wake::Frame => {
                    self.next_frame += self.frame_interval;
                    if let Some(event) = self.machine.tick(self.now_ms()) {
                        self.handle_event(event);
                    }
                }
                Wake::Message(Some(message)) => self.handle_message(message),
                Wake::Message(None) => {
                    warn!("mailbox closed");
                    break;
                }
            }
        }
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::NewRound { response } => {
                let _ = response.send(self.new_round());
            }
            Message::Prepared(prepared) => self.prepared(prepared),
            Message::Ready { response } => {
                if self.machine.phase() == Phase::Ready {
                    let _ = response.send(self.machine.generation());
                } else {
                    self.ready_listeners.push(response);
                }
            }
            Message::PlaceBet { bet, response } => {
                let _ = response.send(self.place_bet(bet));
            }
            Message::CashOut { response } => {
                let result = self.machine.cash_out(self.now_ms());
                if let Ok(event) = &result {
                    self.handle_event(*event);
                }
                let _ = response.send(result);
            }
            Message::Settled { response } => match self.current_settlement() {
                Some(settlement) => {
                    let _ = response.send(settlement);
                }
                None => self.settled_listeners.push(response),
            },
            Message::Snapshot { response } => {
                let _ = response.send(self.snapshot());
            }
        }
    }

    fn new_round(&mut self) -> Result<u64, RoundError> {
        let preparation = self.machine.prepare(&mut self.context)?;
        let generation = preparation.generation();
        self.counters.rounds_prepared.inc();
        debug!(generation, "preparing round");

        // Derive the crash point off the actor task
        self.context.with_label("prepare").spawn({
            let mut inbound = self.inbound.clone();
            move |_| async move {
                let prepared = preparation.run();
                if let Err(err) = inbound.prepared(prepared).await {
                    debug!(?err, generation, "failed to deliver preparation");
                }
            }
        });
        Ok(generation)
    }

    fn prepared(&mut self, prepared: Prepared) {
        match self.machine.complete(prepared) {
            Ok(_) => {
                let generation = self.machine.generation();
                info!(generation, "round ready");
                for listener in self.ready_listeners.drain(..) {
                    let _ = listener.send(generation);
                }
            }
            Err(err) => {
                self.counters.stale_preparations.inc();
                debug!(?err, "discarded preparation");
            }
        }
    }

    fn place_bet(&mut self, bet: Bet) -> Result<(), RoundError> {
        self.machine.place_bet(bet, self.now_ms())?;
        self.counters.rounds_started.inc();
        self.next_frame = self.context.current() + self.frame_interval;
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Flying { multiplier } => {
                debug!(multiplier = multiplier.x100(), "tick");
            }
            Event::CashedOut { .. } => {
                self.counters.cashouts.inc();
            }
            Event::Crashed { .. } => {
                self.counters.crashes.inc();
            }
        }
        if self.machine.phase().is_terminal() {
            self.settle();
        }
    }

    fn settle(&mut self) {
        if let Some(report) = self.machine.take_report() {
            match self.reporter.report(&report) {
                Ok(()) => {
                    self.counters.reports_sent.inc();
                }
                Err(err) => {
                    // The round stays settled either way
                    warn!(?err, seed = %report.seed, "failed to deliver outcome report");
                    self.counters.reports_failed.inc();
                }
            }
        }

        let Some(settlement) = self.machine.settlement().copied() else {
            return;
        };
        for listener in self.settled_listeners.drain(..) {
            let _ = listener.send(settlement);
        }
    }

    /// Settlement of the latest round, if it has finished.
    fn current_settlement(&self) -> Option<Settlement> {
        let settlement = self.machine.settlement()?;
        let finished = matches!(
            self.machine.phase(),
            Phase::Crashed | Phase::CashedOut | Phase::Reported
        );
        (finished && settlement.generation == self.machine.generation()).then_some(*settlement)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.machine.phase(),
            generation: self.machine.generation(),
            multiplier: self.machine.display_multiplier(self.now_ms()),
            settlement: self.machine.settlement().copied(),
            history: self.machine.history().iter().copied().collect(),
        }
    }

    fn now_ms(&self) -> f64 {
        self.context
            .current()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
            * 1000.0
    }
}
