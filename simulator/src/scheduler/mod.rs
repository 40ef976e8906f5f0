//! Drives the round state machine from a single task.
//!
//! The actor ticks the live round on a fixed frame interval, runs crash
//! point preparation off the actor task, and delivers one outcome report per
//! finished round.

mod actor;
mod ingress;

pub use actor::Actor;
pub use ingress::{Mailbox, MailboxError, Message, Snapshot};
use liftoff_execution::crash::{RoundConfig, SeedSource};
use std::time::Duration;

/// Frame interval matching a 60Hz display.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub struct Config {
    pub round: RoundConfig,
    pub source: SeedSource,
    pub frame_interval: Duration,
    pub mailbox_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            round: RoundConfig::default(),
            source: SeedSource::local(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            mailbox_size: 64,
        }
    }
}
