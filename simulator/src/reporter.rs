//! Outcome report sinks.
//!
//! The scheduler hands every finished round's report to exactly one
//! [Reporter]. Delivery failures are the reporter's to surface; the round
//! itself is already settled.

use futures::channel::mpsc;
use liftoff_types::crash::OutcomeReport;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("report channel full")]
    Full,
    #[error("report channel closed")]
    Closed,
}

/// Receives outcome reports from the scheduler.
pub trait Reporter: Send + 'static {
    fn report(&mut self, report: &OutcomeReport) -> Result<(), ReportError>;
}

/// Writes each report as a JSON line through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, report: &OutcomeReport) -> Result<(), ReportError> {
        let json = report.to_json()?;
        info!(kind = report.kind.as_str(), report = %json, "outcome report");
        Ok(())
    }
}

/// Forwards reports to an embedding host over a bounded channel.
#[derive(Clone)]
pub struct ChannelReporter {
    sender: mpsc::Sender<OutcomeReport>,
}

impl ChannelReporter {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<OutcomeReport>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

impl Reporter for ChannelReporter {
    fn report(&mut self, report: &OutcomeReport) -> Result<(), ReportError> {
        self.sender.try_send(report.clone()).map_err(|err| {
            if err.is_full() {
                ReportError::Full
            } else {
                ReportError::Closed
            }
        })
    }
}
