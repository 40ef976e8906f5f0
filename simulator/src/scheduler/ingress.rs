use commonware_macros::select;
use commonware_runtime::signal::Signal;
use futures::{
    channel::{mpsc, oneshot},
    SinkExt,
};
use liftoff_execution::{
    crash::{Event, HistoryEntry, Phase, Prepared, RoundError, Settlement},
    Multiplier,
};
use liftoff_types::crash::Bet;
use thiserror::Error;

pub enum Message {
    NewRound {
        response: oneshot::Sender<Result<u64, RoundError>>,
    },
    Prepared(Prepared),
    Ready {
        response: oneshot::Sender<u64>,
    },
    PlaceBet {
        bet: Bet,
        response: oneshot::Sender<Result<(), RoundError>>,
    },
    CashOut {
        response: oneshot::Sender<Result<Event, RoundError>>,
    },
    Settled {
        response: oneshot::Sender<Settlement>,
    },
    Snapshot {
        response: oneshot::Sender<Snapshot>,
    },
}

/// Point-in-time view of the scheduler.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub phase: Phase,
    pub generation: u64,
    pub multiplier: Multiplier,
    pub settlement: Option<Settlement>,
    pub history: Vec<HistoryEntry>,
}

#[derive(Clone)]
pub struct Mailbox {
    sender: mpsc::Sender<Message>,
    stopped: Signal,
}

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("scheduler mailbox closed")]
    Closed,
    #[error("scheduler request canceled")]
    Canceled,
    #[error("shutdown in progress")]
    ShuttingDown,
    #[error(transparent)]
    Round(#[from] RoundError),
}

impl Mailbox {
    pub(super) fn new(sender: mpsc::Sender<Message>, stopped: Signal) -> Self {
        Self { sender, stopped }
    }

    /// Request a new round, returning its generation.
    pub async fn new_round(&mut self) -> Result<u64, MailboxError> {
        let generation = self
            .request(|response| Message::NewRound { response })
            .await??;
        Ok(generation)
    }

    /// Wait until a round is ready for a bet, returning its generation.
    pub async fn ready(&mut self) -> Result<u64, MailboxError> {
        self.request(|response| Message::Ready { response }).await
    }

    pub async fn place_bet(&mut self, bet: Bet) -> Result<(), MailboxError> {
        self.request(|response| Message::PlaceBet { bet, response })
            .await??;
        Ok(())
    }

    pub async fn cash_out(&mut self) -> Result<Event, MailboxError> {
        let event = self
            .request(|response| Message::CashOut { response })
            .await??;
        Ok(event)
    }

    /// Wait for the current round to settle.
    pub async fn settled(&mut self) -> Result<Settlement, MailboxError> {
        self.request(|response| Message::Settled { response }).await
    }

    pub async fn snapshot(&mut self) -> Result<Snapshot, MailboxError> {
        self.request(|response| Message::Snapshot { response }).await
    }

    pub(crate) async fn prepared(&mut self, prepared: Prepared) -> Result<(), MailboxError> {
        let mut sender = self.sender.clone();
        let mut stopped = self.stopped.clone();
        select! {
            result = sender.send(Message::Prepared(prepared)) => {
                result.map_err(|_| MailboxError::Closed)?;
                Ok(())
            },
            _ = &mut stopped => {
                Err(MailboxError::ShuttingDown)
            },
        }
    }

    async fn request<T>(
        &mut self,
        message: impl FnOnce(oneshot::Sender<T>) -> Message,
    ) -> Result<T, MailboxError> {
        let (sender, receiver) = oneshot::channel();
        {
            let mut mailbox_sender = self.sender.clone();
            let mut stopped = self.stopped.clone();
            select! {
                result = mailbox_sender.send(message(sender)) => {
                    result.map_err(|_| MailboxError::Closed)?;
                },
                _ = &mut stopped => {
                    return Err(MailboxError::ShuttingDown);
                },
            }
        }

        let mut stopped = self.stopped.clone();
        select! {
            result = receiver => {
                result.map_err(|_| MailboxError::Canceled)
            },
            _ = &mut stopped => {
                Err(MailboxError::ShuttingDown)
            },
        }
    }
}
