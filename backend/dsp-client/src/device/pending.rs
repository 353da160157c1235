//! The single pending-command slot shared between callers and the receive loop.

use crate::protocol::{ErrorResponse, ValueResponse, is_set_verb, strip_quotes};

use std::sync::{Mutex, PoisonError};

use log::{debug, warn};
use tokio::sync::oneshot;

/// A reply that can complete the pending command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reply {
    Success(ValueResponse),
    Error(ErrorResponse),
}

/// What happened to a reply handed to [`PendingSlot::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    /// Nobody is waiting; a late reply to a command that already gave up.
    Unclaimed,
    /// The echoed command does not match the one in flight.
    Stale,
}

struct PendingCommand {
    command: String,
    /// Tokens a success reply must repeat right after its `OK`/`OKm` kind.
    echo: Vec<String>,
    reply_tx: oneshot::Sender<Reply>,
}

impl PendingCommand {
    fn new(command: &str, reply_tx: oneshot::Sender<Reply>) -> Self {
        let mut echo: Vec<String> = command.split(' ').map(strip_quotes).collect();
        // The appliance may clamp or round the value it was told to set
        if echo.len() > 1 && is_set_verb(&echo[0]) {
            echo.pop();
        }

        Self {
            command: command.to_string(),
            echo,
            reply_tx,
        }
    }

    fn is_echoed_by(&self, reply: &ValueResponse) -> bool {
        reply
            .tokens
            .get(1..=self.echo.len())
            .is_some_and(|echoed| echoed == self.echo.as_slice())
    }
}

/// Holds at most one outstanding command.
///
/// Serialization of callers happens above this type; the slot only pairs the one
/// command in flight with the next reply that belongs to it.
#[derive(Default)]
pub(crate) struct PendingSlot {
    inner: Mutex<Option<PendingCommand>>,
}

impl PendingSlot {
    /// Register `command` as in flight and return the receiver its reply arrives on.
    pub(crate) fn arm(&self, command: &str) -> oneshot::Receiver<Reply> {
        let (reply_tx, reply_rx) = oneshot::channel();

        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            warn!("Replacing pending command '{}' that was never cleared", previous.command);
        }
        *slot = Some(PendingCommand::new(command, reply_tx));

        reply_rx
    }

    /// Forget the pending command, if any. Later replies become unclaimed.
    pub(crate) fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Hand `reply` to the pending command.
    ///
    /// Success replies echo the command they answer: verb, address and sub-indices,
    /// and for `set`/`setn` everything except the value. A success whose echo differs is
    /// a late answer to an earlier, timed-out command and is dropped, leaving the slot
    /// armed. Error replies always complete the pending command.
    pub(crate) fn complete(&self, reply: Reply) -> Delivery {
        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(pending) = slot.as_ref() else {
            return Delivery::Unclaimed;
        };

        if let Reply::Success(success) = &reply {
            if !pending.is_echoed_by(success) {
                return Delivery::Stale;
            }
        }

        let Some(pending) = slot.take() else {
            return Delivery::Unclaimed;
        };

        if pending.reply_tx.send(reply).is_err() {
            // Caller stopped waiting between the timeout firing and clear()
            debug!("Reply for '{}' arrived after its caller gave up", pending.command);
            return Delivery::Unclaimed;
        }

        Delivery::Delivered
    }
}
