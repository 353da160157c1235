//! Background task reading every line the appliance sends on one connection.

use crate::LINE_TERMINATOR;
use crate::device::ConnectionState;
use crate::device::notification::NotificationHandler;
use crate::device::pending::{Delivery, PendingSlot, Reply};
use crate::protocol::{Response, ValueResponse, parse_response};
use crate::transport::{LineReader, LinkStatus};

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use log::{debug, error, info, trace, warn};
use tokio::io::AsyncRead;
use tokio::sync::watch;

/// Read and route lines until the stream ends or fails.
///
/// Replies complete the pending command, notifications go to `handler`. Malformed
/// lines are logged and skipped. On end-of-stream or an I/O error the link is marked
/// down and the loop returns. After a clean end-of-stream the in-flight caller, if any,
/// runs into its timeout; a reset fails it right away with a lost connection.
pub(crate) async fn receive_loop<R>(
    mut reader: LineReader<R>,
    pending: Arc<PendingSlot>,
    link: LinkStatus,
    state: Arc<watch::Sender<ConnectionState>>,
    handler: Arc<dyn NotificationHandler>,
) where
    R: AsyncRead + Unpin,
{
    debug!("Receive loop started");

    loop {
        let line = match reader.read_line(LINE_TERMINATOR).await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Appliance closed the connection");
                link_lost(&link, &state);
                return;
            }
            Err(e) if e.is_recoverable() => {
                warn!("Skipping unreadable line: {e}");
                continue;
            }
            Err(e) => {
                warn!("Connection read failed: {e}");
                link_lost(&link, &state);
                if e.is_connection_reset() {
                    // Dropping the reply sender wakes the caller with a closed channel
                    pending.clear();
                }
                return;
            }
        };

        trace!("<- {}", line.trim_end());

        if line.trim().is_empty() {
            continue;
        }

        match parse_response(&line) {
            Ok(Response::Notification(notification)) => dispatch(&handler, &notification),
            Ok(Response::Success(reply)) => route(&pending, Reply::Success(reply)),
            Ok(Response::Error(reply)) => route(&pending, Reply::Error(reply)),
            Err(e) => warn!("Ignoring malformed line: {e}"),
        }
    }
}

fn link_lost(link: &LinkStatus, state: &watch::Sender<ConnectionState>) {
    link.mark_down();
    state.send_replace(ConnectionState::Disconnected);
}

fn route(pending: &PendingSlot, reply: Reply) {
    let raw = match &reply {
        Reply::Success(r) => r.raw.clone(),
        Reply::Error(r) => r.raw.clone(),
    };

    match pending.complete(reply) {
        Delivery::Delivered => {}
        Delivery::Unclaimed => warn!("Dropping reply with no command waiting: {raw}"),
        Delivery::Stale => warn!("Dropping stale reply to an earlier command: {raw}"),
    }
}

fn dispatch(handler: &Arc<dyn NotificationHandler>, notification: &ValueResponse) {
    let outcome = catch_unwind(AssertUnwindSafe(|| handler.on_notification(notification)));

    if outcome.is_err() {
        error!("Notification handler panicked on: {}", notification.raw);
    }
}
