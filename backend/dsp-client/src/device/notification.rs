use crate::protocol::ValueResponse;

use log::info;

/// Receives `NOTIFY` lines pushed by the appliance.
///
/// Called from the receive loop, so implementations must return quickly; hand work
/// off to a channel if it may block.
pub trait NotificationHandler: Send + Sync + 'static {
    fn on_notification(&self, notification: &ValueResponse);
}

impl<F> NotificationHandler for F
where
    F: Fn(&ValueResponse) + Send + Sync + 'static,
{
    fn on_notification(&self, notification: &ValueResponse) {
        self(notification)
    }
}

/// Handler installed when none is given.
pub fn log_notification(notification: &ValueResponse) {
    info!("Got NOTIFY: {}", notification.raw);
}
