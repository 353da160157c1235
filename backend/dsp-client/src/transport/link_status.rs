use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared connected flag for one transport.
///
/// Clones observe the same flag, so the task owning the read half can report a dead
/// link to whoever owns the write half.
#[derive(Debug, Clone, Default)]
pub struct LinkStatus {
    up: Arc<AtomicBool>,
}

impl LinkStatus {
    pub fn is_up(&self) -> bool {
        self.up.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_up(&self) {
        self.up.store(true, Ordering::SeqCst);
    }

    /// Returns whether the link was up before this call.
    pub fn mark_down(&self) -> bool {
        self.up.swap(false, Ordering::SeqCst)
    }
}
