use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stop request for [`Scheduler::run_until_cancelled`](super::scheduler::Scheduler::run_until_cancelled).
///
/// The scheduler reads the flag before each round of ticks. A cancel raised
/// while a round is in progress lets every remaining component in that round
/// tick, and the loop returns afterwards. Cancelling never calls `stop` on the
/// components; that stays with the owner of the scheduler.
///
/// The flag is sticky: once raised, every clone observes it for good.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    requested: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the tick loop to end after the current round.
    pub fn cancel(&self) {
        self.requested.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}
