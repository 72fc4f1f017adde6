//! Single-flight send gate.
//!
//! The coordinator is either Idle or Sending. `SendGate` hands out at most
//! one [`SendPermit`] at a time; dropping the permit restores Idle on every
//! exit path (success, failure, or panic-unwind through the send).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Gate guarding the single in-flight send.
#[derive(Clone, Default)]
pub struct SendGate {
    sending: Arc<AtomicBool>,
}

impl SendGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to move Idle → Sending.
    ///
    /// Returns `None` while a permit is outstanding; there is no queueing.
    pub fn acquire(&self) -> Option<SendPermit> {
        let was_idle = self
            .sending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        was_idle.then(|| SendPermit {
            sending: Arc::clone(&self.sending),
        })
    }

    /// Returns true while a send is in flight.
    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }
}

/// Proof of the Sending state. Dropping it restores Idle.
pub struct SendPermit {
    sending: Arc<AtomicBool>,
}

impl Drop for SendPermit {
    fn drop(&mut self) {
        self.sending.store(false, Ordering::Release);
    }
}
