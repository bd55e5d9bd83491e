//! Optional escape hatch for a SET_REPORT that never completes.
//!
//! Without it a lost completion blocks LED feedback until the keyboard
//! is replugged.  The watchdog only observes the latch from the poll
//! loop; it is off unless the coordinator is built with one.

use crate::transport::TransferLatch;

pub struct StallWatchdog {
    timeout_ms: u32,
    raised_at: Option<u32>,
}

impl StallWatchdog {
    pub const fn new(timeout_ms: u32) -> Self {
        Self {
            timeout_ms,
            raised_at: None,
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// A new request was issued at `now_ms`; time it from here.
    ///
    /// The latch alone cannot tell a fresh request from one that
    /// completed and was reissued between two checks.
    pub fn restart(&mut self, now_ms: u32) {
        self.raised_at = Some(now_ms);
    }

    /// Returns `true` if the latch was force-released.
    pub fn check(&mut self, now_ms: u32, latch: &TransferLatch) -> bool {
        if !latch.is_outstanding() {
            self.raised_at = None;
            return false;
        }

        let since = *self.raised_at.get_or_insert(now_ms);
        if now_ms.wrapping_sub(since) < self.timeout_ms {
            return false;
        }

        warn!(
            "LED report still in flight after {} ms, releasing",
            now_ms.wrapping_sub(since)
        );
        latch.complete();
        self.raised_at = None;
        true
    }
}
