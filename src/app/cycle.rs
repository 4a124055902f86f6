//! Resolution cycle sequencing.
//!
//! Every input starts a cycle with a sequence number taken from a monotonically
//! increasing counter. A cycle may only write its results while its number is
//! still the latest one issued; a cycle overtaken by a newer input discards its
//! commit, so a slow earlier keystroke can never overwrite the results of a
//! later one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Issues cycle sequence numbers.
#[derive(Debug, Default)]
pub struct CycleTracker {
    latest: AtomicU64,
}

impl CycleTracker {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Starts a new cycle, superseding every cycle started before it.
    #[must_use]
    pub fn begin(self: &Arc<Self>) -> CycleTicket {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        CycleTicket {
            seq,
            tracker: Arc::clone(self),
        }
    }

    /// Sequence number of the most recently started cycle (0 before the first).
    #[must_use]
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

/// Identity of one cycle.
#[derive(Debug, Clone)]
pub struct CycleTicket {
    seq: u64,
    tracker: Arc<CycleTracker>,
}

impl CycleTicket {
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Whether no newer cycle has started since this one.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.tracker.latest() == self.seq
    }

    /// Sequence number of the newest cycle.
    #[must_use]
    pub fn latest(&self) -> u64 {
        self.tracker.latest()
    }
}
