//! Virtual-clock environment.
//!
//! Time only moves when the host calls [`ManualEnvironment::advance`]. Hosts that
//! already own a frame clock or event loop use it to drive stall detection from
//! their own ticks, and it makes timer-dependent behavior deterministic.

use super::{Environment, TimeoutHandle, TimerCallback};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Default)]
struct Clock {
    now: Duration,
    next_id: u64,
    /// Keyed by deadline, then id, so iteration order is firing order.
    timers: BTreeMap<(Duration, u64), TimerCallback>,
}

/// Environment whose clock is advanced explicitly.
#[derive(Default)]
pub struct ManualEnvironment {
    clock: Mutex<Clock>,
}

impl ManualEnvironment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since creation.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner).now
    }

    /// Number of callbacks still waiting to fire.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.clock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .timers
            .len()
    }

    /// Moves the clock forward by `by`, running every callback that becomes due.
    ///
    /// Callbacks run in deadline order, outside the internal lock, so they may
    /// schedule or clear other timeouts. A callback scheduled by another
    /// callback runs within the same call if its deadline falls inside the
    /// advanced window.
    ///
    /// Returns the number of callbacks that ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut fired = 0;

        loop {
            let next = {
                let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
                let due = clock
                    .timers
                    .first_key_value()
                    .map(|(key, _)| *key)
                    .filter(|(deadline, _)| *deadline <= target);
                match due {
                    Some(key) => {
                        clock.now = key.0;
                        clock.timers.remove(&key)
                    }
                    None => {
                        clock.now = target;
                        None
                    }
                }
            };

            let Some(callback) = next else {
                break;
            };
            callback();
            fired += 1;
        }

        fired
    }
}

impl Environment for ManualEnvironment {
    fn set_timeout(&self, callback: TimerCallback, delay: Duration) -> TimeoutHandle {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        let id = clock.next_id;
        clock.next_id += 1;
        let deadline = clock.now + delay;
        clock.timers.insert((deadline, id), callback);
        TimeoutHandle::new(id)
    }

    fn clear_timeout(&self, handle: TimeoutHandle) {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        clock.timers.retain(|(_, id), _| *id != handle.id());
    }
}

impl fmt::Debug for ManualEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ManualEnvironment")
            .field("now", &clock.now)
            .field("pending", &clock.timers.len())
            .finish()
    }
}
