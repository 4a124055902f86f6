//! Per-cycle stall detection.
//!
//! Each cycle arms its own [`StallTimer`]. The timer holds the only handle to
//! its scheduled callback, so a newer cycle can never cancel an older cycle's
//! stall watch; the older callback simply finds its cycle superseded and does
//! nothing. Dropping the timer disarms it, which makes disarming the guaranteed
//! cleanup step of every cycle whether it commits, fails or is superseded.

use super::status::StatusDriver;
use crate::infrastructure::{Environment, TimeoutHandle};
use std::sync::Arc;
use std::time::Duration;

/// A cancellable, single-shot stall watch owned by one cycle.
pub struct StallTimer {
    environment: Arc<dyn Environment>,
    handle: Option<TimeoutHandle>,
}

impl StallTimer {
    /// Schedules a stall transition for `status` after `threshold`.
    #[must_use]
    pub fn arm(environment: Arc<dyn Environment>, threshold: Duration, status: StatusDriver) -> Self {
        let handle = environment.set_timeout(
            Box::new(move || {
                if status.stall() {
                    tracing::debug!(threshold = ?threshold, "resolution stalled");
                }
            }),
            threshold,
        );
        tracing::trace!(%handle, threshold = ?threshold, "stall timer armed");

        Self {
            environment,
            handle: Some(handle),
        }
    }

    /// Cancels the pending stall transition. Safe to call any number of times,
    /// including after the timer fired.
    pub fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.environment.clear_timeout(handle);
            tracing::trace!(%handle, "stall timer disarmed");
        }
    }

    /// Whether [`disarm`](Self::disarm) has not been called yet.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for StallTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}

impl std::fmt::Debug for StallTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StallTimer")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::cycle::CycleTracker;
    use crate::app::store::{MemoryStore, Store};
    use crate::domain::state::Status;
    use crate::infrastructure::ManualEnvironment;

    const THRESHOLD: Duration = Duration::from_millis(30);

    fn setup() -> (Arc<ManualEnvironment>, Arc<MemoryStore>, StatusDriver) {
        let env = Arc::new(ManualEnvironment::new());
        let store = Arc::new(MemoryStore::default());
        let status = StatusDriver::new(store.clone(), CycleTracker::new().begin());
        status.begin();
        (env, store, status)
    }

    #[test]
    fn fires_after_threshold() {
        let (env, store, status) = setup();
        let _timer = StallTimer::arm(env.clone(), THRESHOLD, status);

        env.advance(Duration::from_millis(29));
        assert_eq!(store.get_state().status, Status::Loading);
        env.advance(Duration::from_millis(1));
        assert_eq!(store.get_state().status, Status::Stalled);
    }

    #[test]
    fn disarm_is_idempotent_and_prevents_stall() {
        let (env, store, status) = setup();
        let mut timer = StallTimer::arm(env.clone(), THRESHOLD, status);

        timer.disarm();
        timer.disarm();
        assert!(!timer.is_armed());

        env.advance(Duration::from_secs(1));
        assert_eq!(store.get_state().status, Status::Loading);
        assert_eq!(env.pending_count(), 0);
    }

    #[test]
    fn disarm_after_firing_is_harmless() {
        let (env, store, status) = setup();
        let mut timer = StallTimer::arm(env.clone(), THRESHOLD, status.clone());

        env.advance(THRESHOLD);
        timer.disarm();
        status.commit();

        assert_eq!(store.get_state().status, Status::Idle);
    }

    #[test]
    fn dropping_disarms() {
        let (env, _store, status) = setup();
        {
            let _timer = StallTimer::arm(env.clone(), THRESHOLD, status);
            assert_eq!(env.pending_count(), 1);
        }
        assert_eq!(env.pending_count(), 0);
    }
}
