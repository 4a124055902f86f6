//! Infrastructure layer for host interactions.
//!
//! The coordinator never touches a clock directly. Delayed work goes through an
//! injected [`Environment`], which abstracts the host's timer facility the same
//! way `setTimeout` / `clearTimeout` do in a browser.
//!
//! # Implementations
//!
//! - [`TokioEnvironment`]: wall-clock timers running as tokio tasks
//! - [`ManualEnvironment`]: virtual clock advanced explicitly by the host
//!
//! [`paths`] resolves the data directory used for trace files.

pub mod manual;
pub mod paths;
pub mod timers;

pub use manual::ManualEnvironment;
pub use paths::{data_dir, expand_tilde};
pub use timers::TokioEnvironment;

use std::fmt;
use std::time::Duration;

/// Deferred work scheduled through an [`Environment`].
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Identifies a scheduled callback so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeoutHandle(u64);

impl TimeoutHandle {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimeoutHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timeout#{}", self.0)
    }
}

/// Host timer facility.
///
/// Implementations must run each callback at most once, and never after its
/// handle was cleared. Clearing an unknown or already fired handle is a no-op.
pub trait Environment: Send + Sync {
    /// Schedules `callback` to run once `delay` has elapsed.
    fn set_timeout(&self, callback: TimerCallback, delay: Duration) -> TimeoutHandle;

    /// Cancels a pending callback.
    fn clear_timeout(&self, handle: TimeoutHandle);
}
