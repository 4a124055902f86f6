//! Wall-clock timers backed by tokio tasks.

use super::{Environment, TimeoutHandle, TimerCallback};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

type Tasks = Arc<Mutex<HashMap<u64, JoinHandle<()>>>>;

/// Environment running each timeout as a task sleeping on `tokio::time`.
///
/// Pending timeouts are tracked by id alongside their task. Clearing a handle
/// removes the entry and aborts the task, and a task only runs its callback if
/// it could still remove its own entry, so a cleared callback never runs.
pub struct TokioEnvironment {
    handle: Handle,
    next_id: AtomicU64,
    tasks: Tasks,
    runtime: Option<BackgroundRuntime>,
}

/// Runtime owned by an environment created outside any tokio context.
struct BackgroundRuntime(Option<Runtime>);

impl Drop for BackgroundRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

impl TokioEnvironment {
    /// Schedules on the ambient runtime, or on a dedicated single-worker
    /// runtime when called outside of one. An ambient runtime must have its
    /// time driver enabled.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the dedicated runtime cannot be started.
    pub fn new() -> std::io::Result<Self> {
        if let Ok(handle) = Handle::try_current() {
            return Ok(Self::with_handle(handle));
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("typeahead-timer")
            .enable_time()
            .build()?;
        tracing::debug!("started background timer runtime");
        let mut environment = Self::with_handle(runtime.handle().clone());
        environment.runtime = Some(BackgroundRuntime(Some(runtime)));
        Ok(environment)
    }

    /// Schedules on the runtime behind `handle`.
    #[must_use]
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle,
            next_id: AtomicU64::new(0),
            tasks: Arc::default(),
            runtime: None,
        }
    }

    /// Number of timeouts that have been scheduled and neither fired nor cleared.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Environment for TokioEnvironment {
    fn set_timeout(&self, callback: TimerCallback, delay: Duration) -> TimeoutHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        // Held across spawn so the task cannot look itself up before it is stored.
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let registry = Arc::clone(&self.tasks);
        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let due = registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id)
                .is_some();
            if due {
                callback();
            }
        });
        tasks.insert(id, task);

        TimeoutHandle::new(id)
    }

    fn clear_timeout(&self, handle: TimeoutHandle) {
        let task = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.id());
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl Drop for TokioEnvironment {
    fn drop(&mut self) {
        let tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.values() {
            task.abort();
        }
    }
}

impl fmt::Debug for TokioEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioEnvironment")
            .field("pending", &self.pending_count())
            .field("owns_runtime", &self.runtime.is_some())
            .finish_non_exhaustive()
    }
}
