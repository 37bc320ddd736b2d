//! Timer-based coalescing of repeated requests.
//!
//! Scheduling aborts the pending timer task and starts a new one, so the
//! deadline always counts from the latest request.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub struct Debouncer {
    delay: Duration,
    pending: Arc<Mutex<Pending>>,
}

#[derive(Default)]
struct Pending {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `work` once `delay` has passed without another call to `schedule`.
    ///
    /// Outside a tokio runtime there is no timer to wait on and `work` runs
    /// immediately.
    pub fn schedule<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(handle) = Handle::try_current() else {
            log::debug!("No runtime for debounced work, running now");
            self.cancel();
            work();
            return;
        };

        let mut pending = lock(&self.pending);
        if let Some(task) = pending.task.take() {
            task.abort();
        }
        pending.generation += 1;

        let generation = pending.generation;
        let delay = self.delay;
        let slot = Arc::clone(&self.pending);
        pending.task = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut pending = lock(&slot);
                if pending.generation != generation {
                    return;
                }
                pending.task = None;
            }
            work();
        }));
    }

    pub fn cancel(&self) {
        let mut pending = lock(&self.pending);
        pending.generation += 1;
        if let Some(task) = pending.task.take() {
            task.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.pending).task.is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
