use crate::debounce::Debouncer;
use crate::events::{AppEvent, EventBus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

pub const VIEW_OPENED: &str = "view_opened";
pub const BATCH_OPEN_FINISHED: &str = "batch_open_finished";

/// Coalesces view-created notifications while several files open at once.
///
/// The batch ends once no view has opened for the quiet period; one
/// `view_opened` is then sent for the whole batch.
pub struct BatchWindow {
    state: Arc<BatchState>,
    debouncer: Debouncer,
}

struct BatchState {
    active: AtomicBool,
    opened: AtomicBool,
    events: Option<Arc<EventBus>>,
}

impl BatchState {
    fn send(&self, name: &str) {
        if let Some(events) = &self.events {
            events.send(AppEvent::ui(name));
        }
    }

    fn finish(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if self.opened.swap(false, Ordering::SeqCst) {
            self.send(VIEW_OPENED);
        }
        self.send(BATCH_OPEN_FINISHED);
        log::debug!("Batch open finished");
    }
}

impl BatchWindow {
    pub fn new(quiet_period: Duration, events: Option<Arc<EventBus>>) -> Self {
        Self {
            state: Arc::new(BatchState {
                active: AtomicBool::new(false),
                opened: AtomicBool::new(false),
                events,
            }),
            debouncer: Debouncer::new(quiet_period),
        }
    }

    pub fn begin(&self) {
        log::debug!("Batch open started");
        self.state.active.store(true, Ordering::SeqCst);
        self.schedule_finish();
    }

    pub fn is_active(&self) -> bool {
        self.state.active.load(Ordering::SeqCst)
    }

    pub fn view_opened(&self) {
        if self.is_active() {
            self.state.opened.store(true, Ordering::SeqCst);
            self.schedule_finish();
        } else {
            self.state.send(VIEW_OPENED);
        }
    }

    /// Marks every open of the batch as issued. With a runtime the quiet-period
    /// timer still ends the batch; without one there is no timer and the batch
    /// ends here.
    pub fn settle(&self) {
        if Handle::try_current().is_err() {
            self.state.finish();
        }
    }

    fn schedule_finish(&self) {
        // Outside a runtime the debouncer would run the finish immediately.
        if Handle::try_current().is_err() {
            return;
        }
        let state = Arc::clone(&self.state);
        self.debouncer.schedule(move || state.finish());
    }
}
