use crate::services::ViewHandle;

pub type OpenCallback = Box<dyn FnOnce(Option<ViewHandle>) + Send>;

/// Completion signal for one open request.
///
/// Callbacks run at most once, in the order they were attached. A completion
/// dropped without `complete` reports `None`.
#[derive(Default)]
pub struct OpenCompletion {
    callbacks: Vec<OpenCallback>,
}

impl OpenCompletion {
    pub fn new(callback: Option<OpenCallback>) -> Self {
        Self {
            callbacks: callback.into_iter().collect(),
        }
    }

    pub fn then<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Option<ViewHandle>) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
        self
    }

    pub fn complete(mut self, view: Option<ViewHandle>) {
        self.fire(view);
    }

    fn fire(&mut self, view: Option<ViewHandle>) {
        for callback in std::mem::take(&mut self.callbacks) {
            callback(view.clone());
        }
    }
}

impl Drop for OpenCompletion {
    fn drop(&mut self) {
        if !self.callbacks.is_empty() {
            self.fire(None);
        }
    }
}
