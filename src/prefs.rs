//! Hierarchical preference access.
//!
//! Keys are paths of segments (`["dynamic_buttons", "Save", "hidden"]`), so
//! segments may themselves contain dots or slashes (URIs do).

use crate::events::{AppEvent, EventBus};
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub trait Preferences: Send + Sync {
    fn get(&self, path: &[&str]) -> Option<Value>;
    fn set(&self, path: &[&str], value: Value);
    fn remove(&self, path: &[&str]) -> bool;

    fn has(&self, path: &[&str]) -> bool {
        self.get(path).is_some()
    }

    fn get_bool(&self, path: &[&str]) -> Option<bool> {
        self.get(path).and_then(|v| v.as_bool())
    }

    fn get_strings(&self, path: &[&str]) -> Option<Vec<String>> {
        let value = self.get(path)?;
        let items = value.as_array()?;
        Some(items.iter().filter_map(|v| v.as_str().map(String::from)).collect())
    }
}

pub const BUTTONS_SCOPE: &str = "dynamic_buttons";
pub const SESSIONS_SCOPE: &str = "project_sessions";
pub const OPENED_FILES: &str = "opened_files";
pub const MRU_SCOPE: &str = "mru";
pub const MRU_FILES: &str = "files";

/// In-process preference tree. Publishes `AppEvent::PrefChanged` when attached
/// to a bus.
pub struct MemoryPreferences {
    root: Mutex<Value>,
    events: Option<Arc<EventBus>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self {
            root: Mutex::new(Value::Object(Default::default())),
            events: None,
        }
    }

    pub fn with_events(events: Arc<EventBus>) -> Self {
        Self {
            root: Mutex::new(Value::Object(Default::default())),
            events: Some(events),
        }
    }

    fn notify(&self, path: &[&str]) {
        if let Some(events) = &self.events {
            events.send(AppEvent::PrefChanged(path.join("/")));
        }
    }
}

impl Default for MemoryPreferences {
    fn default() -> Self {
        Self::new()
    }
}

impl Preferences for MemoryPreferences {
    fn get(&self, path: &[&str]) -> Option<Value> {
        let root = self.root.lock().unwrap_or_else(|p| p.into_inner());
        let mut current = &*root;
        for key in path {
            current = current.get(*key)?;
        }
        Some(current.clone())
    }

    fn set(&self, path: &[&str], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        {
            let mut root = self.root.lock().unwrap_or_else(|p| p.into_inner());
            let mut current = &mut *root;
            for key in parents {
                if !current.get(*key).is_some_and(Value::is_object) {
                    if let Some(obj) = current.as_object_mut() {
                        obj.insert(key.to_string(), Value::Object(Default::default()));
                    }
                }
                let Some(next) = current.get_mut(*key) else {
                    return;
                };
                current = next;
            }
            if let Some(obj) = current.as_object_mut() {
                obj.insert(last.to_string(), value);
            }
        }
        self.notify(path);
    }

    fn remove(&self, path: &[&str]) -> bool {
        let Some((last, parents)) = path.split_last() else {
            return false;
        };
        let removed = {
            let mut root = self.root.lock().unwrap_or_else(|p| p.into_inner());
            parents
                .iter()
                .try_fold(&mut *root, |current, key| current.get_mut(*key))
                .and_then(Value::as_object_mut)
                .is_some_and(|obj| obj.remove(*last).is_some())
        };
        if removed {
            self.notify(path);
        }
        removed
    }
}
