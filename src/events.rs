use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

pub const NOTIFICATION_PREFIX: &str = "notify:";
pub const PREF_PREFIX: &str = "pref:";

/// Something that happened in the application that toolbar buttons may react to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum AppEvent {
    /// Application-wide UI event, e.g. `current_view_changed`.
    Ui(String),
    /// Topic on the external notification service.
    Notification(String),
    /// A preference changed; carries the `/`-joined key.
    PrefChanged(String),
}

impl AppEvent {
    pub fn ui(name: impl Into<String>) -> Self {
        AppEvent::Ui(name.into())
    }

    /// Parses a trigger as written in button manifests.
    pub fn parse_trigger(s: &str) -> Self {
        if let Some(topic) = s.strip_prefix(NOTIFICATION_PREFIX) {
            AppEvent::Notification(topic.to_string())
        } else if let Some(key) = s.strip_prefix(PREF_PREFIX) {
            AppEvent::PrefChanged(key.to_string())
        } else {
            AppEvent::Ui(s.to_string())
        }
    }
}

pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn send(&self, event: AppEvent) {
        log::debug!("Event: {:?}", event);
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
