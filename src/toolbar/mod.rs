pub mod button;
pub mod manifest;
pub mod menu;
pub mod router;
pub mod spec;

pub use button::{ButtonState, ButtonView, DynamicButton};
pub use manifest::{ButtonDecl, ButtonManifest, ManifestLoader};
pub use menu::{MenuCallback, MenuEntry, MenuReply, MenuSource};
pub use router::{EventPattern, EventRoute, EventRouter, RouteOutcome};
pub use spec::{ButtonCommand, ButtonSpec};

use crate::config::ToolbarConfig;
use crate::events::AppEvent;
use crate::prefs::Preferences;
use anyhow::{anyhow, Context, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

pub const TOGGLE_PREFIX: &str = "toggle::";

/// The UI surface buttons render into.
pub trait ToolbarHost: Send + Sync {
    fn insert_button(&self, view: &ButtonView);
    fn remove_button(&self, id: &str);
    fn set_disabled(&self, id: &str, disabled: bool);
    fn set_hidden(&self, id: &str, hidden: bool);
    fn set_label(&self, id: &str, label: &str, tooltip: Option<&str>);
    fn set_group_collapsed(&self, group: &str, collapsed: bool);
    fn set_menu(&self, id: &str, entries: &[MenuEntry]);
    fn attach_menu(&self, id: &str, element: &str);
}

pub trait CommandService: Send + Sync {
    /// `None` when the command is unknown.
    fn is_enabled(&self, command: &str) -> Option<bool>;
    fn execute(&self, command: &str) -> Result<()>;
}

pub struct ToolbarContext {
    pub host: Arc<dyn ToolbarHost>,
    pub commands: Arc<dyn CommandService>,
    pub prefs: Arc<dyn Preferences>,
}

pub(crate) struct RegistryShared {
    buttons: Mutex<Vec<Arc<DynamicButton>>>,
    ctx: Arc<ToolbarContext>,
    refresh_delay: Duration,
}

impl RegistryShared {
    fn buttons(&self) -> MutexGuard<'_, Vec<Arc<DynamicButton>>> {
        self.buttons.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn snapshot(&self) -> Vec<Arc<DynamicButton>> {
        self.buttons().clone()
    }

    fn find(&self, id: &str) -> Option<Arc<DynamicButton>> {
        self.buttons().iter().find(|b| b.id() == id).cloned()
    }

    /// Collapses a group when none of its visible members is enabled.
    pub(crate) fn refresh_group(&self, group: &str) {
        let members: Vec<_> = self
            .snapshot()
            .into_iter()
            .filter(|b| b.group() == Some(group))
            .collect();
        let collapsed = !members.iter().any(|b| b.is_enabled() && !b.is_hidden());
        self.ctx.host.set_group_collapsed(group, collapsed);
    }

    fn handle_event(&self, event: &AppEvent) {
        for button in self.snapshot().iter().filter(|b| b.listens_to(event)) {
            button.update(false);
        }
    }

    fn refresh_all(&self, force: bool) {
        for button in self.snapshot() {
            button.update(force);
        }
    }
}

/// Owns every dynamic toolbar button, keyed by id, in registration order.
pub struct ButtonRegistry {
    shared: Arc<RegistryShared>,
}

impl ButtonRegistry {
    pub fn new(ctx: ToolbarContext, config: &ToolbarConfig) -> Self {
        Self {
            shared: Arc::new(RegistryShared {
                buttons: Mutex::new(Vec::new()),
                ctx: Arc::new(ctx),
                refresh_delay: config.refresh_delay(),
            }),
        }
    }

    pub fn register(&self, spec: impl Into<ButtonSpec>) -> Result<Arc<DynamicButton>> {
        let spec = spec.into();
        let id = spec.resolved_id()?;
        // Host preference stores may call back into the registry.
        let hidden = button::stored_hidden(self.shared.ctx.prefs.as_ref(), &id);

        let button = {
            let mut buttons = self.shared.buttons();
            if buttons.iter().any(|b| b.id() == id) {
                anyhow::bail!("A button with id {} is already registered", id);
            }
            let button = Arc::new(DynamicButton::new(
                id,
                spec,
                hidden,
                Arc::clone(&self.shared.ctx),
                Arc::downgrade(&self.shared),
                self.shared.refresh_delay,
            ));
            buttons.push(Arc::clone(&button));
            button
        };

        self.shared.ctx.host.insert_button(&button.view());
        button.update(true);
        log::info!("Registered toolbar button {}", button.id());
        Ok(button)
    }

    /// Registers manifest-loaded buttons; ones that fail are logged and skipped.
    pub fn register_all(&self, specs: Vec<ButtonSpec>) -> Vec<Arc<DynamicButton>> {
        specs
            .into_iter()
            .filter_map(|spec| {
                let label = spec.label.clone();
                match self.register(spec) {
                    Ok(button) => Some(button),
                    Err(e) => {
                        log::warn!("Skipping toolbar button {:?}: {:#}", label, e);
                        None
                    }
                }
            })
            .collect()
    }

    pub fn unregister(&self, id: &str) -> Result<()> {
        let button = {
            let mut buttons = self.shared.buttons();
            let idx = buttons
                .iter()
                .position(|b| b.id() == id)
                .ok_or_else(|| anyhow!("No button with id {} is registered", id))?;
            buttons.remove(idx)
        };

        button.retire();
        self.shared.ctx.host.remove_button(id);
        if let Some(group) = button.group() {
            self.shared.refresh_group(group);
        }
        log::info!("Unregistered toolbar button {}", id);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<DynamicButton>> {
        self.shared.find(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.shared.buttons().iter().map(|b| b.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.shared.buttons().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Schedules a debounced refresh of every button subscribed to `event`.
    pub fn handle_event(&self, event: &AppEvent) {
        self.shared.handle_event(event);
    }

    pub fn refresh_all(&self, force: bool) {
        self.shared.refresh_all(force);
    }

    /// Feeds bus events into the registry until the bus closes or the
    /// registry is dropped.
    pub fn listen(&self, rx: broadcast::Receiver<AppEvent>) -> Result<JoinHandle<()>> {
        let handle = Handle::try_current().context("Toolbar listener needs a tokio runtime")?;
        let shared = Arc::downgrade(&self.shared);
        Ok(handle.spawn(async move {
            let mut stream = BroadcastStream::new(rx);
            while let Some(item) = stream.next().await {
                let Some(shared) = shared.upgrade() else { break };
                match item {
                    Ok(event) => shared.handle_event(&event),
                    Err(BroadcastStreamRecvError::Lagged(missed)) => {
                        log::warn!("Toolbar listener missed {} events, refreshing all buttons", missed);
                        shared.refresh_all(false);
                    }
                }
            }
            log::debug!("Toolbar listener stopped");
        }))
    }

    /// The "customize toolbar" menu: one checkbox per button, checked when shown.
    pub fn available_menu(&self) -> Vec<MenuEntry> {
        self.shared
            .snapshot()
            .iter()
            .map(|b| MenuEntry::Checkbox {
                id: format!("{}{}", TOGGLE_PREFIX, b.id()),
                label: b.label(),
                checked: !b.is_hidden(),
                command: None,
            })
            .collect()
    }

    /// Routes `toggle::<id>` to show/hide and `<id>::<entry>` to the button's
    /// submenu entry.
    pub fn route_menu_event(&self, event_id: &str) -> Result<RouteOutcome> {
        self.menu_router().route(event_id)
    }

    fn menu_router(&self) -> EventRouter {
        let mut routes = Vec::new();

        let shared = Arc::downgrade(&self.shared);
        routes.push(EventRoute {
            pattern: EventPattern::Prefix(TOGGLE_PREFIX.to_string()),
            handler: Box::new(move |id| {
                let button = shared
                    .upgrade()
                    .and_then(|s| s.find(id))
                    .ok_or_else(|| anyhow!("No button with id {} is registered", id))?;
                if button.is_hidden() {
                    button.show();
                } else {
                    button.hide();
                }
                Ok(())
            }),
        });

        for button in self.shared.snapshot() {
            let prefix = format!("{}::", button.id());
            let button = Arc::downgrade(&button);
            routes.push(EventRoute {
                pattern: EventPattern::Prefix(prefix),
                handler: Box::new(move |entry_id| match button.upgrade() {
                    Some(button) => button.run_menu_entry(entry_id),
                    None => Ok(()),
                }),
            });
        }

        EventRouter::new(routes)
    }

    /// Unregisters every button and stops their pending refreshes.
    pub fn teardown(&self) {
        let buttons = std::mem::take(&mut *self.shared.buttons());
        for button in &buttons {
            button.retire();
            self.shared.ctx.host.remove_button(button.id());
        }
        log::info!("Toolbar torn down ({} buttons)", buttons.len());
    }
}
