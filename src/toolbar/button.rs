use super::menu::{find_command, MenuEntry, MenuReply, MenuSource};
use super::spec::{ButtonCommand, ButtonSpec, EnablePredicate};
use super::{RegistryShared, ToolbarContext};
use crate::debounce::Debouncer;
use crate::events::AppEvent;
use crate::prefs::{Preferences, BUTTONS_SCOPE};
use anyhow::Result;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::runtime::Handle;

const HIDDEN_KEY: &str = "hidden";

/// The hidden flag remembered for `id`, false when never set.
pub(crate) fn stored_hidden(prefs: &dyn Preferences, id: &str) -> bool {
    prefs.get_bool(&[BUTTONS_SCOPE, id, HIDDEN_KEY]).unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Constructed,
    Enabled,
    Disabled,
    Unregistered,
}

/// What the host needs to create the toolbar element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub id: String,
    pub label: String,
    pub tooltip: Option<String>,
    pub image: Option<String>,
    pub group: Option<String>,
    pub group_ordinal: i32,
    pub ordinal: i32,
    pub has_menu: bool,
    pub hidden: bool,
}

struct ButtonStatus {
    label: String,
    tooltip: Option<String>,
    hidden: bool,
    state: ButtonState,
    menu_built: bool,
    menu_entries: Vec<MenuEntry>,
}

pub struct DynamicButton {
    id: String,
    image: Option<String>,
    group: Option<String>,
    group_ordinal: i32,
    ordinal: i32,
    command: Option<ButtonCommand>,
    is_enabled: Option<EnablePredicate>,
    menu: Option<MenuSource>,
    events: Vec<AppEvent>,
    status: Mutex<ButtonStatus>,
    refresh: Debouncer,
    recomputes: AtomicUsize,
    ctx: Arc<ToolbarContext>,
    registry: Weak<RegistryShared>,
}

impl DynamicButton {
    pub(crate) fn new(
        id: String,
        spec: ButtonSpec,
        hidden: bool,
        ctx: Arc<ToolbarContext>,
        registry: Weak<RegistryShared>,
        refresh_delay: Duration,
    ) -> Self {
        Self {
            image: spec.image,
            group: spec.group,
            group_ordinal: spec.group_ordinal,
            ordinal: spec.ordinal,
            command: spec.command,
            is_enabled: spec.is_enabled,
            menu: spec.menu,
            events: spec.events,
            status: Mutex::new(ButtonStatus {
                label: spec.label,
                tooltip: spec.tooltip,
                hidden,
                state: ButtonState::Constructed,
                menu_built: false,
                menu_entries: Vec::new(),
            }),
            refresh: Debouncer::new(refresh_delay),
            recomputes: AtomicUsize::new(0),
            ctx,
            registry,
            id,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn label(&self) -> String {
        self.status().label.clone()
    }

    pub fn state(&self) -> ButtonState {
        self.status().state
    }

    pub fn is_enabled(&self) -> bool {
        self.state() == ButtonState::Enabled
    }

    pub fn is_hidden(&self) -> bool {
        self.status().hidden
    }

    pub fn is_refresh_pending(&self) -> bool {
        self.refresh.is_pending()
    }

    /// Number of enablement recomputations so far.
    pub fn refresh_count(&self) -> usize {
        self.recomputes.load(Ordering::SeqCst)
    }

    pub fn listens_to(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn view(&self) -> ButtonView {
        let status = self.status();
        ButtonView {
            id: self.id.clone(),
            label: status.label.clone(),
            tooltip: status.tooltip.clone(),
            image: self.image.clone(),
            group: self.group.clone(),
            group_ordinal: self.group_ordinal,
            ordinal: self.ordinal,
            has_menu: self.menu.is_some(),
            hidden: status.hidden,
        }
    }

    /// Schedules a debounced recomputation, or recomputes now when `force`d.
    pub fn update(self: &Arc<Self>, force: bool) {
        if self.state() == ButtonState::Unregistered {
            return;
        }
        if force {
            self.refresh.cancel();
            self.recompute();
            return;
        }
        let button = Arc::downgrade(self);
        self.refresh.schedule(move || {
            if let Some(button) = button.upgrade() {
                button.recompute();
            }
        });
    }

    fn recompute(&self) {
        let enabled = self.query_enabled();
        {
            let mut status = self.status();
            if status.state == ButtonState::Unregistered {
                return;
            }
            status.state = if enabled { ButtonState::Enabled } else { ButtonState::Disabled };
        }
        self.recomputes.fetch_add(1, Ordering::SeqCst);
        self.ctx.host.set_disabled(&self.id, !enabled);
        self.refresh_group();
    }

    fn query_enabled(&self) -> bool {
        if let Some(predicate) = &self.is_enabled {
            return predicate();
        }
        match &self.command {
            Some(ButtonCommand::Named(name)) => self.ctx.commands.is_enabled(name).unwrap_or(false),
            _ => false,
        }
    }

    fn refresh_group(&self) {
        if let (Some(group), Some(registry)) = (&self.group, self.registry.upgrade()) {
            registry.refresh_group(group);
        }
    }

    pub fn show(&self) {
        self.set_hidden(false);
    }

    pub fn hide(&self) {
        self.set_hidden(true);
    }

    fn set_hidden(&self, hidden: bool) {
        {
            let mut status = self.status();
            if status.state == ButtonState::Unregistered || status.hidden == hidden {
                return;
            }
            status.hidden = hidden;
        }
        self.ctx
            .prefs
            .set(&[BUTTONS_SCOPE, self.id.as_str(), HIDDEN_KEY], serde_json::json!(hidden));
        self.ctx.host.set_hidden(&self.id, hidden);
        self.refresh_group();
    }

    pub fn set_label(&self, label: impl Into<String>) {
        let (label, tooltip) = {
            let mut status = self.status();
            if status.state == ButtonState::Unregistered {
                return;
            }
            status.label = label.into();
            (status.label.clone(), status.tooltip.clone())
        };
        self.ctx.host.set_label(&self.id, &label, tooltip.as_deref());
    }

    pub fn set_tooltip(&self, tooltip: Option<String>) {
        let (label, tooltip) = {
            let mut status = self.status();
            if status.state == ButtonState::Unregistered {
                return;
            }
            status.tooltip = tooltip;
            (status.label.clone(), status.tooltip.clone())
        };
        self.ctx.host.set_label(&self.id, &label, tooltip.as_deref());
    }

    /// Runs the button's command. Clicks on a disabled button are ignored.
    pub fn activate(&self) -> Result<()> {
        if !self.is_enabled() {
            log::debug!("Ignoring click on disabled button {}", self.id);
            return Ok(());
        }
        match &self.command {
            Some(ButtonCommand::Named(name)) => self.ctx.commands.execute(name),
            Some(ButtonCommand::Callback(f)) => {
                f();
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Builds the submenu right before it shows.
    pub fn menu_showing(self: &Arc<Self>) {
        let Some(menu) = &self.menu else { return };
        if self.state() == ButtonState::Unregistered {
            return;
        }

        match menu {
            MenuSource::Static(entries) => {
                if self.mark_menu_built() {
                    self.set_menu_entries(entries.clone());
                }
            }
            MenuSource::External(element) => {
                if self.mark_menu_built() {
                    self.ctx.host.attach_menu(&self.id, element);
                }
            }
            MenuSource::Callback(callback) => match callback() {
                MenuReply::Ready(entries) => self.set_menu_entries(entries),
                MenuReply::Pending(rx) => self.await_menu_entries(rx),
            },
        }
    }

    fn await_menu_entries(self: &Arc<Self>, mut rx: tokio::sync::oneshot::Receiver<Vec<MenuEntry>>) {
        self.set_menu_entries(vec![MenuEntry::loading()]);

        let Ok(handle) = Handle::try_current() else {
            match rx.try_recv() {
                Ok(entries) => self.set_menu_entries(entries),
                Err(_) => log::warn!("Menu for {} is not ready and no runtime can wait for it", self.id),
            }
            return;
        };

        let button = Arc::downgrade(self);
        handle.spawn(async move {
            let entries = match rx.await {
                Ok(entries) => entries,
                Err(_) => {
                    log::warn!("Menu provider dropped before answering");
                    Vec::new()
                }
            };
            if let Some(button) = button.upgrade() {
                button.set_menu_entries(entries);
            }
        });
    }

    fn mark_menu_built(&self) -> bool {
        let mut status = self.status();
        !std::mem::replace(&mut status.menu_built, true)
    }

    fn set_menu_entries(&self, entries: Vec<MenuEntry>) {
        {
            let mut status = self.status();
            if status.state == ButtonState::Unregistered {
                return;
            }
            status.menu_entries = entries.clone();
        }
        self.ctx.host.set_menu(&self.id, &entries);
    }

    pub fn menu_entries(&self) -> Vec<MenuEntry> {
        self.status().menu_entries.clone()
    }

    /// Runs the command bound to a submenu entry.
    pub fn run_menu_entry(&self, entry_id: &str) -> Result<()> {
        let entries = self.menu_entries();
        match find_command(&entries, entry_id) {
            Some(Some(command)) => self.ctx.commands.execute(&command),
            Some(None) => {
                log::debug!("Menu entry {}::{} has no command", self.id, entry_id);
                Ok(())
            }
            None => anyhow::bail!("Button {} has no menu entry {}", self.id, entry_id),
        }
    }

    pub(crate) fn retire(&self) {
        self.refresh.cancel();
        self.status().state = ButtonState::Unregistered;
    }

    fn status(&self) -> MutexGuard<'_, ButtonStatus> {
        self.status.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl fmt::Debug for DynamicButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicButton")
            .field("id", &self.id)
            .field("group", &self.group)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
