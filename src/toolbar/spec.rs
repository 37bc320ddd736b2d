use super::menu::MenuSource;
use crate::events::AppEvent;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("non-word pattern"));

pub type EnablePredicate = Arc<dyn Fn() -> bool + Send + Sync>;

#[derive(Clone)]
pub enum ButtonCommand {
    /// Command known to the host's command service, e.g. `cmd_save`.
    Named(String),
    Callback(Arc<dyn Fn() + Send + Sync>),
}

impl fmt::Debug for ButtonCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonCommand::Named(name) => f.debug_tuple("Named").field(name).finish(),
            ButtonCommand::Callback(_) => f.write_str("Callback"),
        }
    }
}

/// Everything a toolbar button is registered with.
#[derive(Clone, Default)]
pub struct ButtonSpec {
    pub id: Option<String>,
    pub label: String,
    pub tooltip: Option<String>,
    pub image: Option<String>,
    pub command: Option<ButtonCommand>,
    pub is_enabled: Option<EnablePredicate>,
    pub menu: Option<MenuSource>,
    pub group: Option<String>,
    pub group_ordinal: i32,
    pub ordinal: i32,
    pub events: Vec<AppEvent>,
}

impl ButtonSpec {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn command(mut self, name: impl Into<String>) -> Self {
        self.command = Some(ButtonCommand::Named(name.into()));
        self
    }

    pub fn on_click<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.command = Some(ButtonCommand::Callback(Arc::new(f)));
        self
    }

    pub fn enabled_when<F>(mut self, f: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.is_enabled = Some(Arc::new(f));
        self
    }

    pub fn menu(mut self, menu: MenuSource) -> Self {
        self.menu = Some(menu);
        self
    }

    pub fn group(mut self, group: impl Into<String>, group_ordinal: i32) -> Self {
        self.group = Some(group.into());
        self.group_ordinal = group_ordinal;
        self
    }

    pub fn ordinal(mut self, ordinal: i32) -> Self {
        self.ordinal = ordinal;
        self
    }

    pub fn on_event(mut self, event: AppEvent) -> Self {
        self.events.push(event);
        self
    }

    /// The explicit id, or the label with non-word characters stripped.
    pub fn resolved_id(&self) -> Result<String> {
        let id = match &self.id {
            Some(id) => id.trim().to_string(),
            None => normalize_id(&self.label),
        };
        if id.is_empty() {
            anyhow::bail!("Button {:?} has no usable id", self.label);
        }
        Ok(id)
    }
}

impl From<&str> for ButtonSpec {
    fn from(label: &str) -> Self {
        ButtonSpec::new(label)
    }
}

impl fmt::Debug for ButtonSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ButtonSpec")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("command", &self.command)
            .field("menu", &self.menu)
            .field("group", &self.group)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

pub fn normalize_id(label: &str) -> String {
    NON_WORD.replace_all(label, "").into_owned()
}
