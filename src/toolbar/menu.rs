use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

pub const LOADING_ID: &str = "__loading__";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MenuEntry {
    Action {
        id: String,
        label: String,
        #[serde(default)]
        command: Option<String>,
        #[serde(default = "default_enabled")]
        enabled: bool,
    },
    Checkbox {
        id: String,
        label: String,
        #[serde(default)]
        checked: bool,
        #[serde(default)]
        command: Option<String>,
    },
    Separator,
    Submenu {
        id: String,
        label: String,
        items: Vec<MenuEntry>,
    },
}

fn default_enabled() -> bool {
    true
}

impl MenuEntry {
    pub fn action(id: impl Into<String>, label: impl Into<String>, command: Option<&str>) -> Self {
        MenuEntry::Action {
            id: id.into(),
            label: label.into(),
            command: command.map(String::from),
            enabled: true,
        }
    }

    /// Disabled placeholder shown while entries are produced asynchronously.
    pub fn loading() -> Self {
        MenuEntry::Action {
            id: LOADING_ID.to_string(),
            label: "Loading…".to_string(),
            command: None,
            enabled: false,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            MenuEntry::Action { id, .. } | MenuEntry::Checkbox { id, .. } | MenuEntry::Submenu { id, .. } => {
                Some(id.as_str())
            }
            MenuEntry::Separator => None,
        }
    }
}

/// Finds the command bound to an entry, searching submenus depth-first.
pub fn find_command(items: &[MenuEntry], id: &str) -> Option<Option<String>> {
    for item in items {
        match item {
            MenuEntry::Action { id: item_id, command, .. } if item_id == id => return Some(command.clone()),
            MenuEntry::Checkbox { id: item_id, command, .. } if item_id == id => return Some(command.clone()),
            MenuEntry::Submenu { items: sub_items, .. } => {
                if let Some(found) = find_command(sub_items, id) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}

/// What a menu callback hands back when the menu is about to show.
pub enum MenuReply {
    Ready(Vec<MenuEntry>),
    /// Entries still being produced; a placeholder shows until they arrive.
    Pending(oneshot::Receiver<Vec<MenuEntry>>),
}

pub type MenuCallback = Arc<dyn Fn() -> MenuReply + Send + Sync>;

#[derive(Clone)]
pub enum MenuSource {
    Static(Vec<MenuEntry>),
    Callback(MenuCallback),
    /// Subtree built by the host UI, referenced by its element id.
    External(String),
}

impl fmt::Debug for MenuSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuSource::Static(entries) => f.debug_tuple("Static").field(entries).finish(),
            MenuSource::Callback(_) => f.write_str("Callback"),
            MenuSource::External(id) => f.debug_tuple("External").field(id).finish(),
        }
    }
}

impl MenuSource {
    /// Accepts a list of entries or `{ external = "<element id>" }`.
    pub fn from_toml(value: &toml::Value) -> Result<Self> {
        match value {
            toml::Value::Array(items) => {
                let entries = items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| {
                        item.clone()
                            .try_into::<MenuEntry>()
                            .with_context(|| format!("Invalid menu entry at index {}", idx))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(MenuSource::Static(entries))
            }
            toml::Value::Table(table) => match table.get("external").and_then(|v| v.as_str()) {
                Some(id) if !id.is_empty() => Ok(MenuSource::External(id.to_string())),
                _ => anyhow::bail!("Menu table must name an external element: {{ external = \"<id>\" }}"),
            },
            other => anyhow::bail!("Menu must be a list of entries or an external element, got {}", other.type_str()),
        }
    }
}
