use super::menu::MenuSource;
use super::spec::ButtonSpec;
use crate::events::AppEvent;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A `*.toml` file holding one or more `[[button]]` tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ButtonManifest {
    #[serde(default, rename = "button")]
    pub buttons: Vec<ButtonDecl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ButtonDecl {
    #[serde(default)]
    pub id: Option<String>,
    pub label: String,
    #[serde(default)]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub group_ordinal: i32,
    #[serde(default)]
    pub ordinal: i32,
    /// Plain names are UI events; `notify:` and `pref:` select the other kinds.
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub menu: Option<toml::Value>,
}

impl ButtonDecl {
    pub fn into_spec(self) -> Result<ButtonSpec> {
        let menu = self
            .menu
            .as_ref()
            .map(MenuSource::from_toml)
            .transpose()
            .with_context(|| format!("Invalid menu for button {:?}", self.label))?;

        let mut spec = ButtonSpec::new(self.label);
        spec.id = self.id;
        spec.tooltip = self.tooltip;
        spec.image = self.image;
        spec.menu = menu;
        spec.ordinal = self.ordinal;
        spec.events = self.events.iter().map(|e| AppEvent::parse_trigger(e)).collect();
        if let Some(command) = self.command {
            spec = spec.command(command);
        }
        if let Some(group) = self.group {
            spec = spec.group(group, self.group_ordinal);
        }

        spec.resolved_id()?;
        Ok(spec)
    }
}

pub struct ManifestLoader;

impl ManifestLoader {
    pub fn parse(content: &str) -> Result<Vec<ButtonSpec>> {
        let manifest: ButtonManifest = toml::from_str(content).context("Failed to parse button manifest")?;
        manifest.buttons.into_iter().map(ButtonDecl::into_spec).collect()
    }

    pub fn load_manifest(path: &Path) -> Result<Vec<ButtonSpec>> {
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Invalid manifest {:?}", path))
    }

    /// Loads every manifest in `dir` in file-name order. Broken manifests are
    /// logged and skipped.
    pub fn load_from_dir(dir: &Path) -> Result<Vec<ButtonSpec>> {
        if !dir.exists() {
            log::debug!("Toolbar manifest directory does not exist: {:?}", dir);
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(dir).context("Failed to read toolbar manifest directory")?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        let specs: Vec<ButtonSpec> = paths
            .iter()
            .filter_map(|path| match Self::load_manifest(path) {
                Ok(specs) => Some(specs),
                Err(e) => {
                    log::warn!("Skipping toolbar manifest {:?}: {:#}", path, e);
                    None
                }
            })
            .flatten()
            .collect();

        log::info!("Loaded {} toolbar button(s) from {:?}", specs.len(), dir);
        Ok(specs)
    }
}
