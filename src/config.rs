use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GlueConfig {
    #[serde(default)]
    pub open: OpenConfig,
    #[serde(default)]
    pub toolbar: ToolbarConfig,
}

/// Extension tables and timings for the open dispatcher.
///
/// Extensions are matched case-insensitively and without the leading dot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenConfig {
    pub project_extensions: Vec<String>,
    pub addon_extensions: Vec<String>,
    pub toolbox_extensions: Vec<String>,
    pub scheme_extensions: Vec<String>,
    pub snippet_extensions: Vec<String>,
    pub tool_extensions: Vec<String>,
    pub preview_extensions: Vec<String>,
    pub batch_quiet_ms: u64,
}

impl Default for OpenConfig {
    fn default() -> Self {
        Self {
            project_extensions: strings(&["komodoproject", "kpf"]),
            addon_extensions: strings(&["xpi"]),
            toolbox_extensions: strings(&["kpz"]),
            scheme_extensions: strings(&["ksf"]),
            snippet_extensions: strings(&["kksnippet"]),
            tool_extensions: strings(&["komodotool"]),
            preview_extensions: strings(&[
                "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tif", "tiff",
                "mp3", "ogg", "oga", "wav", "flac", "m4a",
            ]),
            batch_quiet_ms: 500,
        }
    }
}

impl OpenConfig {
    pub fn batch_quiet_period(&self) -> Duration {
        Duration::from_millis(self.batch_quiet_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolbarConfig {
    pub refresh_debounce_ms: u64,
    pub manifest_dir: Option<PathBuf>,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            refresh_debounce_ms: 250,
            manifest_dir: None,
        }
    }
}

impl ToolbarConfig {
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_debounce_ms)
    }

    pub fn effective_manifest_dir(&self) -> Result<PathBuf> {
        match &self.manifest_dir {
            Some(dir) => Ok(dir.clone()),
            None => crate::paths::toolbar_dir(),
        }
    }
}

impl GlueConfig {
    pub fn load() -> Result<Self> {
        let path = crate::paths::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        let config: GlueConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
