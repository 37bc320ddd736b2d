//! Host application collaborators consumed by the open dispatcher.

use crate::open::{OpenCompletion, ViewType};
use crate::prefs::Preferences;
use anyhow::Result;
use std::fmt;
use std::sync::Arc;

/// An open document/tab in the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewHandle {
    pub id: u64,
    pub uri: String,
    pub view_type: ViewType,
}

/// What the view manager is asked to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTarget {
    pub uri: String,
    pub line: Option<u32>,
    pub view_type: ViewType,
}

pub trait ViewManager: Send + Sync {
    /// Opens `target` and completes `done` once the view exists. Dropping
    /// `done` without completing it reports that nothing was opened.
    fn open_document(&self, target: DocumentTarget, done: OpenCompletion);
    fn open_views(&self, view_type: ViewType) -> Vec<ViewHandle>;
    /// Brings an open view to the front, moving to `line` when given.
    fn focus(&self, view: &ViewHandle, line: Option<u32>);
    fn current_view(&self) -> Option<ViewHandle>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    ColorScheme,
    Snippet,
    Tool,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportKind::ColorScheme => "color scheme",
            ImportKind::Snippet => "snippet",
            ImportKind::Tool => "tool",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportChoice {
    Import,
    OpenAsText,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Cancel,
}

pub trait Dialogs: Send + Sync {
    fn ask_import(&self, kind: ImportKind, uri: &str) -> ImportChoice;
    fn yes_no_cancel(&self, title: &str, message: &str) -> Answer;
    fn alert(&self, message: &str);
    fn pick_files(&self, title: &str, default_dir: Option<&str>) -> Vec<String>;
}

pub trait ProjectLoader: Send + Sync {
    fn open_project(&self, uri: &str) -> Result<()>;
}

pub trait AddonInstaller: Send + Sync {
    fn install(&self, uri: &str) -> Result<()>;
}

pub trait ToolboxImporter: Send + Sync {
    fn import_package(&self, uri: &str) -> Result<()>;
    fn import_snippet(&self, uri: &str) -> Result<()>;
    fn import_tool(&self, uri: &str) -> Result<()>;
}

pub trait SchemeService: Send + Sync {
    fn schemes(&self) -> Vec<String>;
    /// Imports the scheme file and returns the name it was registered under.
    fn import(&self, uri: &str) -> Result<String>;
    fn activate(&self, name: &str) -> Result<()>;

    fn is_known(&self, name: &str) -> bool {
        self.schemes().iter().any(|s| s == name)
    }
}

pub struct BannerAction {
    pub label: String,
    pub run: Box<dyn FnOnce() + Send>,
}

impl fmt::Debug for BannerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BannerAction").field("label", &self.label).finish()
    }
}

#[derive(Debug)]
pub struct Banner {
    pub id: String,
    pub message: String,
    pub actions: Vec<BannerAction>,
}

pub trait Notifications: Send + Sync {
    fn post(&self, banner: Banner);
}

pub trait DatabaseExplorer: Send + Sync {
    /// Lower-case extensions, without the dot, that the explorer can show.
    fn extensions(&self) -> Vec<String>;
    fn open(&self, uri: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct Services {
    pub views: Arc<dyn ViewManager>,
    pub dialogs: Arc<dyn Dialogs>,
    pub prefs: Arc<dyn Preferences>,
    pub projects: Arc<dyn ProjectLoader>,
    pub addons: Arc<dyn AddonInstaller>,
    pub toolbox: Arc<dyn ToolboxImporter>,
    pub schemes: Arc<dyn SchemeService>,
    pub notifications: Arc<dyn Notifications>,
    pub database: Option<Arc<dyn DatabaseExplorer>>,
}
