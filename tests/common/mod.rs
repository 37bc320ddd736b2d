#![allow(dead_code)]

use anyhow::Result;
use ide_glue::config::{OpenConfig, ToolbarConfig};
use ide_glue::open::{Dispatcher, OpenCallback, OpenCompletion, ViewType};
use ide_glue::prefs::MemoryPreferences;
use ide_glue::services::{
    AddonInstaller, Answer, Banner, DatabaseExplorer, Dialogs, DocumentTarget, ImportChoice, ImportKind,
    Notifications, ProjectLoader, SchemeService, Services, ToolboxImporter, ViewHandle, ViewManager,
};
use ide_glue::toolbar::{ButtonRegistry, ButtonView, CommandService, MenuEntry, ToolbarContext, ToolbarHost};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub fn callback_into(slot: &Arc<Mutex<Vec<Option<ViewHandle>>>>) -> OpenCallback {
    let slot = Arc::clone(slot);
    Box::new(move |view| slot.lock().unwrap().push(view))
}

// ---- open dispatcher fakes ----

#[derive(Default)]
pub struct FakeViews {
    pub fail_opens: AtomicBool,
    next_id: AtomicU64,
    pub views: Mutex<Vec<ViewHandle>>,
    pub opened: Mutex<Vec<DocumentTarget>>,
    pub focused: Mutex<Vec<(u64, Option<u32>)>>,
    pub current: Mutex<Option<ViewHandle>>,
}

impl FakeViews {
    pub fn with_open(uri: &str, view_type: ViewType) -> Self {
        let views = FakeViews::default();
        views.views.lock().unwrap().push(ViewHandle {
            id: 100,
            uri: uri.to_string(),
            view_type,
        });
        views
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }
}

impl ViewManager for FakeViews {
    fn open_document(&self, target: DocumentTarget, done: OpenCompletion) {
        self.opened.lock().unwrap().push(target.clone());
        if self.fail_opens.load(Ordering::SeqCst) {
            drop(done);
            return;
        }
        let view = ViewHandle {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            uri: target.uri,
            view_type: target.view_type,
        };
        self.views.lock().unwrap().push(view.clone());
        done.complete(Some(view));
    }

    fn open_views(&self, view_type: ViewType) -> Vec<ViewHandle> {
        self.views
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.view_type == view_type)
            .cloned()
            .collect()
    }

    fn focus(&self, view: &ViewHandle, line: Option<u32>) {
        self.focused.lock().unwrap().push((view.id, line));
    }

    fn current_view(&self) -> Option<ViewHandle> {
        self.current.lock().unwrap().clone()
    }
}

pub struct FakeDialogs {
    pub import_choice: Mutex<ImportChoice>,
    pub reopen_answer: Mutex<Answer>,
    pub picked: Mutex<Vec<String>>,
    pub import_prompts: Mutex<Vec<(ImportKind, String)>>,
    pub reopen_prompts: Mutex<Vec<String>>,
    pub picker_dirs: Mutex<Vec<Option<String>>>,
    pub alerts: Mutex<Vec<String>>,
}

impl Default for FakeDialogs {
    fn default() -> Self {
        Self {
            import_choice: Mutex::new(ImportChoice::Import),
            reopen_answer: Mutex::new(Answer::Yes),
            picked: Mutex::new(Vec::new()),
            import_prompts: Mutex::new(Vec::new()),
            reopen_prompts: Mutex::new(Vec::new()),
            picker_dirs: Mutex::new(Vec::new()),
            alerts: Mutex::new(Vec::new()),
        }
    }
}

impl Dialogs for FakeDialogs {
    fn ask_import(&self, kind: ImportKind, uri: &str) -> ImportChoice {
        self.import_prompts.lock().unwrap().push((kind, uri.to_string()));
        *self.import_choice.lock().unwrap()
    }

    fn yes_no_cancel(&self, _title: &str, message: &str) -> Answer {
        self.reopen_prompts.lock().unwrap().push(message.to_string());
        *self.reopen_answer.lock().unwrap()
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }

    fn pick_files(&self, _title: &str, default_dir: Option<&str>) -> Vec<String> {
        self.picker_dirs.lock().unwrap().push(default_dir.map(String::from));
        self.picked.lock().unwrap().clone()
    }
}

/// Records every importer/loader call as `"<kind>:<uri>"`.
#[derive(Default)]
pub struct FakeImporters {
    pub calls: Mutex<Vec<String>>,
    pub fail_addons: AtomicBool,
    pub fail_schemes: AtomicBool,
    pub known_schemes: Mutex<Vec<String>>,
    pub banners: Mutex<Vec<Banner>>,
    pub database_extensions: Vec<String>,
}

impl FakeImporters {
    fn record(&self, kind: &str, uri: &str) {
        self.calls.lock().unwrap().push(format!("{}:{}", kind, uri));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProjectLoader for FakeImporters {
    fn open_project(&self, uri: &str) -> Result<()> {
        self.record("project", uri);
        Ok(())
    }
}

impl AddonInstaller for FakeImporters {
    fn install(&self, uri: &str) -> Result<()> {
        self.record("addon", uri);
        if self.fail_addons.load(Ordering::SeqCst) {
            anyhow::bail!("incompatible add-on");
        }
        Ok(())
    }
}

impl ToolboxImporter for FakeImporters {
    fn import_package(&self, uri: &str) -> Result<()> {
        self.record("package", uri);
        Ok(())
    }

    fn import_snippet(&self, uri: &str) -> Result<()> {
        self.record("snippet", uri);
        Ok(())
    }

    fn import_tool(&self, uri: &str) -> Result<()> {
        self.record("tool", uri);
        Ok(())
    }
}

impl SchemeService for FakeImporters {
    fn schemes(&self) -> Vec<String> {
        self.known_schemes.lock().unwrap().clone()
    }

    fn import(&self, uri: &str) -> Result<String> {
        self.record("scheme", uri);
        if self.fail_schemes.load(Ordering::SeqCst) {
            anyhow::bail!("not a scheme file");
        }
        let name = uri.rsplit('/').next().unwrap_or(uri).trim_end_matches(".ksf").to_string();
        self.known_schemes.lock().unwrap().push(name.clone());
        Ok(name)
    }

    fn activate(&self, name: &str) -> Result<()> {
        self.record("activate", name);
        Ok(())
    }
}

impl Notifications for FakeImporters {
    fn post(&self, banner: Banner) {
        self.banners.lock().unwrap().push(banner);
    }
}

impl DatabaseExplorer for FakeImporters {
    fn extensions(&self) -> Vec<String> {
        self.database_extensions.clone()
    }

    fn open(&self, uri: &str) -> Result<()> {
        self.record("database", uri);
        Ok(())
    }
}

pub struct OpenHarness {
    pub views: Arc<FakeViews>,
    pub dialogs: Arc<FakeDialogs>,
    pub importers: Arc<FakeImporters>,
    pub prefs: Arc<MemoryPreferences>,
}

impl OpenHarness {
    pub fn new() -> Self {
        Self::with_views(FakeViews::default())
    }

    pub fn with_views(views: FakeViews) -> Self {
        Self {
            views: Arc::new(views),
            dialogs: Arc::new(FakeDialogs::default()),
            importers: Arc::new(FakeImporters {
                database_extensions: vec!["sqlite".to_string(), "db".to_string()],
                ..FakeImporters::default()
            }),
            prefs: Arc::new(MemoryPreferences::new()),
        }
    }

    pub fn services(&self) -> Services {
        Services {
            views: self.views.clone(),
            dialogs: self.dialogs.clone(),
            prefs: self.prefs.clone(),
            projects: self.importers.clone(),
            addons: self.importers.clone(),
            toolbox: self.importers.clone(),
            schemes: self.importers.clone(),
            notifications: self.importers.clone(),
            database: Some(self.importers.clone()),
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.services(), OpenConfig::default(), None)
    }
}

// ---- toolbar fakes ----

#[derive(Default)]
pub struct FakeHost {
    pub inserted: Mutex<Vec<ButtonView>>,
    pub removed: Mutex<Vec<String>>,
    pub disabled: Mutex<HashMap<String, bool>>,
    pub hidden: Mutex<HashMap<String, bool>>,
    pub labels: Mutex<HashMap<String, (String, Option<String>)>>,
    pub collapsed: Mutex<HashMap<String, bool>>,
    pub menus: Mutex<HashMap<String, Vec<MenuEntry>>>,
    pub attached: Mutex<Vec<(String, String)>>,
}

impl FakeHost {
    pub fn is_disabled(&self, id: &str) -> Option<bool> {
        self.disabled.lock().unwrap().get(id).copied()
    }

    pub fn is_collapsed(&self, group: &str) -> Option<bool> {
        self.collapsed.lock().unwrap().get(group).copied()
    }

    pub fn menu(&self, id: &str) -> Option<Vec<MenuEntry>> {
        self.menus.lock().unwrap().get(id).cloned()
    }
}

impl ToolbarHost for FakeHost {
    fn insert_button(&self, view: &ButtonView) {
        self.inserted.lock().unwrap().push(view.clone());
    }

    fn remove_button(&self, id: &str) {
        self.removed.lock().unwrap().push(id.to_string());
    }

    fn set_disabled(&self, id: &str, disabled: bool) {
        self.disabled.lock().unwrap().insert(id.to_string(), disabled);
    }

    fn set_hidden(&self, id: &str, hidden: bool) {
        self.hidden.lock().unwrap().insert(id.to_string(), hidden);
    }

    fn set_label(&self, id: &str, label: &str, tooltip: Option<&str>) {
        self.labels
            .lock()
            .unwrap()
            .insert(id.to_string(), (label.to_string(), tooltip.map(String::from)));
    }

    fn set_group_collapsed(&self, group: &str, collapsed: bool) {
        self.collapsed.lock().unwrap().insert(group.to_string(), collapsed);
    }

    fn set_menu(&self, id: &str, entries: &[MenuEntry]) {
        self.menus.lock().unwrap().insert(id.to_string(), entries.to_vec());
    }

    fn attach_menu(&self, id: &str, element: &str) {
        self.attached.lock().unwrap().push((id.to_string(), element.to_string()));
    }
}

/// Commands named in `enabled` are enabled; every other known command is not.
#[derive(Default)]
pub struct FakeCommands {
    pub enabled: Mutex<Vec<String>>,
    pub known: Mutex<Vec<String>>,
    pub executed: Mutex<Vec<String>>,
}

impl FakeCommands {
    pub fn with(enabled: &[&str]) -> Self {
        let names: Vec<String> = enabled.iter().map(|s| s.to_string()).collect();
        Self {
            enabled: Mutex::new(names.clone()),
            known: Mutex::new(names),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl CommandService for FakeCommands {
    fn is_enabled(&self, command: &str) -> Option<bool> {
        if !self.known.lock().unwrap().iter().any(|c| c == command) {
            return None;
        }
        Some(self.enabled.lock().unwrap().iter().any(|c| c == command))
    }

    fn execute(&self, command: &str) -> Result<()> {
        self.executed.lock().unwrap().push(command.to_string());
        Ok(())
    }
}

pub struct ToolbarHarness {
    pub host: Arc<FakeHost>,
    pub commands: Arc<FakeCommands>,
    pub prefs: Arc<MemoryPreferences>,
    pub registry: ButtonRegistry,
}

impl ToolbarHarness {
    pub fn new(commands: FakeCommands) -> Self {
        Self::with_prefs(commands, Arc::new(MemoryPreferences::new()))
    }

    pub fn with_prefs(commands: FakeCommands, prefs: Arc<MemoryPreferences>) -> Self {
        let host = Arc::new(FakeHost::default());
        let commands = Arc::new(commands);
        let registry = ButtonRegistry::new(
            ToolbarContext {
                host: host.clone(),
                commands: commands.clone(),
                prefs: prefs.clone(),
            },
            &ToolbarConfig::default(),
        );
        Self {
            host,
            commands,
            prefs,
            registry,
        }
    }
}
