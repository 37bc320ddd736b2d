pub mod batch;
pub mod completion;
pub mod request;
pub mod router;

pub use batch::BatchWindow;
pub use completion::{OpenCallback, OpenCompletion};
pub use request::{CaseRule, OpenRequest, ResolvedRequest, ViewType};
pub use router::{OpenPattern, OpenRoute, OpenRouter, OpenTarget};

use crate::config::OpenConfig;
use crate::events::EventBus;
use crate::prefs::{Preferences, MRU_FILES, MRU_SCOPE, OPENED_FILES, SESSIONS_SCOPE};
use crate::services::{Answer, Banner, BannerAction, DocumentTarget, ImportChoice, ImportKind, Services, ViewHandle};
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Routes URIs to the view manager or to one of the importers.
pub struct Dispatcher {
    services: Services,
    config: OpenConfig,
    router: OpenRouter,
    case_rule: CaseRule,
    skip_next_prompt: AtomicBool,
    batch: Arc<BatchWindow>,
}

impl Dispatcher {
    pub fn new(services: Services, config: OpenConfig, events: Option<Arc<EventBus>>) -> Self {
        let database_extensions = services.database.as_ref().map(|db| db.extensions());
        let router = OpenRouter::from_config(&config, database_extensions);
        let batch = Arc::new(BatchWindow::new(config.batch_quiet_period(), events));
        Self {
            services,
            config,
            router,
            case_rule: CaseRule::platform_default(),
            skip_next_prompt: AtomicBool::new(false),
            batch,
        }
    }

    pub fn with_case_rule(mut self, case_rule: CaseRule) -> Self {
        self.case_rule = case_rule;
        self
    }

    pub fn router(&self) -> &OpenRouter {
        &self.router
    }

    /// Makes the next import prompt answer "open as text" without asking.
    pub fn set_skip_next_prompt(&self, skip: bool) {
        self.skip_next_prompt.store(skip, Ordering::SeqCst);
    }

    pub fn skip_next_prompt(&self) -> bool {
        self.skip_next_prompt.load(Ordering::SeqCst)
    }

    pub fn is_batch_active(&self) -> bool {
        self.batch.is_active()
    }

    /// Opens one URI. `callback` receives the view, or `None` when no view
    /// was opened; errors never escape.
    pub fn open(&self, request: OpenRequest, callback: Option<OpenCallback>) {
        let completion = OpenCompletion::new(callback);
        if let Err(e) = self.dispatch(&request, completion) {
            log::error!("Failed to open {}: {:#}", request.uri, e);
        }
    }

    fn dispatch(&self, request: &OpenRequest, completion: OpenCompletion) -> Result<()> {
        let resolved = request.resolve(&self.config.preview_extensions);
        if resolved.uri.is_empty() {
            anyhow::bail!("Empty URI");
        }

        let target = self.router.route(&resolved);
        log::info!("Opening {} as {}", resolved.uri, target);

        match target {
            OpenTarget::Project => {
                self.services.projects.open_project(&resolved.uri)?;
                completion.complete(None);
            }
            OpenTarget::Addon => {
                if let Err(e) = self.services.addons.install(&resolved.uri) {
                    log::error!("Add-on install failed for {}: {:#}", resolved.uri, e);
                    self.services
                        .dialogs
                        .alert(&format!("Could not install the add-on {}: {:#}", resolved.uri, e));
                }
                completion.complete(None);
            }
            OpenTarget::Toolbox => {
                self.services.toolbox.import_package(&resolved.uri)?;
                completion.complete(None);
            }
            OpenTarget::Database => {
                let explorer = self
                    .services
                    .database
                    .as_ref()
                    .context("Database route without an explorer")?;
                explorer.open(&resolved.uri)?;
                completion.complete(None);
            }
            OpenTarget::Import(kind) => self.import_or_open(resolved, kind, completion)?,
            OpenTarget::Document => self.open_document(resolved, completion),
        }
        Ok(())
    }

    fn import_or_open(&self, resolved: ResolvedRequest, kind: ImportKind, completion: OpenCompletion) -> Result<()> {
        // The one-shot flag is only spent when a prompt would otherwise show.
        let skip = resolved.skip_prompt || self.skip_next_prompt.swap(false, Ordering::SeqCst);
        let choice = if skip {
            ImportChoice::OpenAsText
        } else {
            self.services.dialogs.ask_import(kind, &resolved.uri)
        };

        match choice {
            ImportChoice::Cancel => {
                log::info!("Open of {} cancelled", resolved.uri);
                completion.complete(None);
            }
            ImportChoice::OpenAsText => self.open_document(resolved, completion),
            ImportChoice::Import => match kind {
                ImportKind::ColorScheme => self.import_scheme(resolved, completion),
                ImportKind::Snippet => {
                    self.services.toolbox.import_snippet(&resolved.uri)?;
                    completion.complete(None);
                }
                ImportKind::Tool => {
                    self.services.toolbox.import_tool(&resolved.uri)?;
                    completion.complete(None);
                }
            },
        }
        Ok(())
    }

    fn import_scheme(&self, resolved: ResolvedRequest, completion: OpenCompletion) {
        let name = match self.services.schemes.import(&resolved.uri) {
            Ok(name) => name,
            Err(e) => {
                log::error!("Color scheme import failed for {}: {:#}", resolved.uri, e);
                self.services
                    .dialogs
                    .alert(&format!("Could not import the color scheme {}: {:#}", resolved.uri, e));
                self.open_document(resolved, completion);
                return;
            }
        };

        log::info!("Imported color scheme {}", name);
        let mut actions = Vec::new();
        if self.services.schemes.is_known(&name) {
            let schemes = Arc::clone(&self.services.schemes);
            let scheme = name.clone();
            actions.push(BannerAction {
                label: "Apply".to_string(),
                run: Box::new(move || {
                    if let Err(e) = schemes.activate(&scheme) {
                        log::error!("Could not activate color scheme {}: {:#}", scheme, e);
                    }
                }),
            });
        }
        self.services.notifications.post(Banner {
            id: "scheme-imported".to_string(),
            message: format!("Color scheme \"{}\" was imported.", name),
            actions,
        });
        completion.complete(None);
    }

    fn open_document(&self, resolved: ResolvedRequest, completion: OpenCompletion) {
        if let Some(existing) = self.find_open_view(&resolved) {
            log::info!("{} is already open, focusing it", resolved.uri);
            self.services.views.focus(&existing, resolved.line);
            completion.complete(Some(existing));
            return;
        }

        let batch = Arc::clone(&self.batch);
        let done = OpenCompletion::default()
            .then(move |view| {
                if view.is_some() {
                    batch.view_opened();
                }
            })
            .then(move |view| completion.complete(view));

        self.services.views.open_document(
            DocumentTarget {
                uri: resolved.uri,
                line: resolved.line,
                view_type: resolved.view_type,
            },
            done,
        );
    }

    fn find_open_view(&self, resolved: &ResolvedRequest) -> Option<ViewHandle> {
        self.services
            .views
            .open_views(resolved.view_type)
            .into_iter()
            .find(|view| self.case_rule.same(&view.uri, &resolved.uri))
    }

    /// Opens several URIs as one batch, offering to reopen the files that
    /// were open the last time any of them was used as a project session.
    ///
    /// With `is_recent`, documents that fail to open are pruned from the MRU.
    pub fn open_multiple(&self, uris: &[String], view_type: Option<ViewType>, is_recent: bool) {
        if uris.is_empty() {
            return;
        }
        let Some(uris) = self.with_remembered_files(uris) else {
            log::info!("Batch open cancelled");
            return;
        };

        log::info!("Opening {} file(s)", uris.len());
        self.batch.begin();
        for uri in uris {
            let request = OpenRequest::new(uri).maybe_view_type(view_type);
            let callback = if is_recent && self.is_document(&request) {
                Some(prune_on_failure(Arc::clone(&self.services.prefs), request.uri.clone()))
            } else {
                None
            };
            self.open(request, callback);
        }
        self.batch.settle();
    }

    fn is_document(&self, request: &OpenRequest) -> bool {
        let resolved = request.resolve(&self.config.preview_extensions);
        self.router.route(&resolved) == OpenTarget::Document
    }

    fn with_remembered_files(&self, uris: &[String]) -> Option<Vec<String>> {
        let mut remembered: Vec<String> = Vec::new();
        for uri in uris {
            let (path, _) = request::split_line_suffix(uri);
            let files = self
                .services
                .prefs
                .get_strings(&[SESSIONS_SCOPE, path, OPENED_FILES])
                .unwrap_or_default();
            for file in files {
                if !uris.contains(&file) && !remembered.contains(&file) {
                    remembered.push(file);
                }
            }
        }

        if remembered.is_empty() {
            return Some(uris.to_vec());
        }

        let message = format!(
            "{} file(s) were open the last time this was used. Reopen them too?",
            remembered.len()
        );
        match self.services.dialogs.yes_no_cancel("Reopen Files", &message) {
            Answer::Yes => Some(uris.iter().cloned().chain(remembered).collect()),
            Answer::No => Some(uris.to_vec()),
            Answer::Cancel => None,
        }
    }

    /// Asks for files, starting in the directory of the current view.
    pub fn open_file_picker(&self, view_type: Option<ViewType>) {
        let default_dir = self
            .services
            .views
            .current_view()
            .and_then(|view| parent_dir(&view.uri));
        let files = self.services.dialogs.pick_files("Open File", default_dir.as_deref());
        if files.is_empty() {
            log::debug!("File picker closed without a selection");
            return;
        }
        self.open_multiple(&files, view_type, false);
    }
}

fn prune_on_failure(prefs: Arc<dyn Preferences>, uri: String) -> OpenCallback {
    Box::new(move |view| {
        if view.is_some() {
            return;
        }
        let path = [MRU_SCOPE, MRU_FILES];
        let Some(mut files) = prefs.get_strings(&path) else {
            return;
        };
        let before = files.len();
        files.retain(|f| f != &uri);
        if files.len() != before {
            log::info!("Removing stale recent file {}", uri);
            prefs.set(&path, serde_json::json!(files));
        }
    })
}

fn parent_dir(uri: &str) -> Option<String> {
    let (dir, _) = uri.rsplit_once(|c| c == '/' || c == '\\')?;
    if dir.is_empty() {
        return None;
    }
    Some(dir.to_string())
}
