use super::request::ResolvedRequest;
use crate::config::OpenConfig;
use crate::services::ImportKind;
use std::fmt;

pub struct OpenRoute {
    pub pattern: OpenPattern,
    pub target: OpenTarget,
}

pub enum OpenPattern {
    Extensions(Vec<String>),
    Predicate(Box<dyn Fn(&ResolvedRequest) -> bool + Send + Sync>),
}

impl OpenPattern {
    pub fn extensions(exts: &[String]) -> Self {
        OpenPattern::Extensions(exts.iter().map(|e| e.trim_start_matches('.').to_ascii_lowercase()).collect())
    }

    pub fn matches(&self, request: &ResolvedRequest) -> bool {
        match self {
            OpenPattern::Extensions(exts) => request
                .extension
                .as_ref()
                .is_some_and(|ext| exts.iter().any(|e| e == ext)),
            OpenPattern::Predicate(f) => f(request),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenTarget {
    Project,
    Addon,
    Toolbox,
    Database,
    Import(ImportKind),
    Document,
}

impl fmt::Display for OpenTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenTarget::Project => f.write_str("project"),
            OpenTarget::Addon => f.write_str("add-on"),
            OpenTarget::Toolbox => f.write_str("toolbox package"),
            OpenTarget::Database => f.write_str("database"),
            OpenTarget::Import(kind) => write!(f, "{} import", kind),
            OpenTarget::Document => f.write_str("document"),
        }
    }
}

/// Ordered dispatch table. The first matching route wins; nothing matching
/// means the target is opened as a document.
pub struct OpenRouter {
    routes: Vec<OpenRoute>,
}

impl OpenRouter {
    pub fn new(routes: Vec<OpenRoute>) -> Self {
        Self { routes }
    }

    /// Builds the standard priority order from the configured extension tables.
    /// The database route exists only when an explorer is available.
    pub fn from_config(config: &OpenConfig, database_extensions: Option<Vec<String>>) -> Self {
        let mut routes = vec![
            OpenRoute {
                pattern: OpenPattern::extensions(&config.project_extensions),
                target: OpenTarget::Project,
            },
            OpenRoute {
                pattern: OpenPattern::extensions(&config.addon_extensions),
                target: OpenTarget::Addon,
            },
            OpenRoute {
                pattern: OpenPattern::extensions(&config.toolbox_extensions),
                target: OpenTarget::Toolbox,
            },
        ];

        if let Some(exts) = database_extensions {
            routes.push(OpenRoute {
                pattern: OpenPattern::extensions(&exts),
                target: OpenTarget::Database,
            });
        }

        routes.extend([
            OpenRoute {
                pattern: OpenPattern::extensions(&config.scheme_extensions),
                target: OpenTarget::Import(ImportKind::ColorScheme),
            },
            OpenRoute {
                pattern: OpenPattern::extensions(&config.snippet_extensions),
                target: OpenTarget::Import(ImportKind::Snippet),
            },
            OpenRoute {
                pattern: OpenPattern::extensions(&config.tool_extensions),
                target: OpenTarget::Import(ImportKind::Tool),
            },
        ]);

        Self::new(routes)
    }

    pub fn route(&self, request: &ResolvedRequest) -> OpenTarget {
        for route in &self.routes {
            if route.pattern.matches(request) {
                log::debug!("{} routed to {}", request.uri, route.target);
                return route.target;
            }
        }
        OpenTarget::Document
    }

    pub fn targets(&self) -> Vec<OpenTarget> {
        self.routes.iter().map(|r| r.target).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open::request::OpenRequest;

    fn resolve(uri: &str) -> ResolvedRequest {
        OpenRequest::new(uri).resolve(&[])
    }

    #[test]
    fn default_table_routes_by_extension() {
        // Arrange
        let router = OpenRouter::from_config(&OpenConfig::default(), Some(vec!["sqlite".into()]));
        let cases = [
            ("/p/app.komodoproject", OpenTarget::Project),
            ("/p/old.KPF", OpenTarget::Project),
            ("/dl/theme.xpi", OpenTarget::Addon),
            ("/dl/tools.kpz", OpenTarget::Toolbox),
            ("/data/app.sqlite", OpenTarget::Database),
            ("/s/Dark.ksf", OpenTarget::Import(ImportKind::ColorScheme)),
            ("/s/log.kksnippet", OpenTarget::Import(ImportKind::Snippet)),
            ("/s/build.komodotool", OpenTarget::Import(ImportKind::Tool)),
            ("/src/main.rs", OpenTarget::Document),
            ("/src/Makefile", OpenTarget::Document),
            ("/p/app.komodoproject:12", OpenTarget::Project),
        ];

        for (uri, expected) in cases {
            // Act
            let target = router.route(&resolve(uri));

            // Assert
            assert_eq!(target, expected, "uri: {}", uri);
        }
    }

    #[test]
    fn database_route_absent_without_explorer() {
        let router = OpenRouter::from_config(&OpenConfig::default(), None);

        assert_eq!(router.route(&resolve("/data/app.sqlite")), OpenTarget::Document);
        assert!(!router.targets().contains(&OpenTarget::Database));
    }

    #[test]
    fn database_route_precedes_imports() {
        let router = OpenRouter::from_config(&OpenConfig::default(), Some(vec![]));
        let targets = router.targets();

        let db = targets.iter().position(|t| *t == OpenTarget::Database).unwrap();
        let scheme = targets
            .iter()
            .position(|t| *t == OpenTarget::Import(ImportKind::ColorScheme))
            .unwrap();
        assert!(db < scheme);
        assert_eq!(targets[0], OpenTarget::Project);
    }

    #[test]
    fn first_matching_route_wins() {
        let router = OpenRouter::new(vec![
            OpenRoute {
                pattern: OpenPattern::Predicate(Box::new(|r| r.uri.starts_with("/vendor/"))),
                target: OpenTarget::Document,
            },
            OpenRoute {
                pattern: OpenPattern::extensions(&["kpz".to_string()]),
                target: OpenTarget::Toolbox,
            },
        ]);

        assert_eq!(router.route(&resolve("/vendor/pkg.kpz")), OpenTarget::Document);
        assert_eq!(router.route(&resolve("/home/pkg.kpz")), OpenTarget::Toolbox);
    }

    #[test]
    fn extensions_pattern_normalizes_configured_values() {
        let pattern = OpenPattern::extensions(&[".KSF".to_string()]);

        assert!(pattern.matches(&resolve("x.ksf")));
        assert!(!pattern.matches(&resolve("ksf")));
    }
}
