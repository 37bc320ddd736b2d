use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static VIEW_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?s)(.*)\?view=(editor|browser|diff)$").expect("view hint pattern"));

static LINE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?s)(.+?)(#|%23|:)(\d+)$").expect("line suffix pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewType {
    Editor,
    Browser,
    Diff,
}

impl ViewType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "editor" => Some(ViewType::Editor),
            "browser" => Some(ViewType::Browser),
            "diff" => Some(ViewType::Diff),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewType::Editor => "editor",
            ViewType::Browser => "browser",
            ViewType::Diff => "diff",
        }
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub uri: String,
    pub line: Option<u32>,
    pub view_type: Option<ViewType>,
    pub skip_prompt: bool,
}

impl OpenRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            line: None,
            view_type: None,
            skip_prompt: false,
        }
    }

    pub fn line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn view_type(mut self, view_type: ViewType) -> Self {
        self.view_type = Some(view_type);
        self
    }

    pub fn maybe_view_type(mut self, view_type: Option<ViewType>) -> Self {
        self.view_type = view_type;
        self
    }

    pub fn skip_prompt(mut self, skip: bool) -> Self {
        self.skip_prompt = skip;
        self
    }

    /// Strips embedded view-type and line suffixes and settles the view type.
    ///
    /// An explicit line or view type always wins over an embedded one.
    pub fn resolve(&self, preview_extensions: &[String]) -> ResolvedRequest {
        let (rest, embedded_view) = split_view_hint(&self.uri);
        let (path, embedded_line) = split_line_suffix(rest);

        let extension = extension_of(path);
        let hinted = self.view_type.or(embedded_view);
        let view_type = match (hinted, &extension) {
            (Some(view_type), _) => view_type,
            (None, Some(ext)) if preview_extensions.iter().any(|p| p.eq_ignore_ascii_case(ext)) => {
                ViewType::Browser
            }
            _ => ViewType::Editor,
        };

        ResolvedRequest {
            uri: path.to_string(),
            line: self.line.or(embedded_line),
            view_type,
            extension,
            skip_prompt: self.skip_prompt,
        }
    }
}

impl From<&str> for OpenRequest {
    fn from(uri: &str) -> Self {
        OpenRequest::new(uri)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub uri: String,
    pub line: Option<u32>,
    pub view_type: ViewType,
    pub extension: Option<String>,
    pub skip_prompt: bool,
}

fn split_view_hint(uri: &str) -> (&str, Option<ViewType>) {
    match VIEW_HINT.captures(uri) {
        Some(caps) => {
            let head = caps.get(1).map_or("", |m| m.as_str());
            let view_type = caps.get(2).and_then(|m| ViewType::parse(m.as_str()));
            (head, view_type)
        }
        None => (uri, None),
    }
}

/// Splits `file.txt:42`, `file.txt#42` or `file.txt%2342` into path and line.
pub fn split_line_suffix(uri: &str) -> (&str, Option<u32>) {
    let Some(caps) = LINE_SUFFIX.captures(uri) else {
        return (uri, None);
    };
    let (Some(head), Some(sep), Some(digits)) = (caps.get(1), caps.get(2), caps.get(3)) else {
        return (uri, None);
    };
    let head = head.as_str();

    if sep.as_str() == ":" && is_bare_authority(head) {
        return (uri, None);
    }

    match digits.as_str().parse::<u32>() {
        Ok(line) => (head, Some(line)),
        Err(_) => (uri, None),
    }
}

// `http://host:8080` carries a port, not a line.
fn is_bare_authority(head: &str) -> bool {
    match head.find("://") {
        Some(idx) => !head[idx + 3..].contains('/'),
        None => false,
    }
}

/// Lower-cased extension of the last path segment, ignoring any query.
pub fn extension_of(uri: &str) -> Option<String> {
    let path = uri.split('?').next().unwrap_or(uri);
    let name = path.rsplit(|c| c == '/' || c == '\\').next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// How already-open documents are compared against a requested URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseRule {
    Sensitive,
    Insensitive,
}

impl CaseRule {
    /// Case-insensitive on Windows and macOS file systems.
    pub fn platform_default() -> Self {
        if cfg!(any(target_os = "windows", target_os = "macos")) {
            CaseRule::Insensitive
        } else {
            CaseRule::Sensitive
        }
    }

    pub fn same(&self, a: &str, b: &str) -> bool {
        match self {
            CaseRule::Sensitive => a == b,
            CaseRule::Insensitive => a.to_lowercase() == b.to_lowercase(),
        }
    }
}
