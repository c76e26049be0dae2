//! Static-file fallback.
//!
//! When no controller produces a result, the request path is mapped onto the
//! application root and, if a plain file lives there, it is served verbatim.
//! Source directories (controllers, models, email templates, views) share that
//! root and are never served.

use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::result::{ActionResult, ContentType};

/// Directories that are never served as raw files.
pub const DEFAULT_DENIED_PREFIXES: [&str; 4] = ["controllers", "models", "emails", "views"];

#[derive(Clone, Debug)]
pub struct StaticFiles {
    root: PathBuf,
    denied: Vec<String>,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, denied: Vec<String>) -> Self {
        Self { root: root.into(), denied }
    }

    /// `true` when the first directory `url_path` resolves into is on the
    /// deny-list. `.` segments are skipped first, so `/./views/x` is denied
    /// just like `/views/x`.
    pub fn is_denied(&self, url_path: &str) -> bool {
        let Some(segments) = normal_segments(url_path) else {
            return false;
        };
        let Some(first) = segments.first().and_then(|s| s.to_str()) else {
            return false;
        };
        self.denied.iter().any(|d| d.eq_ignore_ascii_case(first))
    }

    /// Maps a URL path below the root. Anything that would climb out of it
    /// (`..`, absolute components) maps nowhere.
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        path.extend(normal_segments(url_path)?);
        Some(path)
    }

    /// Serves the file at `url_path`, or returns `None` when it is denied,
    /// missing, a directory, or unreadable.
    pub fn serve(&self, url_path: &str) -> Option<ActionResult> {
        let path = self.map_path(url_path)?;
        if self.is_denied(url_path) {
            warn!(path = url_path, "refusing to serve file from a denied directory");
            return None;
        }
        if !path.is_file() {
            return None;
        }
        let body = match fs::read(&path) {
            Ok(body) => body,
            Err(e) => {
                warn!(path = %path.display(), "static file unreadable: {e}");
                return None;
            }
        };
        let content_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(ContentType::OctetStream, ContentType::from_extension);
        debug!(path = %path.display(), bytes = body.len(), "serving static file");
        Some(ActionResult::bytes(content_type, body))
    }
}

/// The path's plain segments with `.` dropped, or `None` if any segment would
/// leave the root.
fn normal_segments(url_path: &str) -> Option<Vec<&OsStr>> {
    Path::new(url_path.trim_start_matches('/'))
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| match c {
            Component::Normal(segment) => Some(segment),
            _ => None,
        })
        .collect()
}
