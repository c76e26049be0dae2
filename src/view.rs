//! The view-rendering seam.
//!
//! mvcapp does not ship a template engine. Applications plug one in by
//! implementing [`ViewRenderer`] (minijinja, askama, handlebars, …) and
//! registering it on the router. Controllers reach it through
//! [`Controller::view`](crate::Controller::view).

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::BoxError;

/// Renders a list of template files with a data model.
pub trait ViewRenderer: Send + Sync + 'static {
    fn render(&self, templates: &[PathBuf], model: &Value) -> Result<Vec<u8>, BoxError>;
}

/// Any matching closure is a renderer.
impl<F> ViewRenderer for F
where
    F: Fn(&[PathBuf], &Value) -> Result<Vec<u8>, BoxError> + Send + Sync + 'static,
{
    fn render(&self, templates: &[PathBuf], model: &Value) -> Result<Vec<u8>, BoxError> {
        self(templates, model)
    }
}

/// Resolves template names to existing files.
///
/// Each name resolves to the first existing path of, in order:
///
/// ```text
/// template                                   (as given)
/// <root>/views/template
/// <root>/views/<controller>/template
/// <root>/views/shared/template
/// <root>/views/shared/<controller>/template
/// ```
///
/// Names that resolve nowhere are left out.
pub fn template_candidates(root: &Path, controller: &str, templates: &[&str]) -> Vec<PathBuf> {
    let views = root.join("views");
    let shared = views.join("shared");
    templates
        .iter()
        .filter(|t| !t.is_empty())
        .filter_map(|template| {
            [
                PathBuf::from(template),
                views.join(template),
                views.join(controller).join(template),
                shared.join(template),
                shared.join(controller).join(template),
            ]
            .into_iter()
            .find(|candidate| candidate.is_file())
        })
        .collect()
}
