//! Unified error type.

/// Boxed error produced by external collaborators such as a view renderer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by mvcapp's fallible operations.
///
/// Application-level outcomes (404, 500, redirects) are expressed as
/// [`ActionResult`](crate::ActionResult) values, not as `Error`s. This type
/// surfaces infrastructure failures. When one happens inside a request it is
/// handed to the controller's error hook, which turns it into a result.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Status or headers were changed after the body was written.
    #[error("response already committed")]
    ResponseCommitted,

    #[error("render: {0}")]
    Render(#[source] BoxError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no view renderer configured")]
    MissingRenderer,

    #[error("no template could be resolved from {0:?}")]
    NoTemplates(Vec<String>),

    #[error("handler panicked: {0}")]
    HandlerPanicked(String),

    #[error("default controller `{0}` is not registered")]
    NoDefaultController(String),
}

impl Error {
    /// A short, client-safe description of the failure category.
    ///
    /// Error pages show this instead of the full message, which may carry
    /// paths or other internal detail.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Io(_) => "I/O failure",
            Self::ResponseCommitted => "response already sent",
            Self::Render(_) | Self::MissingRenderer | Self::NoTemplates(_) => {
                "view rendering failed"
            }
            Self::Json(_) => "encoding failed",
            Self::HandlerPanicked(_) => "request handler failed",
            Self::NoDefaultController(_) => "no controller available",
        }
    }

    /// Builds an [`Error::HandlerPanicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_owned());
        Self::HandlerPanicked(message)
    }
}
