//! Route table and the request dispatcher.
//!
//! The first path segment names a controller. Routes are scanned in
//! registration order and the first whose name matches (ignoring ASCII case)
//! wins. No radix tree, no hashing: duplicate names are a legal, order-decided
//! tie-break.
//!
//! ```text
//! GET /Test/Show/7?tab=2
//!      │    │    └── parameters: ["7"]
//!      │    └─────── action (resolved by the controller)
//!      └──────────── controller (resolved here)
//! ```
//!
//! Every request ends in exactly one written result. The fallback chain is:
//! matched action → static file → the controller's not-found result →
//! (no controller at all) the default controller's not-found result → 500.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{debug, error, info_span, trace};

use crate::config::Config;
use crate::controller::{Binding, Controller};
use crate::cookie::Cookie;
use crate::error::Error;
use crate::request::{ParsedUrl, Request};
use crate::result::{self, ActionResult, BufferedResponse, ResponseSink};
use crate::session_store::SessionStore;
use crate::static_files::StaticFiles;
use crate::view::ViewRenderer;

/// Builds the controller for one request.
pub type ControllerFactory = Arc<dyn Fn(Request) -> Controller + Send + Sync + 'static>;

struct RouteMap {
    controller_name: String,
    factory: ControllerFactory,
}

/// The application router.
///
/// Build it once at startup; it is read-only afterwards and is shared by
/// every request. Each builder call returns `self` so registrations chain.
///
/// ```rust
/// use mvcapp::{Controller, Method, Request, Router};
///
/// let app = Router::new()
///     .with_sessions()
///     .controller("Home", |req| {
///         let mut c = Controller::new(req);
///         c.get("Index", |c, _| Some(c.text("home")));
///         c
///     });
///
/// let res = app.dispatch(Request::new(Method::Get, "/"));
/// assert_eq!(res.status(), 200);
/// assert_eq!(res.body_text(), "home");
/// ```
pub struct Router {
    routes: Vec<RouteMap>,
    config: Config,
    sessions: Option<Arc<SessionStore>>,
    static_files: StaticFiles,
    renderer: Option<Arc<dyn ViewRenderer>>,
}

impl Router {
    pub fn new() -> Self {
        let config = Config::default();
        Self {
            routes: Vec::new(),
            static_files: StaticFiles::new(&config.root, config.denied_prefixes.clone()),
            config,
            sessions: None,
            renderer: None,
        }
    }

    /// Replaces the configuration. Call before [`Router::with_sessions`] so
    /// the store picks up the configured timeout.
    pub fn config(mut self, config: Config) -> Self {
        self.static_files = StaticFiles::new(&config.root, config.denied_prefixes.clone());
        self.config = config;
        self
    }

    /// Registers a controller factory under `name`.
    pub fn controller(
        mut self,
        name: &str,
        factory: impl Fn(Request) -> Controller + Send + Sync + 'static,
    ) -> Self {
        self.routes.push(RouteMap {
            controller_name: name.to_owned(),
            factory: Arc::new(factory),
        });
        self
    }

    /// Enables sessions with a fresh store using the configured timeout.
    pub fn with_sessions(self) -> Self {
        let store = SessionStore::new(self.config.session_timeout());
        self.sessions(Arc::new(store))
    }

    /// Enables sessions backed by `store`.
    pub fn sessions(mut self, store: Arc<SessionStore>) -> Self {
        self.sessions = Some(store);
        self
    }

    pub fn renderer(mut self, renderer: impl ViewRenderer) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn settings(&self) -> &Config {
        &self.config
    }

    pub fn session_store(&self) -> Option<&Arc<SessionStore>> {
        self.sessions.as_ref()
    }

    fn lookup(&self, controller_name: &str) -> Option<&RouteMap> {
        self.routes
            .iter()
            .find(|route| route.controller_name.eq_ignore_ascii_case(controller_name))
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Runs the full pipeline for one request and returns the written response.
    ///
    /// Never panics on behalf of application code: panics in factories, hooks,
    /// or handlers are caught and answered with a 500.
    pub fn dispatch(&self, request: Request) -> BufferedResponse {
        let span = info_span!("request", method = %request.method(), path = request.path());
        let _guard = span.enter();

        let mut sink = BufferedResponse::new();
        let url = request.url().clone();
        let (segment, rest) = split_controller(&url.path);

        let named = if segment.is_empty() {
            self.config.default_controller.as_str()
        } else {
            segment
        };

        match self.lookup(named) {
            Some(route) => {
                trace!(controller = %route.controller_name, "route matched");
                self.serve(route, request, &url, rest, true, &mut sink);
            }
            None => {
                debug!(controller = named, "no controller matched");
                if let Some(file) = self.static_files.serve(&url.path) {
                    write_or_log(file, &mut sink);
                } else if let Some(route) = self.lookup(&self.config.default_controller) {
                    let path = url.path.clone();
                    self.serve(route, request, &url, path, false, &mut sink);
                } else {
                    let err = Error::NoDefaultController(self.config.default_controller.clone());
                    critical(&err, &mut sink);
                }
            }
        }
        sink
    }

    /// Instantiates the route's controller and runs its lifecycle. With
    /// `execute == false` the action step is skipped and the request goes
    /// straight to the not-found result.
    fn serve(
        &self,
        route: &RouteMap,
        request: Request,
        url: &ParsedUrl,
        requested_path: String,
        execute: bool,
        sink: &mut BufferedResponse,
    ) {
        let built = catch_unwind(AssertUnwindSafe(|| {
            self.instantiate(route, request, url, requested_path)
        }));
        let mut controller = match built {
            Ok(controller) => controller,
            Err(payload) => return critical(&Error::from_panic(payload), sink),
        };

        let executed = guarded(&mut controller, |c| {
            c.run_before_execute();
            if execute && c.continues() { c.execute() } else { None }
        });

        let result = match executed {
            Ok(Some(result)) if !result.is_empty() => result,
            Ok(_) => self.fallback(&mut controller),
            Err(err) => failure(&mut controller, &err),
        };

        if let Err(err) = guarded(&mut controller, Controller::run_after_execute) {
            error!("after_execute hook failed: {err}");
        }

        controller.write_response(result, sink);
    }

    fn instantiate(
        &self,
        route: &RouteMap,
        request: Request,
        url: &ParsedUrl,
        requested_path: String,
    ) -> Controller {
        let mut controller = (route.factory)(request);
        controller.bind(Binding {
            name: &route.controller_name,
            url,
            requested_path,
            default_action: &self.config.default_action,
            root: self.config.root.clone(),
            renderer: self.renderer.clone(),
        });

        if let Some(store) = &self.sessions {
            let cookie_name = &self.config.session_cookie;
            let presented = controller.request().get_cookie(cookie_name).map(|c| c.value.clone());
            let session = store.acquire(presented.as_deref());
            let id = session.lock().id().to_owned();
            controller.attach_session(session);
            controller.set_cookie(Cookie::new(cookie_name, id).path("/").http_only());
        }
        controller
    }

    /// No usable result: try a static file, then the not-found result.
    fn fallback(&self, controller: &mut Controller) -> ActionResult {
        if let Some(file) = self.static_files.serve(controller.request().path()) {
            return file;
        }
        match guarded(controller, Controller::not_found) {
            Ok(result) => result,
            Err(err) => failure(controller, &err),
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// `/Test/Index/7` → (`"Test"`, `"/Index/7"`); `/` → (`""`, `""`).
fn split_controller(path: &str) -> (&str, String) {
    let trimmed = path.trim_start_matches('/');
    match trimmed.split_once('/') {
        Some((segment, rest)) => (segment, format!("/{rest}")),
        None => (trimmed, String::new()),
    }
}

/// Runs one lifecycle step, turning a panic into an [`Error`].
fn guarded<T>(
    controller: &mut Controller,
    step: impl FnOnce(&mut Controller) -> T,
) -> Result<T, Error> {
    catch_unwind(AssertUnwindSafe(|| step(controller))).map_err(Error::from_panic)
}

/// The controller's error result, or the default page if that fails too.
fn failure(controller: &mut Controller, err: &Error) -> ActionResult {
    guarded(controller, |c| c.error(err)).unwrap_or_else(|second| {
        error!("error hook failed: {second}");
        controller.attach_cookies(result::error_page(err.summary()))
    })
}

/// No controller can answer at all.
fn critical(err: &Error, sink: &mut BufferedResponse) {
    error!("critical dispatch failure: {err}");
    write_or_log(result::error_page(err.summary()), sink);
}

fn write_or_log(result: ActionResult, sink: &mut dyn ResponseSink) {
    if let Err(e) = result.execute(sink) {
        error!("failed to write response: {e}");
    }
}
