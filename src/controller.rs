//! Per-request controller: action resolution, lifecycle hooks, cookies,
//! session access, and the result helpers handlers build responses with.
//!
//! A factory registered on the [`Router`](crate::Router) builds one
//! `Controller` per request and registers its actions on it:
//!
//! ```rust
//! use mvcapp::{Controller, Request};
//!
//! fn home(req: Request) -> Controller {
//!     let mut c = Controller::new(req);
//!     c.get("Index", |c, _params| Some(c.text("welcome")));
//!     c.get("Show", |c, params| {
//!         let id = params.first()?;
//!         Some(c.text(format!("item {id}")))
//!     });
//!     c.on_not_found(|c| c.html("<p>nothing here</p>"));
//!     c
//! }
//! ```
//!
//! The controller is discarded once its response is written.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, trace, warn};

use crate::action::{self, ActionMap};
use crate::cookie::Cookie;
use crate::error::Error;
use crate::method::Method;
use crate::request::{ParsedUrl, Request};
use crate::result::{self, ActionResult, ContentType, ResponseSink};
use crate::session::SharedSession;
use crate::status::Status;
use crate::view::{ViewRenderer, template_candidates};

/// Lifecycle callback run before or after `execute`.
pub type Hook = Arc<dyn Fn(&mut Controller) + Send + Sync + 'static>;

/// Builds the result shown when a request fails.
pub type ErrorHook = Arc<dyn Fn(&mut Controller, &Error) -> ActionResult + Send + Sync + 'static>;

/// Builds the result shown when nothing answers a request.
pub type NotFoundHook = Arc<dyn Fn(&mut Controller) -> ActionResult + Send + Sync + 'static>;

const JSON_FAILURE: &[u8] = br#"{"Success":false,"Error":"Failed to create json payload"}"#;

/// State the dispatcher hands a controller before running it.
pub(crate) struct Binding<'a> {
    pub name: &'a str,
    pub url: &'a ParsedUrl,
    pub requested_path: String,
    pub default_action: &'a str,
    pub root: PathBuf,
    pub renderer: Option<Arc<dyn ViewRenderer>>,
}

pub struct Controller {
    name: String,
    request: Request,
    session: Option<SharedSession>,
    cookies: Vec<Cookie>,
    continue_pipeline: bool,
    requested_path: String,
    query: HashMap<String, String>,
    fragment: String,
    default_action: String,
    action_routes: Vec<ActionMap>,
    before_execute: Option<Hook>,
    after_execute: Option<Hook>,
    error_result: Option<ErrorHook>,
    not_found_result: Option<NotFoundHook>,
    root: PathBuf,
    renderer: Option<Arc<dyn ViewRenderer>>,
}

impl Controller {
    /// A controller for `request` with no actions or hooks.
    ///
    /// Path, query, and fragment come from the request until the dispatcher
    /// binds the controller to a route.
    pub fn new(request: Request) -> Self {
        let url = request.url().clone();
        Self {
            name: String::new(),
            session: None,
            cookies: Vec::new(),
            continue_pipeline: true,
            requested_path: url.path,
            query: url.query,
            fragment: url.fragment,
            default_action: "Index".to_owned(),
            action_routes: Vec::new(),
            before_execute: None,
            after_execute: None,
            error_result: None,
            not_found_result: None,
            root: PathBuf::from("."),
            renderer: None,
            request,
        }
    }

    pub(crate) fn bind(&mut self, binding: Binding<'_>) {
        self.name = binding.name.to_owned();
        self.requested_path = binding.requested_path;
        self.query = binding.url.query.clone();
        self.fragment = binding.url.fragment.clone();
        self.default_action = binding.default_action.to_owned();
        self.root = binding.root;
        self.renderer = binding.renderer;
    }

    pub(crate) fn attach_session(&mut self, session: SharedSession) {
        self.session = Some(session);
    }

    // ── Registration ──────────────────────────────────────────────────────────

    /// Maps `verb` + `name` to `handler`. `None` accepts any verb.
    /// When several maps could serve a request, the first registered wins.
    pub fn register_action<F>(&mut self, verb: Option<Method>, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Controller, &[String]) -> Option<ActionResult> + Send + Sync + 'static,
    {
        self.add_action(ActionMap::new(verb, name, handler))
    }

    pub fn add_action(&mut self, map: ActionMap) -> &mut Self {
        self.action_routes.push(map);
        self
    }

    pub fn any<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Controller, &[String]) -> Option<ActionResult> + Send + Sync + 'static,
    {
        self.register_action(None, name, handler)
    }

    pub fn get<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Controller, &[String]) -> Option<ActionResult> + Send + Sync + 'static,
    {
        self.register_action(Some(Method::Get), name, handler)
    }

    pub fn post<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Controller, &[String]) -> Option<ActionResult> + Send + Sync + 'static,
    {
        self.register_action(Some(Method::Post), name, handler)
    }

    pub fn put<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Controller, &[String]) -> Option<ActionResult> + Send + Sync + 'static,
    {
        self.register_action(Some(Method::Put), name, handler)
    }

    pub fn delete<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Controller, &[String]) -> Option<ActionResult> + Send + Sync + 'static,
    {
        self.register_action(Some(Method::Delete), name, handler)
    }

    pub fn on_before_execute(
        &mut self,
        hook: impl Fn(&mut Controller) + Send + Sync + 'static,
    ) -> &mut Self {
        self.before_execute = Some(Arc::new(hook));
        self
    }

    pub fn on_after_execute(
        &mut self,
        hook: impl Fn(&mut Controller) + Send + Sync + 'static,
    ) -> &mut Self {
        self.after_execute = Some(Arc::new(hook));
        self
    }

    pub fn on_error(
        &mut self,
        hook: impl Fn(&mut Controller, &Error) -> ActionResult + Send + Sync + 'static,
    ) -> &mut Self {
        self.error_result = Some(Arc::new(hook));
        self
    }

    pub fn on_not_found(
        &mut self,
        hook: impl Fn(&mut Controller) -> ActionResult + Send + Sync + 'static,
    ) -> &mut Self {
        self.not_found_result = Some(Arc::new(hook));
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// The route name this controller was dispatched under.
    pub fn name(&self) -> &str { &self.name }
    pub fn request(&self) -> &Request { &self.request }
    pub fn request_mut(&mut self) -> &mut Request { &mut self.request }
    /// The path after the controller segment, e.g. `/Index/7`.
    pub fn requested_path(&self) -> &str { &self.requested_path }
    pub fn query(&self) -> &HashMap<String, String> { &self.query }
    pub fn fragment(&self) -> &str { &self.fragment }
    pub fn default_action(&self) -> &str { &self.default_action }
    pub fn actions(&self) -> &[ActionMap] { &self.action_routes }

    /// `false` once a hook has called [`Controller::stop_pipeline`].
    pub fn continues(&self) -> bool { self.continue_pipeline }

    /// Skips `execute` for this request. Meant for `before_execute` hooks.
    pub fn stop_pipeline(&mut self) {
        self.continue_pipeline = false;
    }

    // ── Session ───────────────────────────────────────────────────────────────

    /// The visitor's session. `None` when the router has no session store.
    pub fn session(&self) -> Option<&SharedSession> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.lock().id().to_owned())
    }

    pub fn session_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.session.as_ref()?.lock().get_as(key)
    }

    /// Stores a session value. Returns `false` when there is no session.
    pub fn set_session_value(&self, key: &str, value: impl Into<Value>) -> bool {
        match &self.session {
            Some(session) => {
                session.lock().set(key, value);
                true
            }
            None => false,
        }
    }

    // ── Cookies ───────────────────────────────────────────────────────────────

    /// Looks a cookie up among the queued outbound cookies, then the
    /// request's cookies.
    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.request.get_cookie(name))
    }

    /// Queues a cookie for the response, replacing one with the same name.
    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.cookies.retain(|c| c.name != cookie.name);
        self.cookies.push(cookie);
    }

    /// Queues an expired copy of the named cookie so the browser discards it.
    pub fn delete_cookie(&mut self, name: &str) {
        let mut cookie = self
            .cookie(name)
            .cloned()
            .unwrap_or_else(|| Cookie::new(name, ""));
        cookie.value.clear();
        cookie.expires = DateTime::<Utc>::from_timestamp(0, 0);
        cookie.max_age = Some(0);
        self.set_cookie(cookie);
    }

    /// The cookies queued for the response.
    pub fn outbound_cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Puts the queued cookies on `result`. Cookies the result already carries
    /// win over queued cookies of the same name.
    pub fn attach_cookies(&self, mut result: ActionResult) -> ActionResult {
        let own = std::mem::take(&mut result.cookies);
        for cookie in self.cookies.iter().cloned().chain(own) {
            result.add_cookie(cookie);
        }
        result
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Splits the requested path into the action name and its parameters.
    ///
    /// `/Show/7/edit` → `("Show", ["7", "edit"])`; an empty path selects the
    /// default action. Empty and repeated segments are kept.
    pub fn action_and_params(&self) -> (String, Vec<String>) {
        let path = self.requested_path.strip_prefix('/').unwrap_or(&self.requested_path);
        if path.is_empty() {
            return (self.default_action.clone(), Vec::new());
        }
        let mut segments = path.split('/').map(str::to_owned);
        let action = segments.next().unwrap_or_default();
        (action, segments.collect())
    }

    /// Runs the action matching the request's verb and path.
    ///
    /// Returns `None` when no action matches or the handler produced nothing;
    /// the router then falls back to static files and the not-found result.
    pub fn execute(&mut self) -> Option<ActionResult> {
        let (action, params) = self.action_and_params();
        let verb = self.request.method();
        let Some(handler) = action::resolve(&self.action_routes, verb, &action)
            .map(|map| Arc::clone(&map.handler))
        else {
            debug!(controller = %self.name, action = %action, %verb, "no matching action");
            return None;
        };
        if verb.submits_form() {
            self.request.parse_form();
        }
        trace!(
            controller = %self.name,
            action = %action,
            params = params.len(),
            "executing action"
        );
        handler(self, &params)
    }

    pub(crate) fn run_before_execute(&mut self) {
        if let Some(hook) = self.before_execute.clone() {
            hook(self);
        }
    }

    pub(crate) fn run_after_execute(&mut self) {
        if let Some(hook) = self.after_execute.clone() {
            hook(self);
        }
    }

    /// Writes `result` with every queued cookie to `sink`.
    ///
    /// A failure here means the response is already partially sent, so it is
    /// only logged.
    pub fn write_response(&self, result: ActionResult, sink: &mut dyn ResponseSink) {
        let result = self.attach_cookies(result);
        if let Err(e) = result.execute(sink) {
            warn!(path = self.request.path(), "failed to write response: {e}");
        }
    }

    // ── Result helpers ────────────────────────────────────────────────────────

    /// `200 OK` with a raw body.
    pub fn result(&self, body: impl Into<Vec<u8>>) -> ActionResult {
        self.attach_cookies(ActionResult::new(body))
    }

    pub fn text(&self, body: impl Into<String>) -> ActionResult {
        self.attach_cookies(ActionResult::text(body))
    }

    pub fn html(&self, body: impl Into<String>) -> ActionResult {
        self.attach_cookies(ActionResult::html(body))
    }

    /// Encodes `payload` as JSON. A `null` payload or an encoding failure
    /// yields a `{"Success":false,...}` body instead.
    pub fn json<T: Serialize + ?Sized>(&self, payload: &T) -> ActionResult {
        let body = match serde_json::to_vec(payload) {
            Ok(bytes) if bytes != b"null" => bytes,
            Ok(_) => {
                warn!(path = self.request.path(), "refusing to send a null json payload");
                JSON_FAILURE.to_vec()
            }
            Err(e) => {
                error!(path = self.request.path(), "json encoding failed: {e}");
                JSON_FAILURE.to_vec()
            }
        };
        self.attach_cookies(ActionResult::json(body))
    }

    /// `302 Found` to `url`.
    pub fn redirect(&self, url: &str) -> ActionResult {
        self.attach_cookies(
            ActionResult::builder()
                .status(Status::Found)
                .header("location", url)
                .no_body(),
        )
    }

    /// A page whose script navigates the browser to `url`.
    pub fn redirect_js(&self, url: &str) -> ActionResult {
        let target: String = url
            .chars()
            .map(|c| match c {
                '\'' => "\\'".to_owned(),
                '\\' => "\\\\".to_owned(),
                '<' => "\\x3c".to_owned(),
                c => c.to_string(),
            })
            .collect();
        self.html(format!(
            "<html><head><title>Redirecting...</title></head><body>\
             <script type=\"text/javascript\">window.location.href='{target}';</script>\
             </body></html>"
        ))
    }

    /// Renders `templates` with `model` through the router's view renderer.
    /// Any failure becomes the error result.
    pub fn view<M: Serialize + ?Sized>(&mut self, templates: &[&str], model: &M) -> ActionResult {
        match self.render(templates, model) {
            Ok(body) => self.attach_cookies(ActionResult::bytes(ContentType::Html, body)),
            Err(e) => self.error(&e),
        }
    }

    /// Renders a single template without a model.
    pub fn simple_view(&mut self, template: &str) -> ActionResult {
        self.view(&[template], &Value::Null)
    }

    fn render<M: Serialize + ?Sized>(
        &self,
        templates: &[&str],
        model: &M,
    ) -> Result<Vec<u8>, Error> {
        let renderer = self.renderer.as_ref().ok_or(Error::MissingRenderer)?;
        let files = template_candidates(&self.root, &self.name, templates);
        if files.is_empty() {
            return Err(Error::NoTemplates(templates.iter().map(|t| t.to_string()).collect()));
        }
        let model = serde_json::to_value(model)?;
        renderer.render(&files, &model).map_err(Error::Render)
    }

    /// The not-found result: the `on_not_found` hook's, or the default page
    /// naming the request path.
    pub fn not_found(&mut self) -> ActionResult {
        warn!(path = self.request.path(), "content not found");
        let result = match self.not_found_result.clone() {
            Some(hook) => hook(self),
            None => result::not_found_page(self.request.path()),
        };
        self.attach_cookies(result)
    }

    /// The error result for `err`: the `on_error` hook's, or the default page
    /// showing only a short summary. The full error is logged.
    pub fn error(&mut self, err: &Error) -> ActionResult {
        error!(controller = %self.name, path = self.request.path(), "request failed: {err}");
        let result = match self.error_result.clone() {
            Some(hook) => hook(self, err),
            None => result::error_page(err.summary()),
        };
        self.attach_cookies(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::result::BufferedResponse;
    use crate::session::Session;
    use std::path::Path;

    fn test_controller(method: Method, target: &str) -> Controller {
        let mut c = Controller::new(Request::new(method, target));
        c.any("Index", |c, _| Some(c.result(b"test".to_vec())));
        c.on_not_found(|c| c.result(b"Not Found".to_vec()));
        c.on_error(|c, _| c.result(b"Error Page".to_vec()));
        c
    }

    /// Binds like the router would for `/Test<rest>`.
    fn bind_under_test(c: &mut Controller, rest: &str, root: &Path) {
        let url = c.request().url().clone();
        c.bind(Binding {
            name: "Test",
            url: &url,
            requested_path: rest.to_owned(),
            default_action: "Index",
            root: root.to_path_buf(),
            renderer: None,
        });
    }

    #[test]
    fn executes_the_named_action() {
        let mut c = test_controller(Method::Get, "/test/index");
        bind_under_test(&mut c, "/index", Path::new("."));
        assert_eq!(c.execute().unwrap().body(), b"test");
    }

    #[test]
    fn empty_path_runs_the_default_action() {
        let mut c = test_controller(Method::Get, "/test");
        bind_under_test(&mut c, "", Path::new("."));
        assert_eq!(c.action_and_params(), ("Index".to_owned(), vec![]));
        assert_eq!(c.execute().unwrap().body(), b"test");
    }

    #[test]
    fn trailing_segments_become_parameters() {
        let mut c = Controller::new(Request::new(Method::Post, "/test/echo/with//with"));
        c.post("Echo", |c, params| Some(c.text(params.join(","))));
        bind_under_test(&mut c, "/echo/with//with", Path::new("."));
        assert_eq!(c.action_and_params().1, ["with", "", "with"]);
        assert_eq!(c.execute().unwrap().body(), b"with,,with");
    }

    #[test]
    fn unknown_action_or_wrong_verb_yields_nothing() {
        let mut c = test_controller(Method::Get, "/test/notfound");
        bind_under_test(&mut c, "/notfound", Path::new("."));
        assert!(c.execute().is_none());

        let mut c = Controller::new(Request::new(Method::Get, "/test/save"));
        c.post("Save", |c, _| Some(c.text("saved")));
        bind_under_test(&mut c, "/save", Path::new("."));
        assert!(c.execute().is_none());
    }

    #[test]
    fn form_fields_are_parsed_before_post_handlers() {
        let req = Request::new(Method::Post, "/test/save")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("name=alice");
        let mut c = Controller::new(req);
        c.post("Save", |c, _| Some(c.text(c.request().form_value("name")?.to_owned())));
        bind_under_test(&mut c, "/save", Path::new("."));
        assert_eq!(c.execute().unwrap().body(), b"alice");
    }

    #[test]
    fn default_not_found_names_the_path() {
        let mut c = Controller::new(Request::new(Method::Get, "/Test/NoSuchAction"));
        let result = c.not_found();
        assert_eq!(result.status_code(), 404);
        let body = String::from_utf8_lossy(result.body()).into_owned();
        assert!(body.contains("Content Missing"));
        assert!(body.contains("/Test/NoSuchAction"));
    }

    #[test]
    fn cookies_get_set_delete() {
        let req = Request::new(Method::Get, "/").cookie("TestCookie", "Inbound");
        let mut c = Controller::new(req);
        assert_eq!(c.cookie("TestCookie").map(|c| c.value.as_str()), Some("Inbound"));
        assert!(c.cookie("FailMe!").is_none());

        c.set_cookie(Cookie::new("TestCookie", "TestValue"));
        c.set_cookie(Cookie::new("TestCookie", "TestValue"));
        assert_eq!(c.outbound_cookies().len(), 1);
        assert_eq!(c.cookie("TestCookie").map(|c| c.value.as_str()), Some("TestValue"));

        c.delete_cookie("TestCookie");
        let deleted = c.cookie("TestCookie").unwrap();
        assert!(deleted.expires.unwrap() < Utc::now());
        assert_eq!(deleted.max_age, Some(0));
    }

    #[test]
    fn helpers_carry_queued_cookies() {
        let mut c = Controller::new(Request::new(Method::Get, "/"));
        c.set_cookie(Cookie::new("SessionID", "abc"));
        assert_eq!(c.result(b"x".to_vec()).cookies().len(), 1);
        assert_eq!(c.not_found().cookies()[0].name, "SessionID");
        assert_eq!(c.error(&Error::MissingRenderer).cookies()[0].name, "SessionID");
    }

    #[test]
    fn attach_cookies_lets_result_cookies_win() {
        let mut c = Controller::new(Request::new(Method::Get, "/"));
        c.set_cookie(Cookie::new("a", "queued"));
        c.set_cookie(Cookie::new("b", "queued"));
        let mut result = ActionResult::text("x");
        result.add_cookie(Cookie::new("a", "own"));

        let merged = c.attach_cookies(c.attach_cookies(result));
        let pairs: Vec<_> = merged
            .cookies()
            .iter()
            .map(|c| (c.name.as_str(), c.value.as_str()))
            .collect();
        assert_eq!(pairs, [("b", "queued"), ("a", "own")]);
    }

    #[test]
    fn write_response_includes_cookies() {
        let mut c = test_controller(Method::Get, "/test/index");
        c.set_cookie(Cookie::new("Dan", "is awesome!").max_age(900));
        let mut sink = BufferedResponse::new();
        c.write_response(c.result(b"test".to_vec()), &mut sink);
        assert_eq!(sink.body_text(), "test");
        assert_eq!(sink.set_cookies(), ["Dan=is awesome!; Max-Age=900"]);
    }

    #[test]
    fn json_results() {
        let c = Controller::new(Request::new(Method::Get, "/"));
        let ok = c.json("Test Data");
        assert_eq!(ok.header("content-type"), Some("application/json"));
        assert_eq!(serde_json::from_slice::<String>(ok.body()).unwrap(), "Test Data");

        let failed = c.json(&Option::<String>::None);
        assert_eq!(failed.body(), JSON_FAILURE);
    }

    #[test]
    fn redirects() {
        let c = Controller::new(Request::new(Method::Get, "/"));
        let r = c.redirect("/Home/Index");
        assert_eq!(r.status_code(), 302);
        assert_eq!(r.header("location"), Some("/Home/Index"));
        assert!(!r.is_empty());

        let js = c.redirect_js("https://localhost/test/index");
        assert_eq!(
            js.body(),
            "<html><head><title>Redirecting...</title></head><body>\
             <script type=\"text/javascript\">\
             window.location.href='https://localhost/test/index';</script></body></html>"
                .as_bytes()
        );
        let hostile = c.redirect_js("x';alert(1);'</script>");
        let body = String::from_utf8_lossy(hostile.body()).into_owned();
        assert!(body.contains(r"x\';alert(1);\'\x3c/script>"));
    }

    #[test]
    fn views_render_through_the_renderer() {
        let root = tempfile::tempdir().unwrap();
        let shared = root.path().join("views").join("shared");
        std::fs::create_dir_all(&shared).unwrap();
        std::fs::write(shared.join("_test_template.htm"), "Hello {{ . }}").unwrap();

        let renderer = |files: &[PathBuf], model: &Value| -> Result<Vec<u8>, BoxError> {
            let template = std::fs::read_to_string(&files[0])?;
            let name = model.as_str().unwrap_or("Template!");
            Ok(template.replace("{{ . }}", name).into_bytes())
        };

        let mut c = test_controller(Method::Get, "/test/index");
        bind_under_test(&mut c, "/index", root.path());
        c.renderer = Some(Arc::new(renderer));

        let page = c.view(&["_test_template.htm"], "User");
        assert_eq!(page.body(), b"Hello User");
        assert_eq!(page.header("content-type"), Some("text/html; charset=utf-8"));

        assert_eq!(c.simple_view("_test_template.htm").body(), b"Hello Template!");

        // Unresolvable template → custom error page, then the default one.
        assert_eq!(c.view(&[""], "User").body(), b"Error Page");
        c.error_result = None;
        let fallback = c.view(&[""], "User");
        assert_eq!(fallback.status_code(), 500);
        assert!(!fallback.body().is_empty());
    }

    #[test]
    fn view_without_renderer_is_an_error() {
        let mut c = Controller::new(Request::new(Method::Get, "/"));
        assert_eq!(c.simple_view("index.htm").status_code(), 500);
    }

    #[test]
    fn session_helpers() {
        let mut c = Controller::new(Request::new(Method::Get, "/"));
        assert!(!c.set_session_value("SaidHello", true));
        assert_eq!(c.session_value::<bool>("SaidHello"), None);

        let session = Session::new().into_shared();
        c.attach_session(Arc::clone(&session));
        assert!(c.set_session_value("SaidHello", true));
        assert_eq!(c.session_value::<bool>("SaidHello"), Some(true));
        assert_eq!(session.lock().get_as::<bool>("SaidHello"), Some(true));
        assert_eq!(c.session_id().map(|id| id.len()), Some(32));
    }

    #[test]
    fn hooks_run_when_asked() {
        let mut c = Controller::new(Request::new(Method::Get, "/"));
        c.on_before_execute(|c| c.stop_pipeline());
        c.on_after_execute(|c| c.set_cookie(Cookie::new("after", "1")));
        assert!(c.continues());
        c.run_before_execute();
        assert!(!c.continues());
        c.run_after_execute();
        assert!(c.cookie("after").is_some());
    }
}
