//! # mvcapp
//!
//! A controller-based MVC request dispatcher with in-memory browser sessions.
//!
//! ## How a request flows
//!
//! The first path segment names a controller, the second an action, and the
//! rest are positional parameters:
//!
//! 1. The [`Router`] finds the controller registered under the first segment
//!    and builds a fresh [`Controller`] for the request.
//! 2. If sessions are enabled, the controller is bound to the caller's
//!    [`Session`] (or a new one) and the session cookie is refreshed.
//! 3. Before-hooks run, then the matched action, then after-hooks.
//! 4. An action that produces nothing falls back to a static file under the
//!    application root, then to the controller's not-found result.
//!
//! Exactly one response is written per request. Panics in application code
//! become a `500` with a generic page; details go to the log.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mvcapp::{Config, Controller, Request, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .config(Config::default())
//!         .with_sessions()
//!         .controller("Home", home);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! fn home(req: Request) -> Controller {
//!     let mut c = Controller::new(req);
//!     c.get("Index", |c, _| {
//!         let visits = c.session_value::<u64>("visits").unwrap_or(0) + 1;
//!         c.set_session_value("visits", visits);
//!         Some(c.text(format!("visit #{visits}")))
//!     });
//!     c
//! }
//! ```
//!
//! ## Testing without a socket
//!
//! [`Router::dispatch`] is synchronous and returns a [`BufferedResponse`], so
//! the whole pipeline can be driven from a plain `#[test]`:
//!
//! ```rust
//! use mvcapp::{ActionResult, Controller, Method, Request, Router, Status};
//!
//! let app = Router::new().controller("Home", |req| {
//!     let mut c = Controller::new(req);
//!     c.post("Save", |_, _| Some(ActionResult::status(Status::NoContent)));
//!     c
//! });
//!
//! let res = app.dispatch(Request::new(Method::Post, "/Home/Save"));
//! assert_eq!(res.status(), 204);
//! ```

mod action;
mod config;
mod controller;
mod cookie;
mod error;
mod method;
mod request;
mod result;
mod router;
mod server;
mod session;
mod session_store;
mod static_files;
mod status;
mod view;

pub use action::{ActionMap, ActionMethod, resolve as resolve_action};
pub use config::Config;
pub use controller::{Controller, ErrorHook, Hook, NotFoundHook};
pub use cookie::Cookie;
pub use error::{BoxError, Error};
pub use method::Method;
pub use request::{ParsedUrl, Request};
pub use result::{
    ActionResult, BufferedResponse, ContentType, ResponseSink, ResultBuilder, error_page,
    not_found_page,
};
pub use router::{ControllerFactory, Router};
pub use server::Server;
pub use session::{SESSION_ID_LEN, Session, SharedSession, generate_id};
pub use session_store::{DEFAULT_TIMEOUT, SessionStore};
pub use static_files::{DEFAULT_DENIED_PREFIXES, StaticFiles};
pub use status::Status;
pub use view::{ViewRenderer, template_candidates};
