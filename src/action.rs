//! Action maps: bind an HTTP verb and action name to a handler.
//!
//! # How handlers are stored
//!
//! A controller holds handlers of *different* closure types in one ordered
//! list, so each is erased behind `Arc<dyn Fn ...>`. The `Arc` matters at call
//! time: the controller clones the matched handler out of its own list before
//! lending itself mutably to that handler.
//!
//! ```text
//! |c: &mut Controller, params: &[String]| { … }   ← user writes this
//!        ↓ controller.get("Index", handler)
//! ActionMap { verb: Some(Get), name: "Index", handler: Arc::new(handler) }
//!        ↓  matched at request time, first match wins
//! (Arc::clone(&map.handler))(controller, &params)  ← one vtable dispatch
//! ```

use std::fmt;
use std::sync::Arc;

use crate::controller::Controller;
use crate::method::Method;
use crate::result::ActionResult;

/// A type-erased action handler.
///
/// Receives the controller serving the request and the positional path
/// parameters that followed the action name. Returning `None` means "no
/// result" and sends the request down the not-found fallback chain.
pub type ActionMethod =
    Arc<dyn Fn(&mut Controller, &[String]) -> Option<ActionResult> + Send + Sync + 'static>;

/// One `(verb, name) → handler` binding.
#[derive(Clone)]
pub struct ActionMap {
    /// `None` matches any verb.
    pub verb: Option<Method>,
    /// Matched against the action segment ignoring ASCII case.
    pub name: String,
    pub handler: ActionMethod,
}

impl ActionMap {
    pub fn new<F>(verb: Option<Method>, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Controller, &[String]) -> Option<ActionResult> + Send + Sync + 'static,
    {
        Self { verb, name: name.into(), handler: Arc::new(handler) }
    }

    pub fn any<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Controller, &[String]) -> Option<ActionResult> + Send + Sync + 'static,
    {
        Self::new(None, name, handler)
    }

    pub fn get<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Controller, &[String]) -> Option<ActionResult> + Send + Sync + 'static,
    {
        Self::new(Some(Method::Get), name, handler)
    }

    pub fn post<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Controller, &[String]) -> Option<ActionResult> + Send + Sync + 'static,
    {
        Self::new(Some(Method::Post), name, handler)
    }

    pub fn put<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Controller, &[String]) -> Option<ActionResult> + Send + Sync + 'static,
    {
        Self::new(Some(Method::Put), name, handler)
    }

    pub fn delete<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Controller, &[String]) -> Option<ActionResult> + Send + Sync + 'static,
    {
        Self::new(Some(Method::Delete), name, handler)
    }

    /// `true` when this map serves `action` requested with `verb`.
    pub fn matches(&self, verb: Method, action: &str) -> bool {
        self.name.eq_ignore_ascii_case(action) && self.verb.is_none_or(|v| v == verb)
    }
}

impl fmt::Debug for ActionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionMap")
            .field("verb", &self.verb)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Returns the first map serving `action` with `verb`, in registration order.
pub fn resolve<'a>(maps: &'a [ActionMap], verb: Method, action: &str) -> Option<&'a ActionMap> {
    maps.iter().find(|m| m.matches(verb, action))
}
