//! Incoming HTTP request type and request-target parsing.

use std::collections::HashMap;

use bytes::Bytes;
use url::form_urlencoded;

use crate::cookie::Cookie;
use crate::method::Method;

// ── ParsedUrl ─────────────────────────────────────────────────────────────────

/// A request target split into its path, query, and fragment.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParsedUrl {
    pub path: String,
    pub query: HashMap<String, String>,
    pub fragment: String,
}

impl ParsedUrl {
    /// Splits `target` into path, query, and fragment.
    ///
    /// The fragment (`#...`) is removed first, then the query (`?...`). Query
    /// pairs are percent-decoded; when a key repeats, the last occurrence wins.
    /// Keys are case-sensitive. The path is kept as sent.
    pub fn parse(target: &str) -> Self {
        let (rest, fragment) = target.split_once('#').unwrap_or((target, ""));
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        Self {
            path: path.to_owned(),
            query: decode_pairs(query.as_bytes()),
            fragment: fragment.to_owned(),
        }
    }
}

/// Decodes `application/x-www-form-urlencoded` pairs. Last occurrence wins.
fn decode_pairs(input: &[u8]) -> HashMap<String, String> {
    form_urlencoded::parse(input).into_owned().collect()
}

// ── Request ───────────────────────────────────────────────────────────────────

/// An incoming HTTP request.
///
/// Built by the server from the hyper request, or by hand in tests:
///
/// ```rust
/// use mvcapp::{Method, Request};
///
/// let req = Request::new(Method::Get, "/Test/Index?page=2")
///     .cookie("SessionID", "EIMA5VQOU4980S35AYPAEKYABL73GZBA");
/// assert_eq!(req.path(), "/Test/Index");
/// assert_eq!(req.query("page"), Some("2"));
/// ```
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    target: String,
    url: ParsedUrl,
    headers: Vec<(String, String)>,
    cookies: Vec<Cookie>,
    body: Bytes,
    form: Option<HashMap<String, String>>,
}

impl Request {
    pub fn new(method: Method, target: &str) -> Self {
        Self {
            method,
            target: target.to_owned(),
            url: ParsedUrl::parse(target),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: Bytes::new(),
            form: None,
        }
    }

    pub(crate) fn from_parts(
        method: Method,
        target: &str,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Self {
        headers
            .into_iter()
            .fold(Self::new(method, target), |req, (k, v)| req.header(&k, &v))
            .body(body)
    }

    /// Adds a header. `Cookie` headers are parsed into [`Request::cookies`].
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if name.eq_ignore_ascii_case("cookie") {
            self.cookies.extend(Cookie::parse_header(value));
        }
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Adds an inbound cookie.
    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push(Cookie::new(name, value));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self.form = None;
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn target(&self) -> &str { &self.target }
    pub fn url(&self) -> &ParsedUrl { &self.url }
    pub fn path(&self) -> &str { &self.url.path }
    pub fn fragment(&self) -> &str { &self.url.fragment }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn cookies(&self) -> &[Cookie] { &self.cookies }
    pub fn bytes(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a decoded query-string value.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.url.query.get(key).map(String::as_str)
    }

    /// Returns the first inbound cookie called `name`.
    pub fn get_cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    /// Parses form-encoded body fields, once.
    ///
    /// Only form-submitting methods with an `application/x-www-form-urlencoded`
    /// content type carry fields. For anything else the form stays empty.
    pub fn parse_form(&mut self) {
        if self.form.is_some() {
            return;
        }
        let is_form = self
            .header_value("content-type")
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
        let fields = if self.method.submits_form() && is_form {
            decode_pairs(&self.body)
        } else {
            HashMap::new()
        };
        self.form = Some(fields);
    }

    /// Returns a form field. `None` until [`Request::parse_form`] has run.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form.as_ref()?.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_fragment_then_query() {
        let url = ParsedUrl::parse("/Home/Index/7?name=J%C3%BCrgen&tag=a+b#top");
        assert_eq!(url.path, "/Home/Index/7");
        assert_eq!(url.query["name"], "Jürgen");
        assert_eq!(url.query["tag"], "a b");
        assert_eq!(url.fragment, "top");
    }

    #[test]
    fn duplicate_query_keys_keep_the_last_value() {
        let url = ParsedUrl::parse("/?k=1&K=upper&k=2");
        assert_eq!(url.query["k"], "2");
        assert_eq!(url.query["K"], "upper");
    }

    #[test]
    fn question_mark_inside_fragment_is_not_a_query() {
        let url = ParsedUrl::parse("/a#frag?x=1");
        assert_eq!(url.path, "/a");
        assert!(url.query.is_empty());
        assert_eq!(url.fragment, "frag?x=1");
    }

    #[test]
    fn cookie_header_is_parsed() {
        let req = Request::new(Method::Get, "/").header("Cookie", "a=1; b=2");
        assert_eq!(req.get_cookie("b").map(|c| c.value.as_str()), Some("2"));
        assert_eq!(req.header_value("COOKIE"), Some("a=1; b=2"));
    }

    #[test]
    fn form_fields_require_post_and_form_content_type() {
        let mut post = Request::new(Method::Post, "/Test/Save")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("name=alice&age=30");
        assert_eq!(post.form_value("name"), None);
        post.parse_form();
        assert_eq!(post.form_value("name"), Some("alice"));
        assert_eq!(post.form_value("age"), Some("30"));

        let mut get = Request::new(Method::Get, "/Test/Save")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("name=alice");
        get.parse_form();
        assert_eq!(get.form_value("name"), None);
    }
}
