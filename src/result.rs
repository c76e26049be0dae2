//! Action results, the response sink they execute against, and the built-in
//! "not found" and "internal error" pages.
//!
//! A handler builds an [`ActionResult`] and returns it. The dispatcher merges
//! the controller's queued cookies onto it and executes it against a
//! [`ResponseSink`]. That is the entire life of a result.

use std::borrow::Cow;

use bytes::Bytes;
use http_body_util::Full;

use crate::cookie::Cookie;
use crate::error::Error;
use crate::status::Status;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ActionResult::bytes`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Css,          // text/css
    Csv,          // text/csv
    Gif,          // image/gif
    Html,         // text/html; charset=utf-8
    Icon,         // image/x-icon
    Javascript,   // text/javascript
    Jpeg,         // image/jpeg
    Json,         // application/json
    OctetStream,  // application/octet-stream  (binary / file download)
    Pdf,          // application/pdf
    Png,          // image/png
    Svg,          // image/svg+xml
    Text,         // text/plain; charset=utf-8
    Wasm,         // application/wasm
    Woff,         // font/woff
    Woff2,        // font/woff2
    Xml,          // application/xml
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Css         => "text/css",
            Self::Csv         => "text/csv",
            Self::Gif         => "image/gif",
            Self::Html        => "text/html; charset=utf-8",
            Self::Icon        => "image/x-icon",
            Self::Javascript  => "text/javascript",
            Self::Jpeg        => "image/jpeg",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Pdf         => "application/pdf",
            Self::Png         => "image/png",
            Self::Svg         => "image/svg+xml",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Wasm        => "application/wasm",
            Self::Woff        => "font/woff",
            Self::Woff2       => "font/woff2",
            Self::Xml         => "application/xml",
        }
    }

    /// Natural content type of a file extension. Unknown → octet-stream.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "css"           => Self::Css,
            "csv"           => Self::Csv,
            "gif"           => Self::Gif,
            "htm" | "html"  => Self::Html,
            "ico"           => Self::Icon,
            "js" | "mjs"    => Self::Javascript,
            "jpg" | "jpeg"  => Self::Jpeg,
            "json" | "map"  => Self::Json,
            "pdf"           => Self::Pdf,
            "png"           => Self::Png,
            "svg"           => Self::Svg,
            "txt"           => Self::Text,
            "wasm"          => Self::Wasm,
            "woff"          => Self::Woff,
            "woff2"         => Self::Woff2,
            "xml"           => Self::Xml,
            _               => Self::OctetStream,
        }
    }
}

// ── ActionResult ──────────────────────────────────────────────────────────────

/// The materialized response produced by an action handler.
///
/// # Shortcuts (200 OK)
///
/// ```rust
/// use mvcapp::{ActionResult, Status};
///
/// ActionResult::text("hello");
/// ActionResult::html("<p>hello</p>");
/// ActionResult::status(Status::NoContent);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use mvcapp::{ActionResult, ContentType, Status};
///
/// ActionResult::builder()
///     .status(Status::Created)
///     .header("location", "/Users/Show/42")
///     .json(br#"{"id":42}"#.to_vec());
///
/// ActionResult::builder().bytes(ContentType::Xml, b"<ok/>".to_vec());
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActionResult {
    pub(crate) status: u16,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) cookies: Vec<Cookie>,
    pub(crate) body: Vec<u8>,
}

impl ActionResult {
    /// `200 OK` with a raw body and no content type.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok.code(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: body.into(),
        }
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// `200 OK`, `text/html; charset=utf-8`.
    pub fn html(body: impl Into<String>) -> Self {
        Self::builder().bytes(ContentType::Html, body.into().into_bytes())
    }

    /// `200 OK`, `application/json`, body already encoded.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` with a typed body.
    pub fn bytes(content_type: ContentType, body: Vec<u8>) -> Self {
        Self::builder().bytes(content_type, body)
    }

    /// Result with no body.
    pub fn status(code: Status) -> Self {
        Self::builder().status(code).no_body()
    }

    pub fn builder() -> ResultBuilder {
        ResultBuilder { headers: Vec::new(), status: Status::Ok.code() }
    }

    pub fn status_code(&self) -> u16 { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn cookies(&self) -> &[Cookie] { &self.cookies }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header. A header with the same name (ignoring case) is replaced.
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    /// Queues a cookie. A cookie with the same name is replaced.
    pub fn add_cookie(&mut self, cookie: Cookie) {
        self.cookies.retain(|c| c.name != cookie.name);
        self.cookies.push(cookie);
    }

    /// `true` when this result carries nothing to send: an empty body with
    /// the default `200` status. The dispatcher treats such a result exactly
    /// like a handler that produced no result at all. Any other status is an
    /// explicit override and is sent as is.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty() && self.status == Status::Ok.code()
    }

    /// Writes status, headers, cookies, then the body to `sink`.
    pub fn execute(self, sink: &mut dyn ResponseSink) -> Result<(), Error> {
        sink.set_status(self.status)?;
        for (name, value) in &self.headers {
            sink.set_header(name, value)?;
        }
        for cookie in &self.cookies {
            sink.set_cookie(cookie)?;
        }
        sink.write(&self.body)
    }
}

// ── ResultBuilder ─────────────────────────────────────────────────────────────

/// Fluent builder for [`ActionResult`].
///
/// Obtain via [`ActionResult::builder()`]. Defaults to `Status::Ok` (200).
/// Terminated by a typed body method.
pub struct ResultBuilder {
    headers: Vec<(String, String)>,
    status: u16,
}

impl ResultBuilder {
    pub fn status(mut self, code: Status) -> Self {
        self.status = code.code();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn json(self, body: Vec<u8>) -> ActionResult {
        self.bytes(ContentType::Json, body)
    }

    pub fn text(self, body: impl Into<String>) -> ActionResult {
        self.bytes(ContentType::Text, body.into().into_bytes())
    }

    pub fn bytes(self, content_type: ContentType, body: Vec<u8>) -> ActionResult {
        let mut headers = vec![("content-type".to_owned(), content_type.as_str().to_owned())];
        headers.extend(self.headers);
        ActionResult { status: self.status, headers, cookies: Vec::new(), body }
    }

    /// Terminate with no body (e.g. `Status::NoContent`, `Status::Found`).
    pub fn no_body(self) -> ActionResult {
        ActionResult {
            status: self.status,
            headers: self.headers,
            cookies: Vec::new(),
            body: Vec::new(),
        }
    }
}

// ── Built-in pages ────────────────────────────────────────────────────────────

/// The default "content not found" page, naming the unresolved path.
pub fn not_found_page(path: &str) -> ActionResult {
    let body = format!(
        "<html><head><title>Content Missing</title></head><body>\
         <h1>Content Missing</h1>\
         <p>The requested content could not be found: {}</p>\
         </body></html>",
        escape_html(path),
    );
    ActionResult::builder()
        .status(Status::NotFound)
        .bytes(ContentType::Html, body.into_bytes())
}

/// The default "internal error" page. `message` must already be client-safe.
pub fn error_page(message: &str) -> ActionResult {
    let body = format!(
        "<html><head><title>Internal Server Error</title></head><body>\
         <h1>Internal Server Error</h1>\
         <p>{}</p>\
         </body></html>",
        escape_html(message),
    );
    ActionResult::builder()
        .status(Status::InternalServerError)
        .bytes(ContentType::Html, body.into_bytes())
}

pub(crate) fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '<'  => out.push_str("&lt;"),
            '>'  => out.push_str("&gt;"),
            '&'  => out.push_str("&amp;"),
            '"'  => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _    => out.push(c),
        }
    }
    Cow::Owned(out)
}

// ── ResponseSink ──────────────────────────────────────────────────────────────

/// Where a result is written.
///
/// Write-once: after the first [`write`](ResponseSink::write) the status,
/// headers, and cookies are committed and can no longer change.
pub trait ResponseSink {
    fn set_status(&mut self, code: u16) -> Result<(), Error>;
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), Error>;
    fn set_cookie(&mut self, cookie: &Cookie) -> Result<(), Error>;
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error>;
}

/// An in-memory [`ResponseSink`], converted into a hyper response by the
/// server and inspected directly in tests.
#[derive(Clone, Debug)]
pub struct BufferedResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    committed: bool,
}

impl Default for BufferedResponse {
    fn default() -> Self { Self::new() }
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self { status: Status::Ok.code(), headers: Vec::new(), body: Vec::new(), committed: false }
    }

    pub fn status(&self) -> u16 { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn is_committed(&self) -> bool { self.committed }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// First header called `name`, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every `Set-Cookie` header value, in order.
    pub fn set_cookies(&self) -> Vec<&str> {
        self.headers.iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("set-cookie"))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Value of the outbound cookie called `name`, if one was set.
    pub fn cookie_value(&self, name: &str) -> Option<&str> {
        self.set_cookies().into_iter().find_map(|header| {
            let pair = header.split(';').next()?;
            let (k, v) = pair.split_once('=')?;
            (k == name).then_some(v)
        })
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.committed { Err(Error::ResponseCommitted) } else { Ok(()) }
    }

    /// Converts into the hyper response type.
    ///
    /// Headers hyper refuses are dropped with a warning rather than failing the
    /// whole response.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(Bytes::from(self.body)));
        *response.status_mut() = http::StatusCode::from_u16(self.status)
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        let headers = response.headers_mut();
        for (name, value) in self.headers {
            match (
                http::HeaderName::from_bytes(name.as_bytes()),
                http::HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => { headers.append(name, value); }
                _ => tracing::warn!(header = %name, "dropping invalid response header"),
            }
        }
        response
    }
}

impl ResponseSink for BufferedResponse {
    fn set_status(&mut self, code: u16) -> Result<(), Error> {
        self.ensure_open()?;
        self.status = code;
        Ok(())
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        self.ensure_open()?;
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
        Ok(())
    }

    fn set_cookie(&mut self, cookie: &Cookie) -> Result<(), Error> {
        self.ensure_open()?;
        self.headers.push(("set-cookie".to_owned(), cookie.to_string()));
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.committed = true;
        self.body.extend_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_result_defaults_to_200() {
        let result = ActionResult::new(b"test".to_vec());
        assert_eq!(result.status_code(), 200);
        assert!(result.headers().is_empty());
        assert_eq!(result.body(), b"test");
    }

    #[test]
    fn add_header_replaces_same_name() {
        let mut result = ActionResult::text("x");
        result.add_header("Framework", "one");
        result.add_header("framework", "two");
        assert_eq!(result.header("FRAMEWORK"), Some("two"));
        assert_eq!(result.headers().len(), 2);
    }

    #[test]
    fn add_cookie_replaces_same_name() {
        let mut result = ActionResult::text("x");
        result.add_cookie(Cookie::new("a", "1"));
        result.add_cookie(Cookie::new("b", "2"));
        result.add_cookie(Cookie::new("a", "3"));
        let values: Vec<_> = result.cookies().iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, ["2", "3"]);
    }

    #[test]
    fn emptiness_respects_status_override() {
        assert!(ActionResult::new(Vec::new()).is_empty());
        assert!(!ActionResult::status(Status::NoContent).is_empty());
        assert!(!ActionResult::text("x").is_empty());
    }

    #[test]
    fn execute_writes_everything() {
        let mut result = ActionResult::builder()
            .status(Status::Created)
            .header("location", "/x")
            .text("made");
        result.add_cookie(Cookie::new("k", "v").path("/"));

        let mut sink = BufferedResponse::new();
        result.execute(&mut sink).unwrap();

        assert_eq!(sink.status(), 201);
        assert_eq!(sink.header("Location"), Some("/x"));
        assert_eq!(sink.set_cookies(), ["k=v; Path=/"]);
        assert_eq!(sink.cookie_value("k"), Some("v"));
        assert_eq!(sink.body_text(), "made");
        assert!(sink.is_committed());
    }

    #[test]
    fn sink_is_write_once() {
        let mut sink = BufferedResponse::new();
        sink.write(b"partial").unwrap();
        assert!(matches!(sink.set_status(500), Err(Error::ResponseCommitted)));
        assert!(matches!(sink.set_header("a", "b"), Err(Error::ResponseCommitted)));
        assert_eq!(sink.status(), 200);
    }

    #[test]
    fn pages_escape_their_input() {
        let page = not_found_page("/Test/<script>");
        assert_eq!(page.status_code(), 404);
        let body = String::from_utf8(page.body).unwrap();
        assert!(body.contains("Content Missing"));
        assert!(body.contains("/Test/&lt;script&gt;"));

        let page = error_page("view rendering failed");
        assert_eq!(page.status_code(), 500);
        assert_eq!(page.header("content-type"), Some("text/html; charset=utf-8"));
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(ContentType::from_extension("CSS"), ContentType::Css);
        assert_eq!(ContentType::from_extension("htm"), ContentType::Html);
        assert_eq!(ContentType::from_extension("bin"), ContentType::OctetStream);
    }

    #[test]
    fn into_http_keeps_multiple_set_cookies() {
        let mut sink = BufferedResponse::new();
        sink.set_cookie(&Cookie::new("a", "1")).unwrap();
        sink.set_cookie(&Cookie::new("b", "2")).unwrap();
        sink.write(b"").unwrap();
        let response = sink.into_http();
        assert_eq!(response.headers().get_all("set-cookie").iter().count(), 2);
    }
}
