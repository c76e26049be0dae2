//! HTTP method as a typed enum.
//!
//! Covers the RFC 9110 standard methods. Action maps bind to one of these, or
//! to no verb at all (`None`), which matches any inbound method.
//!
//! Unknown method strings are rejected at the server level with
//! `405 Method Not Allowed` before they ever reach a controller.

use std::fmt;
use std::str::FromStr;

/// A known HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Trace   => "TRACE",
        }
    }

    /// Methods whose body may carry `application/x-www-form-urlencoded` fields.
    pub fn submits_form(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

/// Parses a method name ignoring ASCII case, so action maps registered as
/// `"get"` and requests sent as `GET` agree.
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [Method; 9] = [
            Method::Connect,
            Method::Delete,
            Method::Get,
            Method::Head,
            Method::Options,
            Method::Patch,
            Method::Post,
            Method::Put,
            Method::Trace,
        ];
        ALL.into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = ();

    fn try_from(m: &http::Method) -> Result<Self, Self::Error> {
        m.as_str().parse()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
