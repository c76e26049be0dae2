//! HTTP status codes used by the dispatch pipeline.
//!
//! [`ActionResult`](crate::ActionResult) stores the raw `u16`, so any code can
//! be sent. [`Status`] names the ones the framework and its helpers produce.
//!
//! ```rust
//! use mvcapp::{ActionResult, Status};
//!
//! let gone = ActionResult::status(Status::Gone);
//! assert_eq!(gone.status_code(), 410);
//! ```

/// Named HTTP status codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                  // 200
    Created,             // 201
    Accepted,            // 202
    NoContent,           // 204

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    MovedPermanently,    // 301
    Found,               // 302
    SeeOther,            // 303
    NotModified,         // 304
    TemporaryRedirect,   // 307

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,          // 400
    Unauthorized,        // 401
    Forbidden,           // 403
    NotFound,            // 404
    MethodNotAllowed,    // 405
    Gone,                // 410

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError, // 500
    ServiceUnavailable,  // 503
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok                  => 200,
            Self::Created             => 201,
            Self::Accepted            => 202,
            Self::NoContent           => 204,
            Self::MovedPermanently    => 301,
            Self::Found               => 302,
            Self::SeeOther            => 303,
            Self::NotModified         => 304,
            Self::TemporaryRedirect   => 307,
            Self::BadRequest          => 400,
            Self::Unauthorized        => 401,
            Self::Forbidden           => 403,
            Self::NotFound            => 404,
            Self::MethodNotAllowed    => 405,
            Self::Gone                => 410,
            Self::InternalServerError => 500,
            Self::ServiceUnavailable  => 503,
        }
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.code()
    }
}
