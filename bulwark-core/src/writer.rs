// Per-request response writer used by interceptors

use crate::{Error, HttpResponse, Result};
use cookie::Cookie;
use http::header::SET_COOKIE;
use http::{HeaderValue, StatusCode};

/// Whether an interceptor hook wrote the response itself.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Processing continues
    NotWritten,
    /// A response was written; later stages must not run
    Written,
}

impl Disposition {
    pub fn is_written(self) -> bool {
        self == Disposition::Written
    }
}

/// Collects cookies and short-circuit errors for a single request.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    cookies: Vec<Cookie<'static>>,
    written: Option<StatusCode>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a cookie to be sent as a `Set-Cookie` header.
    ///
    /// Fails once an error response has been written.
    pub fn set_cookie(&mut self, cookie: Cookie<'static>) -> Result<()> {
        if self.written.is_some() {
            return Err(Error::AlreadyWritten);
        }
        self.cookies.push(cookie);
        Ok(())
    }

    /// Write a bare error response. The first status written wins.
    pub fn write_error(&mut self, status: StatusCode) -> Disposition {
        if self.written.is_none() {
            self.written = Some(status);
        }
        Disposition::Written
    }

    pub fn is_written(&self) -> bool {
        self.written.is_some()
    }

    pub fn written_status(&self) -> Option<StatusCode> {
        self.written
    }

    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    /// Finish the request.
    ///
    /// A written error replaces `rendered` entirely. Queued cookies are only
    /// attached to non-error responses.
    pub fn into_response(self, rendered: Option<HttpResponse>) -> HttpResponse {
        if let Some(status) = self.written {
            return HttpResponse::error(status);
        }

        let Some(mut response) = rendered else {
            return HttpResponse::error(StatusCode::INTERNAL_SERVER_ERROR);
        };

        for cookie in &self.cookies {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    response.headers.append(SET_COOKIE, value);
                }
                Err(e) => {
                    tracing::warn!(cookie = cookie.name(), error = %e, "Dropping invalid Set-Cookie header");
                }
            }
        }

        response
    }
}
