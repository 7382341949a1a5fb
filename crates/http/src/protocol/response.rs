//! Response builder.
//!
//! A [`Response`] collects a status, a set of unique headers and a text
//! message. It starts out as `500 Internal Server Error` so a handler that
//! forgets to set a status never reports success by accident.
//!
//! Header names are case-insensitive and unique: setting a header replaces
//! any earlier value of the same name. Values are validated by
//! [`HeaderValue`], so a value can't smuggle a line break into the response.
//!
//! ```
//! use http::header::CONTENT_TYPE;
//! use http::{HeaderValue, StatusCode};
//! use relay_http::protocol::Response;
//! use std::fmt::Write;
//!
//! let mut response = Response::new()
//!     .status(StatusCode::OK)
//!     .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
//!     .try_header("X-Part", "42")
//!     .unwrap();
//! write!(response, "current part: {}", 42).unwrap();
//! assert_eq!(response.message(), "current part: 42");
//! assert!(Response::new().try_header("X-User", "bob\r\nSet-Cookie: admin=1").is_err());
//! ```

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use std::fmt;

use crate::protocol::status::status_line;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    message: String,
}

impl Response {
    pub fn new() -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, headers: HeaderMap::new(), message: String::new() }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets a header, replacing an earlier value of the same name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Like [`header`](Self::header), converting and validating the name and value first.
    pub fn try_header<K, V>(mut self, name: K, value: V) -> Result<Self, http::Error>
    where
        K: TryInto<HeaderName>,
        K::Error: Into<http::Error>,
        V: TryInto<HeaderValue>,
        V::Error: Into<http::Error>,
    {
        let name = name.try_into().map_err(Into::into)?;
        let value = value.try_into().map_err(Into::into)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn body(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Uses the status line text (for example `404 Not Found`) as the message.
    ///
    /// Call it after the status is set.
    pub fn with_default_status_message(mut self) -> Self {
        let (status, reason) = status_line(self.status);
        self.message = format!("{} {}", status.as_str(), reason);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn push_str(&mut self, text: &str) {
        self.message.push_str(text);
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for Response {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;

    #[test]
    fn defaults_to_internal_server_error() {
        let response = Response::new();
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.message().is_empty());
        assert!(response.headers().is_empty());
    }

    #[test]
    fn default_status_message() {
        let response = Response::new().status(StatusCode::NOT_FOUND).with_default_status_message();
        assert_eq!(response.message(), "404 Not Found");
    }

    #[test]
    fn headers_are_unique_ignoring_case() {
        let response = Response::new()
            .try_header("content-type", "text/plain")
            .and_then(|response| response.try_header("Content-Type", "application/json"))
            .unwrap();

        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn header_value_with_line_break_is_rejected() {
        let result = Response::new().status(StatusCode::OK).try_header("X-User", "bob\r\nSet-Cookie: admin=1");
        assert!(result.is_err());

        let result = Response::new().try_header("X User", "bob");
        assert!(result.is_err());
    }
}
