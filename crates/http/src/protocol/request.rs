//! The parsed request handed from the connection to the router.
//!
//! A [`Request`] is owned by the connection until the parser completes, then
//! moved into the dispatcher and from there into the handler lifecycle. It is
//! never shared.

use crate::protocol::captures::FromCaptures;
use crate::protocol::{Body, CaptureError, Headers, Method};

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    url: String,
    method: Method,
    headers: Headers,
    captures: Vec<String>,
    body: Option<Body>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { url: url.into(), method, headers: Headers::new(), captures: Vec::new(), body: None }
    }

    pub(crate) fn from_parts(method: Method, url: String, headers: Headers, body: Option<Body>) -> Self {
        Self { url, method, headers, captures: Vec::new(), body }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Capture groups of the matched route pattern, in pattern order.
    pub fn url_captures(&self) -> &[String] {
        &self.captures
    }

    pub fn set_captures(&mut self, captures: Vec<String>) {
        self.captures = captures;
    }

    /// Converts the url captures into typed values, see [`FromCaptures`].
    pub fn captures<T: FromCaptures>(&self) -> Result<T, CaptureError> {
        T::from_captures(&self.captures)
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    pub fn set_body(&mut self, body: Body) {
        self.body = Some(body);
    }
}
