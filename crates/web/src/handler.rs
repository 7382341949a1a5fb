//! Per-request handlers.
//!
//! A handler is created fresh for every request by the factory of the matched
//! route, runs [`preprocess`](RequestHandler::preprocess) and then
//! [`handle`](RequestHandler::handle), and is dropped once its response has
//! been written. State extracted in `preprocess`, such as typed url captures
//! or body fields, lives in the handler's own fields.

use async_trait::async_trait;
use http::StatusCode;
use relay_http::protocol::{Method, Request, Response};
use std::error::Error;

pub type BoxError = Box<dyn Error + Send + Sync>;

#[async_trait]
pub trait RequestHandler: Send + 'static {
    /// Validates the request and extracts what `handle` needs.
    ///
    /// An error, or a panic, discards this handler: the request is answered
    /// by the bad request handler instead.
    fn preprocess(&mut self, request: &mut Request) -> Result<(), BoxError> {
        let _ = request;
        Ok(())
    }

    /// Produces the response.
    ///
    /// An error, or a panic, is logged and answered with
    /// `500 Internal Server Error`; the error text never reaches the client.
    async fn handle(&mut self, request: &Request) -> Result<Response, BoxError>;
}

/// A handler type bound to a fixed method and path, registered with
/// [`RouterBuilder::endpoint`](crate::router::RouterBuilder::endpoint).
pub trait Endpoint: RequestHandler + Default {
    const METHOD: Method;
    const PATH: &'static str;
}

/// Creates a new handler for every request routed to it.
pub trait HandlerFactory: Send + Sync + 'static {
    fn create(&self) -> Box<dyn RequestHandler>;
}

impl<F, H> HandlerFactory for F
where
    F: Fn() -> H + Send + Sync + 'static,
    H: RequestHandler,
{
    fn create(&self) -> Box<dyn RequestHandler> {
        Box::new(self())
    }
}

/// Answers `404 Not Found` when no route matches.
#[derive(Debug, Default)]
pub struct NotFound;

#[async_trait]
impl RequestHandler for NotFound {
    async fn handle(&mut self, _request: &Request) -> Result<Response, BoxError> {
        Ok(Response::new().status(StatusCode::NOT_FOUND).with_default_status_message())
    }
}

/// Answers `400 Bad Request` when a handler rejects its request in `preprocess`.
#[derive(Debug, Default)]
pub struct BadRequest;

#[async_trait]
impl RequestHandler for BadRequest {
    async fn handle(&mut self, _request: &Request) -> Result<Response, BoxError> {
        Ok(Response::new().status(StatusCode::BAD_REQUEST).with_default_status_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_is_factory<F: HandlerFactory>(_factory: &F) {
        // no op
    }

    #[test]
    fn closures_and_default_constructors_are_factories() {
        assert_is_factory(&NotFound::default);
        assert_is_factory(&|| BadRequest);
    }

    #[tokio::test]
    async fn default_handlers() {
        let request = Request::new(Method::Get, "/nope");

        let response = NotFound.handle(&request).await.unwrap();
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(response.message(), "404 Not Found");

        let response = BadRequest.handle(&request).await.unwrap();
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.message(), "400 Bad Request");
    }

    #[test]
    fn preprocess_accepts_by_default() {
        let mut request = Request::new(Method::Get, "/");
        assert!(NotFound.preprocess(&mut request).is_ok());
    }
}
