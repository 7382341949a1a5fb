//! Routing and the per-request handler lifecycle of the relay HTTP server.
//!
//! A request parsed by `relay-http` is matched against the routes of a
//! [`Router`] in registration order. The matched route's factory builds a
//! fresh [`RequestHandler`](handler::RequestHandler), which goes through
//! `preprocess` and `handle`; the response is written once, the connection
//! is closed and the handler is dropped on the next scheduler tick.
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use http::StatusCode;
//! use relay_web::handler::{BoxError, Endpoint, RequestHandler};
//! use relay_web::{Method, Request, Response, Router, Server};
//!
//! #[derive(Default)]
//! struct Hello {
//!     name: String,
//! }
//!
//! #[async_trait]
//! impl RequestHandler for Hello {
//!     fn preprocess(&mut self, request: &mut Request) -> Result<(), BoxError> {
//!         (self.name,) = request.captures::<(String,)>()?;
//!         Ok(())
//!     }
//!
//!     async fn handle(&mut self, _request: &Request) -> Result<Response, BoxError> {
//!         Ok(Response::new().status(StatusCode::OK).body(format!("hello {}", self.name)))
//!     }
//! }
//!
//! impl Endpoint for Hello {
//!     const METHOD: Method = Method::Get;
//!     const PATH: &'static str = "/hello/{string}";
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::builder().endpoint::<Hello>().build()?;
//!     let server = Server::builder()
//!         .router(router)
//!         .subscriber(relay_web::logging::fmt_dispatch(tracing::Level::INFO))
//!         .build()?;
//!     server.run("127.0.0.1", 5000)?;
//!     Ok(())
//! }
//! ```

mod error;
mod lifecycle;
mod server;

pub mod handler;
pub mod logging;
pub mod router;

pub use error::RouteError;
pub use error::ServerBuildError;
pub use router::Router;
pub use server::Server;
pub use server::ServerBuilder;
pub use server::ServerConfig;

pub use relay_http::protocol::{Body, Method, Request, Response};
