//! Connection layer and incremental request parser of the relay HTTP server.
//!
//! The crate covers everything between the socket and the router: accepting
//! TCP connections, feeding their bytes to a per-connection parser, and
//! writing exactly one response before closing. Routing lives behind the
//! [`handler::Dispatcher`] trait.
//!
//! One request is read per connection. The response is written with
//! `Connection: close` and the connection is shut down afterwards.
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use relay_http::connection::{HttpReaderFactory, TcpServer};
//! use relay_http::handler::dispatch_fn;
//! use relay_http::protocol::{Request, Response};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> std::io::Result<()> {
//!     let factory = HttpReaderFactory::new(dispatch_fn(hello));
//!     TcpServer::new(factory).listen("127.0.0.1", 8080).await
//! }
//!
//! async fn hello(request: Request) -> Response {
//!     Response::new().status(StatusCode::OK).body(format!("hello {}", request.url()))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`connection`]: accept loop, per-connection reader/writer contracts, the
//!   HTTP reader and the one-shot [`connection::ResponseWriter`]
//! - [`codec`]: [`codec::RequestParser`] and [`codec::ResponseEncoder`]
//! - [`protocol`]: request, response, body and error types
//! - [`handler`]: the [`handler::Dispatcher`] seam
//!
//! # Limits
//!
//! The parser rejects, with `400 Bad Request`, a url longer than 128 bytes, a
//! header name longer than 128 bytes, a header value longer than 2048 bytes,
//! more than 64 headers and bodies over 1 MiB. All of them are configurable
//! through [`codec::ParserLimits`]. Only `GET` and `POST` are accepted, and
//! bodies must be framed by `Content-Length`.

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
