//! The request lifecycle: matching, preprocessing, handling, responding and
//! destruction of the per-request handler.
//!
//! [`Router`] implements [`Dispatcher`], so the connection layer hands every
//! parsed request to [`Router::dispatch`]. Each request gets exactly one
//! response, written through the connection's one-shot writer. Handler
//! failures never escape: a rejected or panicking `preprocess` switches to the
//! bad request handler, a failing or panicking `handle` becomes a generic
//! `500 Internal Server Error`.

use async_trait::async_trait;
use futures::FutureExt;
use http::StatusCode;
use relay_http::connection::ResponseWriter;
use relay_http::handler::Dispatcher;
use relay_http::protocol::{Request, Response};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

use crate::handler::{BadRequest, BoxError, RequestHandler};
use crate::router::Router;

#[async_trait]
impl Dispatcher for Router {
    async fn dispatch(&self, mut request: Request, writer: ResponseWriter) {
        let mut handler = self.prepare(&mut request);
        let response = handle(handler.as_mut(), &request).await;

        debug!(status = response.status_code().as_u16(), "send response");
        if let Err(e) = writer.send(response).await {
            error!(cause = %e, "send response error");
        }

        // the handler outlives its own response write and goes away on the next tick
        tokio::task::yield_now().await;
        drop(handler);
    }
}

impl Router {
    /// Picks the handler for `request` and runs its `preprocess`.
    fn prepare(&self, request: &mut Request) -> Box<dyn RequestHandler> {
        let mut handler = match self.at(request.method(), request.url()) {
            Some((factory, captures)) => {
                request.set_captures(captures);
                factory.create()
            }
            None => {
                info!(method = %request.method(), url = request.url(), "no route matched, use not found handler");
                self.not_found().create()
            }
        };

        if let Err(cause) = preprocess(handler.as_mut(), request) {
            info!(%cause, "request rejected in preprocess, use bad request handler");
            handler = self.bad_request().create();
            if let Err(cause) = preprocess(handler.as_mut(), request) {
                warn!(%cause, "bad request handler rejected the request, use the built-in one");
                handler = Box::new(BadRequest);
            }
        }
        handler
    }
}

/// Runs `preprocess`, turning a panic into an error carrying its message.
fn preprocess(handler: &mut dyn RequestHandler, request: &mut Request) -> Result<(), BoxError> {
    match panic::catch_unwind(AssertUnwindSafe(|| handler.preprocess(request))) {
        Ok(result) => result,
        Err(panic) => Err(format!("preprocess panicked: {}", panic_message(&*panic)).into()),
    }
}

async fn handle(handler: &mut dyn RequestHandler, request: &Request) -> Response {
    match AssertUnwindSafe(handler.handle(request)).catch_unwind().await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            error!(cause = %e, "handle request error");
            internal_server_error()
        }
        Err(panic) => {
            error!(message = %panic_message(&*panic), "handler panicked");
            internal_server_error()
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

fn internal_server_error() -> Response {
    Response::new().status(StatusCode::INTERNAL_SERVER_ERROR).with_default_status_message()
}
