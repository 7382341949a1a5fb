//! The seam between the connection layer and request routing.
//!
//! Once a request is parsed, the connection hands it, together with the
//! connection's [`ResponseWriter`], to a [`Dispatcher`]. The dispatcher owns
//! both from then on and must answer through the writer exactly once.

use async_trait::async_trait;
use std::future::Future;
use tracing::error;

use crate::connection::ResponseWriter;
use crate::protocol::{Request, Response};

#[async_trait]
pub trait Dispatcher: Send + Sync + 'static {
    async fn dispatch(&self, request: Request, writer: ResponseWriter);
}

/// Dispatcher built from an async function mapping a request to a response.
#[derive(Debug)]
pub struct DispatchFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Dispatcher for DispatchFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send,
{
    async fn dispatch(&self, request: Request, writer: ResponseWriter) {
        let response = (self.f)(request).await;
        if let Err(e) = writer.send(response).await {
            error!(cause = %e, "send response error");
        }
    }
}

pub fn dispatch_fn<F, Fut>(f: F) -> DispatchFn<F>
where
    F: Fn(Request) -> Fut,
    Fut: Future<Output = Response>,
{
    DispatchFn { f }
}
