//! A key-value store behind a small pool of store connections.
//!
//! curl -v -H 'Content-Type: application/json' -d '{"value":"bar"}' http://127.0.0.1:5000/kv/foo
//! curl -v http://127.0.0.1:5000/kv/foo

use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use http::StatusCode;
use relay_pool::{BoxError, PoolConfig, PoolWorker, ResourceFactory, WorkError};
use relay_web::handler::RequestHandler;
use relay_web::router::{get, post};
use relay_web::{Request, Response, Router, Server, ServerConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, Level};

type Store = Arc<Mutex<HashMap<String, String>>>;

/// Stand-in for a blocking database connection.
struct StoreConnection {
    id: usize,
    store: Store,
}

impl StoreConnection {
    fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(store.get(key).cloned())
    }

    fn put(&mut self, key: String, value: String) -> Result<(), BoxError> {
        info!(connection = self.id, key = %key, "put");
        self.store.lock().unwrap_or_else(PoisonError::into_inner).insert(key, value);
        Ok(())
    }
}

/// Opens store connections, numbering them in creation order.
#[derive(Default)]
struct Connector {
    store: Store,
    next_id: AtomicUsize,
}

impl ResourceFactory for Connector {
    type Resource = StoreConnection;
    type Error = BoxError;

    fn create(&self) -> Result<StoreConnection, BoxError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(StoreConnection { id, store: Arc::clone(&self.store) })
    }
}

type Worker = PoolWorker<Connector>;

fn status_of(e: &WorkError) -> StatusCode {
    if e.is_pool_busy() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

struct Lookup {
    worker: Worker,
    key: String,
}

#[async_trait]
impl RequestHandler for Lookup {
    fn preprocess(&mut self, request: &mut Request) -> Result<(), BoxError> {
        (self.key,) = request.captures::<(String,)>()?;
        Ok(())
    }

    async fn handle(&mut self, _request: &Request) -> Result<Response, BoxError> {
        let key = self.key.clone();
        let response = match self.worker.with_resource(move |conn: &mut StoreConnection| conn.get(&key)).await {
            Ok(Some(value)) => Response::new()
                .status(StatusCode::OK)
                .try_header(CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.as_ref())?
                .body(value),
            Ok(None) => Response::new().status(StatusCode::NOT_FOUND).with_default_status_message(),
            Err(e) => Response::new().status(status_of(&e)).with_default_status_message(),
        };
        Ok(response)
    }
}

#[derive(Deserialize)]
struct Entry {
    value: String,
}

struct Insert {
    worker: Worker,
    key: String,
    value: String,
}

#[async_trait]
impl RequestHandler for Insert {
    fn preprocess(&mut self, request: &mut Request) -> Result<(), BoxError> {
        (self.key,) = request.captures::<(String,)>()?;
        self.value = request.body().ok_or("json body required")?.json::<Entry>()?.value;
        Ok(())
    }

    async fn handle(&mut self, _request: &Request) -> Result<Response, BoxError> {
        let (key, value) = (self.key.clone(), self.value.clone());
        let response = match self.worker.with_resource(move |conn: &mut StoreConnection| conn.put(key, value)).await {
            Ok(()) => Response::new().status(StatusCode::CREATED).with_default_status_message(),
            Err(e) => Response::new().status(status_of(&e)).with_default_status_message(),
        };
        Ok(response)
    }
}

fn main() -> Result<(), BoxError> {
    let config = ServerConfig::default();
    let worker = PoolWorker::new(&PoolConfig::new("kv").max_size(config.worker_threads), Connector::default());

    let router = {
        let (lookup, insert) = (worker.clone(), worker);
        Router::builder()
            .route("/kv/{string}", get(move || Lookup { worker: lookup.clone(), key: String::new() }))
            .route(
                "/kv/{string}",
                post(move || Insert { worker: insert.clone(), key: String::new(), value: String::new() }),
            )
            .build()?
    };

    let server = Server::builder()
        .router(router)
        .config(config)
        .subscriber(relay_web::logging::fmt_dispatch(Level::INFO))
        .build()?;
    server.run("127.0.0.1", 5000)?;
    Ok(())
}
