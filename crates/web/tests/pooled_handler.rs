use async_trait::async_trait;
use http::StatusCode;
use relay_pool::{BoxError, PoolConfig, PoolWorker, ResourceFactory};
use relay_web::handler::RequestHandler;
use relay_web::router::get;
use relay_web::{Request, Response, Router, Server};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Default)]
struct Connections {
    next: AtomicUsize,
}

impl ResourceFactory for Connections {
    type Resource = usize;
    type Error = BoxError;

    fn create(&self) -> Result<usize, BoxError> {
        Ok(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

struct Query {
    worker: PoolWorker<Connections>,
    id: u32,
}

#[async_trait]
impl RequestHandler for Query {
    fn preprocess(&mut self, request: &mut Request) -> Result<(), BoxError> {
        (self.id,) = request.captures::<(u32,)>()?;
        Ok(())
    }

    async fn handle(&mut self, _request: &Request) -> Result<Response, BoxError> {
        let id = self.id;
        match self.worker.with_resource(move |conn: &mut usize| Ok::<_, BoxError>(format!("row {id} via {conn}"))).await {
            Ok(row) => Ok(Response::new().status(StatusCode::OK).body(row)),
            Err(e) if e.is_pool_busy() => {
                Ok(Response::new().status(StatusCode::SERVICE_UNAVAILABLE).with_default_status_message())
            }
            Err(e) => Err(e.into()),
        }
    }
}

async fn start_server(worker: &PoolWorker<Connections>) -> SocketAddr {
    let worker = worker.clone();
    let router = Router::builder()
        .route("/rows/{int}", get(move || Query { worker: worker.clone(), id: 0 }))
        .build()
        .unwrap();
    let server = Server::builder().router(router).build().unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move { server.serve(listener).await });
    address
}

async fn get_text(address: SocketAddr, url: &str) -> String {
    let mut stream = TcpStream::connect(address).await.unwrap();
    stream.write_all(format!("GET {url} HTTP/1.1\r\nHost: x\r\n\r\n").as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn handler_uses_pooled_resource() {
    let worker = PoolWorker::new(&PoolConfig::new("rows").max_size(2), Connections::default());
    let address = start_server(&worker).await;

    let response = get_text(address, "/rows/7").await;

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.ends_with("\r\n\r\nrow 7 via 0\r\n"));
    assert_eq!(worker.pool().stats().outstanding, 0);
}

#[tokio::test]
async fn resources_are_reused_across_requests() {
    let worker = PoolWorker::new(&PoolConfig::new("rows").max_size(2), Connections::default());
    let address = start_server(&worker).await;

    for id in 0..5 {
        let response = get_text(address, &format!("/rows/{id}")).await;
        assert!(response.ends_with(&format!("row {id} via 0\r\n")));
    }

    let stats = worker.pool().stats();
    assert_eq!(stats.created, 1);
    assert_eq!(stats.outstanding, 0);
}

#[tokio::test]
async fn saturated_pool_is_reported_by_the_handler() {
    let worker = PoolWorker::new(&PoolConfig::new("rows").max_size(1), Connections::default());
    let address = start_server(&worker).await;

    let (release, gate) = mpsc::channel::<()>();
    let holder = {
        let worker = worker.clone();
        tokio::spawn(async move {
            worker
                .with_resource(move |_: &mut usize| {
                    let _ = gate.recv_timeout(Duration::from_secs(5));
                    Ok::<_, BoxError>(())
                })
                .await
        })
    };
    while worker.pool().stats().outstanding != 1 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let response = get_text(address, "/rows/1").await;
    assert!(response.starts_with("HTTP/1.1 503 Service Unavailable\r\n"));
    assert_eq!(worker.pool().stats().rejected, 16);

    release.send(()).unwrap();
    assert!(holder.await.unwrap().is_ok());
    assert_eq!(worker.pool().stats().outstanding, 0);

    let response = get_text(address, "/rows/1").await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
}
