use relay_http::codec::ParserLimits;
use relay_http::connection::{HttpReaderFactory, TcpServer};
use relay_http::protocol::BodyDecoders;
use serde::Deserialize;
use std::future::Future;
use std::io;
use tokio::net::TcpListener;
use tracing::instrument::WithSubscriber;
use tracing::{info, Dispatch};

use crate::router::Router;
use crate::ServerBuildError;

/// Server settings, loadable with any serde format.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub limits: ParserLimits,
    pub read_buffer_size: usize,
    /// Size of the blocking thread pool used for pooled actions by [`Server::run`].
    pub worker_threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { limits: ParserLimits::default(), read_buffer_size: 8 * 1024, worker_threads: 4 }
    }
}

pub struct ServerBuilder {
    router: Option<Router>,
    config: ServerConfig,
    decoders: BodyDecoders,
    subscriber: Option<Dispatch>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { router: None, config: ServerConfig::default(), decoders: BodyDecoders::default(), subscriber: None }
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn limits(mut self, limits: ParserLimits) -> Self {
        self.config.limits = limits;
        self
    }

    /// Replaces the body decoders, JSON only by default.
    pub fn body_decoders(mut self, decoders: BodyDecoders) -> Self {
        self.decoders = decoders;
        self
    }

    /// Logger of the server: the accept loop, every connection and the pooled
    /// actions they start log through it.
    ///
    /// Without one, events go to whatever subscriber is current where the
    /// server is polled.
    pub fn subscriber(mut self, subscriber: impl Into<Dispatch>) -> Self {
        self.subscriber = Some(subscriber.into());
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let router = self.router.ok_or(ServerBuildError::MissingRouter)?;
        let factory = HttpReaderFactory::with_config(router, self.config.limits, self.decoders);
        let tcp = TcpServer::new(factory).read_buffer_size(self.config.read_buffer_size);
        Ok(Server { tcp, worker_threads: self.config.worker_threads, subscriber: self.subscriber })
    }
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder").field("router", &self.router).field("config", &self.config).finish_non_exhaustive()
    }
}

pub struct Server {
    tcp: TcpServer<HttpReaderFactory<Router>>,
    worker_threads: usize,
    subscriber: Option<Dispatch>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Runs the server on a new current-thread runtime, the control thread.
    ///
    /// Routing, handlers and response writes all run on the calling thread;
    /// pooled actions run on the runtime's blocking threads, at most
    /// `worker_threads` of them.
    pub fn run(&self, address: &str, port: u16) -> io::Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .max_blocking_threads(self.worker_threads.max(1))
            .build()?;
        runtime.block_on(self.listen(address, port))
    }

    /// Binds `address:port` and serves on the current runtime.
    pub async fn listen(&self, address: &str, port: u16) -> io::Result<()> {
        self.logged(async {
            info!(address, port, "http server listening");
            self.tcp.listen(address, port).await
        })
        .await
    }

    /// Serves an already bound listener on the current runtime.
    pub async fn serve(&self, listener: TcpListener) -> io::Result<()> {
        self.logged(self.tcp.serve(listener)).await
    }

    async fn logged<T>(&self, future: impl Future<Output = T>) -> T {
        match &self.subscriber {
            Some(subscriber) => future.with_subscriber(subscriber.clone()).await,
            None => future.await,
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server").field("worker_threads", &self.worker_threads).finish_non_exhaustive()
    }
}
