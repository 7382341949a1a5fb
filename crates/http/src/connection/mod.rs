//! TCP connection layer.
//!
//! The layer owns sockets and never interprets the bytes flowing through
//! them. Each accepted connection gets a reader built by a [`ReaderFactory`]
//! around a fresh [`ConnectionWriter`]; the reader is fed raw chunks until it
//! answers [`ReadState::Stop`] or the peer closes, then handed back to the
//! factory's destroy hook.
//!
//! # Components
//!
//! - [`TcpServer`]: accept loop, one task per connection
//! - [`Connection`]: reads one connection and drives its reader
//! - [`StreamWriter`]: [`ConnectionWriter`] over any `AsyncWrite`
//! - [`HttpReader`] / [`HttpReaderFactory`]: the HTTP reader, parsing one
//!   request per connection and passing it to a [`Dispatcher`](crate::handler::Dispatcher)
//! - [`ResponseWriter`]: one-shot response sink handed to the dispatcher

use async_trait::async_trait;
use bytes::Bytes;

use crate::protocol::SendError;

mod http_connection;
pub use http_connection::HttpReader;
pub use http_connection::HttpReaderFactory;

mod response_writer;
pub use response_writer::ResponseWriter;

mod tcp_server;
pub use tcp_server::Connection;
pub use tcp_server::StreamWriter;
pub use tcp_server::TcpServer;

/// What the connection should do after a chunk was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    Continue,
    Stop,
}

/// Write side of a connection.
#[async_trait]
pub trait ConnectionWriter: Send {
    async fn write(&mut self, data: Bytes) -> Result<(), SendError>;

    /// Flushes pending bytes and shuts the write side down.
    async fn close(&mut self) -> Result<(), SendError>;
}

/// Per-connection consumer of raw bytes.
#[async_trait]
pub trait ConnectionReader: Send {
    async fn read(&mut self, data: &[u8]) -> ReadState;
}

/// Builds and tears down the reader of each accepted connection.
pub trait ReaderFactory: Send + Sync + 'static {
    type Reader: ConnectionReader;

    fn create(&self, writer: Box<dyn ConnectionWriter>) -> Self::Reader;

    /// Called once the connection is closed.
    fn destroy(&self, reader: Self::Reader) {
        drop(reader);
    }
}
