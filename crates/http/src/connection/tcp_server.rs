use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::fmt;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{BytesCodec, FramedRead, FramedWrite};
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::connection::{ConnectionReader, ConnectionWriter, ReadState, ReaderFactory};
use crate::protocol::SendError;

const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// [`ConnectionWriter`] over the write half of a stream.
pub struct StreamWriter<W> {
    framed_write: FramedWrite<W, BytesCodec>,
}

impl<W> StreamWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self { framed_write: FramedWrite::new(writer, BytesCodec::new()) }
    }
}

#[async_trait]
impl<W> ConnectionWriter for StreamWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, data: Bytes) -> Result<(), SendError> {
        // feed instead of send, the bytes are flushed on close
        self.framed_write.feed(data).await.map_err(SendError::io)
    }

    async fn close(&mut self) -> Result<(), SendError> {
        SinkExt::<Bytes>::close(&mut self.framed_write).await.map_err(SendError::io)
    }
}

impl<W> fmt::Debug for StreamWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamWriter").finish_non_exhaustive()
    }
}

/// One accepted connection, read until its reader stops or the peer closes.
pub struct Connection<R, W> {
    framed_read: FramedRead<R, BytesCodec>,
    writer: W,
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_capacity(reader, writer, DEFAULT_READ_BUFFER_SIZE)
    }

    pub fn with_capacity(reader: R, writer: W, read_buffer_size: usize) -> Self {
        Self { framed_read: FramedRead::with_capacity(reader, BytesCodec::new(), read_buffer_size), writer }
    }

    pub async fn process<F: ReaderFactory>(self, factory: &F) {
        let Self { mut framed_read, writer } = self;
        let mut reader = factory.create(Box::new(StreamWriter::new(writer)));

        loop {
            match framed_read.next().await {
                Some(Ok(bytes)) => {
                    if reader.read(&bytes).await == ReadState::Stop {
                        debug!("reader stopped, close connection");
                        break;
                    }
                }
                Some(Err(e)) => {
                    warn!(cause = %e, "read connection failed");
                    break;
                }
                None => {
                    debug!("peer closed connection");
                    break;
                }
            }
        }

        factory.destroy(reader);
    }
}

impl<R, W> fmt::Debug for Connection<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// Accept loop spawning one task per connection.
pub struct TcpServer<F> {
    factory: Arc<F>,
    read_buffer_size: usize,
}

impl<F: ReaderFactory> TcpServer<F> {
    pub fn new(factory: F) -> Self {
        Self { factory: Arc::new(factory), read_buffer_size: DEFAULT_READ_BUFFER_SIZE }
    }

    pub fn read_buffer_size(mut self, read_buffer_size: usize) -> Self {
        self.read_buffer_size = read_buffer_size;
        self
    }

    /// Binds `address:port` and serves until the listener fails to bind.
    pub async fn listen(&self, address: &str, port: u16) -> io::Result<()> {
        let listener = TcpListener::bind((address, port)).await.inspect_err(|e| {
            error!(cause = %e, address, port, "bind server error");
        })?;
        self.serve(listener).await
    }

    pub async fn serve(&self, listener: TcpListener) -> io::Result<()> {
        info!(address = %listener.local_addr()?, "start listening");

        loop {
            let (tcp_stream, remote_addr) = match listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let factory = Arc::clone(&self.factory);
            let read_buffer_size = self.read_buffer_size;
            let span = info_span!("connection", peer = %remote_addr);

            tokio::spawn(
                async move {
                    process_stream(tcp_stream, factory.as_ref(), read_buffer_size).await;
                    debug!("connection shutdown");
                }
                .instrument(span)
                .with_current_subscriber(),
            );
        }
    }
}

impl<F> fmt::Debug for TcpServer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpServer").field("read_buffer_size", &self.read_buffer_size).finish_non_exhaustive()
    }
}

async fn process_stream<F: ReaderFactory>(tcp_stream: TcpStream, factory: &F, read_buffer_size: usize) {
    let (reader, writer) = tcp_stream.into_split();
    Connection::with_capacity(reader, writer, read_buffer_size).process(factory).await;
}
