use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::ResponseEncoder;
use crate::connection::ConnectionWriter;
use crate::protocol::{Response, SendError};

const INIT_RESPONSE_SIZE: usize = 1024;

/// The only way to answer a request.
///
/// [`send`](ResponseWriter::send) consumes the writer, so a connection gets
/// exactly one response, and closes the connection once the bytes are out.
pub struct ResponseWriter {
    writer: Box<dyn ConnectionWriter>,
    encoder: ResponseEncoder,
}

impl ResponseWriter {
    pub fn new(writer: Box<dyn ConnectionWriter>) -> Self {
        Self { writer, encoder: ResponseEncoder::new() }
    }

    pub async fn send(mut self, response: Response) -> Result<(), SendError> {
        let status = response.status_code();
        let mut buffer = BytesMut::with_capacity(INIT_RESPONSE_SIZE);
        self.encoder.encode(response, &mut buffer)?;

        trace!(status = status.as_u16(), len = buffer.len(), "write response");
        self.writer.write(buffer.freeze()).await?;
        self.writer.close().await
    }
}

impl std::fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseWriter").finish_non_exhaustive()
    }
}
