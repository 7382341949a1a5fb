use async_trait::async_trait;
use http::StatusCode;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

use crate::codec::{ParserLimits, RequestParser};
use crate::connection::{ConnectionReader, ConnectionWriter, ReadState, ReaderFactory, ResponseWriter};
use crate::handler::Dispatcher;
use crate::protocol::{BodyDecoders, Response};

/// Reads a single HTTP request from a connection.
///
/// Bytes are fed to a private [`RequestParser`]. A completed request is moved
/// into the dispatcher together with the connection's [`ResponseWriter`]; a
/// parse error is answered with `400 Bad Request` right away. Either way the
/// connection counts as answered and any further bytes are ignored.
pub struct HttpReader<D> {
    parser: RequestParser,
    writer: Option<ResponseWriter>,
    dispatcher: Arc<D>,
}

impl<D: Dispatcher> HttpReader<D> {
    pub fn new(parser: RequestParser, writer: ResponseWriter, dispatcher: Arc<D>) -> Self {
        Self { parser, writer: Some(writer), dispatcher }
    }

    pub fn is_answered(&self) -> bool {
        self.writer.is_none()
    }
}

#[async_trait]
impl<D: Dispatcher> ConnectionReader for HttpReader<D> {
    async fn read(&mut self, data: &[u8]) -> ReadState {
        if self.is_answered() {
            trace!(len = data.len(), "connection already answered, ignore bytes");
            return ReadState::Stop;
        }

        if let Err(e) = self.parser.feed(data) {
            warn!(cause = %e, "can't parse request, send bad request");
            if let Some(writer) = self.writer.take() {
                let response = Response::new().status(StatusCode::BAD_REQUEST).with_default_status_message();
                if let Err(e) = writer.send(response).await {
                    error!(cause = %e, "send bad request response error");
                }
            }
            return ReadState::Stop;
        }

        let Some(request) = self.parser.take_request() else {
            return ReadState::Continue;
        };

        match self.writer.take() {
            Some(writer) => {
                debug!(method = %request.method(), url = request.url(), "dispatch request");
                self.dispatcher.dispatch(request, writer).await;
            }
            None => error!("request completed on an answered connection"),
        }
        ReadState::Stop
    }
}

impl<D> fmt::Debug for HttpReader<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpReader")
            .field("parser", &self.parser)
            .field("answered", &self.writer.is_none())
            .finish_non_exhaustive()
    }
}

/// Creates an [`HttpReader`] per connection, all sharing one dispatcher.
pub struct HttpReaderFactory<D> {
    limits: ParserLimits,
    decoders: Arc<BodyDecoders>,
    dispatcher: Arc<D>,
}

impl<D: Dispatcher> HttpReaderFactory<D> {
    pub fn new(dispatcher: D) -> Self {
        Self::with_config(dispatcher, ParserLimits::default(), BodyDecoders::default())
    }

    pub fn with_config(dispatcher: D, limits: ParserLimits, decoders: BodyDecoders) -> Self {
        Self { limits, decoders: Arc::new(decoders), dispatcher: Arc::new(dispatcher) }
    }
}

impl<D> fmt::Debug for HttpReaderFactory<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpReaderFactory").field("limits", &self.limits).finish_non_exhaustive()
    }
}

impl<D: Dispatcher> ReaderFactory for HttpReaderFactory<D> {
    type Reader = HttpReader<D>;

    fn create(&self, writer: Box<dyn ConnectionWriter>) -> Self::Reader {
        let parser = RequestParser::with_config(self.limits, Arc::clone(&self.decoders));
        HttpReader::new(parser, ResponseWriter::new(writer), Arc::clone(&self.dispatcher))
    }

    fn destroy(&self, reader: Self::Reader) {
        if !reader.is_answered() {
            debug!("connection closed before a request was read");
        }
        drop(reader);
    }
}
