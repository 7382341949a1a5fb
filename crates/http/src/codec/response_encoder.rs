//! Response serialization.
//!
//! Writes a [`Response`] in the wire format
//! `HTTP/1.1 <code> <reason>\r\n(<name>: <value>\r\n)*\r\n[<message>\r\n]`.
//! Header names go out lower-cased, as [`http::HeaderName`] stores them.
//! `Content-Type` and `Connection` are filled in when the response does not
//! set them; no `Content-Length` is written since the connection is closed
//! right after the response.

use crate::protocol::status::status_line;
use crate::protocol::{Response, SendError};

use bytes::{BufMut, BytesMut};
use http::header::{CONNECTION, CONTENT_TYPE};
use http::HeaderValue;
use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;
use tracing::warn;

/// Initial buffer size allocated for the status line and headers
const INIT_HEAD_SIZE: usize = 1024;

pub(crate) const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

#[derive(Debug, Default)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<Response> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, mut item: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let headers = item.headers_mut();
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        }
        if !headers.contains_key(CONNECTION) {
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
        }

        let (status, reason) = status_line(item.status_code());
        if status != item.status_code() {
            warn!(status = item.status_code().as_u16(), "status code without reason phrase, send 500 instead");
        }

        dst.reserve(INIT_HEAD_SIZE + item.message().len());
        write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", status.as_str(), reason)?;

        for (name, value) in item.headers() {
            dst.put_slice(name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(value.as_ref());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");

        if !item.message().is_empty() {
            dst.put_slice(item.message().as_bytes());
            dst.put_slice(b"\r\n");
        }
        Ok(())
    }
}

/// `io::Write` over a `BytesMut` so the status line can use `write!`.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
