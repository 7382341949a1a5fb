//! Incremental HTTP request parser.
//!
//! The parser is fed raw byte chunks as they arrive on a connection. It goes
//! through two phases:
//!
//! 1. Head: bytes are checked by [`HeadScanner`] against the configured
//!    [`ParserLimits`] and buffered until the blank line closing the header
//!    section; the buffered head is then parsed with `httparse`.
//! 2. Body: `Content-Length` bytes are accumulated, then decoded through the
//!    [`BodyDecoders`] registry according to `Content-Type`.
//!
//! Reaching the end of the message sets the parser to done exactly once; any
//! error is terminal and every later [`RequestParser::feed`] reports
//! [`ParseError::Aborted`].
//!
//! # Example
//!
//! ```
//! use relay_http::codec::RequestParser;
//! use relay_http::protocol::Method;
//!
//! let mut parser = RequestParser::new();
//! parser.feed(b"GET /api/exa").unwrap();
//! assert!(!parser.is_done());
//!
//! parser.feed(b"mple HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
//! let request = parser.take_request().unwrap();
//! assert_eq!(request.method(), Method::Get);
//! assert_eq!(request.url(), "/api/example");
//! ```

use bytes::BytesMut;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
use httparse::Status;
use std::mem;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::codec::head_scanner::HeadScanner;
use crate::codec::ParserLimits;
use crate::ensure;
use crate::protocol::{BodyDecoders, Headers, Method, ParseError, Request};

#[derive(Debug)]
pub struct RequestParser {
    limits: ParserLimits,
    decoders: Arc<BodyDecoders>,
    scanner: HeadScanner,
    head: BytesMut,
    body: BytesMut,
    state: ParserState,
}

#[derive(Debug)]
enum ParserState {
    Head,
    Body { head: RequestHead, remaining: usize },
    /// Holds the request until it is taken.
    Done(Option<Request>),
    Failed,
}

#[derive(Debug)]
struct RequestHead {
    method: Method,
    url: String,
    headers: Headers,
}

impl RequestParser {
    /// Creates a parser with default limits and the default (JSON) body decoders.
    pub fn new() -> Self {
        Self::with_config(ParserLimits::default(), Arc::new(BodyDecoders::default()))
    }

    pub fn with_config(limits: ParserLimits, decoders: Arc<BodyDecoders>) -> Self {
        Self {
            limits,
            decoders,
            scanner: HeadScanner::new(),
            head: BytesMut::new(),
            body: BytesMut::new(),
            state: ParserState::Head,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, ParserState::Done(_))
    }

    /// Takes the completed request; `None` before completion or once taken.
    pub fn take_request(&mut self) -> Option<Request> {
        match &mut self.state {
            ParserState::Done(request) => request.take(),
            _ => None,
        }
    }

    /// Feeds the next chunk of bytes received on the connection.
    ///
    /// Bytes fed after completion are ignored, only one request is read per
    /// connection.
    pub fn feed(&mut self, data: &[u8]) -> Result<(), ParseError> {
        match self.state {
            ParserState::Done(_) => {
                trace!(len = data.len(), "request already complete, ignore bytes");
                return Ok(());
            }
            ParserState::Failed => return Err(ParseError::Aborted),
            ParserState::Head | ParserState::Body { .. } => {}
        }

        trace!(len = data.len(), "feed request bytes");
        let result = self.advance(data);
        if let Err(e) = &result {
            debug!(cause = %e, "request parse failed");
            self.state = ParserState::Failed;
        }
        result
    }

    fn advance(&mut self, mut data: &[u8]) -> Result<(), ParseError> {
        if matches!(self.state, ParserState::Head) {
            let Some(head_size) = self.scanner.scan(data, &self.limits)? else {
                self.head.extend_from_slice(data);
                return Ok(());
            };

            self.head.extend_from_slice(&data[..head_size]);
            data = &data[head_size..];

            let (head, content_length) = self.parse_head()?;
            trace!(content_length, "parsed request head");
            self.state = ParserState::Body { head, remaining: content_length };
        }

        if let ParserState::Body { remaining, .. } = &mut self.state {
            let size = (*remaining).min(data.len());
            self.body.extend_from_slice(&data[..size]);
            *remaining -= size;

            if size < data.len() {
                trace!(extra = data.len() - size, "ignore bytes past the end of the request");
            }

            if *remaining == 0 {
                self.complete()?;
            }
        }

        Ok(())
    }

    fn parse_head(&self) -> Result<(RequestHead, usize), ParseError> {
        let mut raw_headers = vec![httparse::EMPTY_HEADER; self.scanner.header_count()];
        let mut req = httparse::Request::new(&mut raw_headers);

        match req.parse(&self.head).map_err(ParseError::invalid_header)? {
            Status::Complete(_) => {}
            Status::Partial => return Err(ParseError::invalid_header("incomplete request head")),
        }

        let method = req.method.ok_or(ParseError::InvalidMethod)?.parse::<Method>()?;
        let url = req.path.ok_or_else(|| ParseError::invalid_header("missing request target"))?.to_string();

        let mut headers = Headers::with_capacity(req.headers.len());
        for header in req.headers.iter() {
            let value = std::str::from_utf8(header.value)
                .map_err(|e| ParseError::invalid_header(format!("value of '{}' is not utf-8: {e}", header.name)))?;
            trace!(name = header.name, value, "parsed header");
            headers.insert(header.name, value);
        }

        let content_length = content_length(&headers, &self.limits)?;
        Ok((RequestHead { method, url, headers }, content_length))
    }

    fn complete(&mut self) -> Result<(), ParseError> {
        let ParserState::Body { head, .. } = mem::replace(&mut self.state, ParserState::Failed) else {
            return Err(ParseError::Aborted);
        };

        let raw = mem::take(&mut self.body).freeze();
        let body = match head.headers.get_ignore_case(CONTENT_TYPE.as_str()) {
            Some(content_type) if !raw.is_empty() => Some(self.decoders.decode(content_type, raw)?),
            _ => None,
        };

        debug!(method = %head.method, url = %head.url, "request complete");
        self.head.clear();
        self.state = ParserState::Done(Some(Request::from_parts(head.method, head.url, head.headers, body)));
        Ok(())
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Size of the body announced by the head.
///
/// Bodies are framed by `Content-Length` only; chunked transfer coding is
/// rejected.
fn content_length(headers: &Headers, limits: &ParserLimits) -> Result<usize, ParseError> {
    ensure!(!headers.contains_ignore_case(TRANSFER_ENCODING.as_str()), ParseError::UnsupportedTransferEncoding);

    let Some(value) = headers.get_ignore_case(CONTENT_LENGTH.as_str()) else {
        return Ok(0);
    };

    let length = value
        .trim()
        .parse::<u64>()
        .map_err(|e| ParseError::invalid_content_length(format!("value {value} is not u64: {e}")))?;

    let too_large = ParseError::BodyTooLarge { current_size: length, max_size: limits.max_body_size };
    let length = usize::try_from(length).map_err(|_| too_large.clone())?;
    ensure!(length <= limits.max_body_size, too_large);
    Ok(length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Body;
    use indoc::indoc;

    const JSON_REQUEST: &str = concat!(
        "POST /api/part/42/bob HTTP/1.1\r\n",
        "Host: 127.0.0.1:5000\r\n",
        "Content-Type: application/json\r\n",
        "Content-Length: 33\r\n",
        "\r\n",
        r#"{"username":"u","password":"p"}  "#,
    );

    fn parse(input: &[u8]) -> Result<Request, ParseError> {
        let mut parser = RequestParser::new();
        parser.feed(input)?;
        assert!(parser.is_done(), "input should hold a complete request");
        Ok(parser.take_request().unwrap())
    }

    #[test]
    fn parse_get_without_body() {
        let str = indoc! {r##"
        GET /api/example HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##};

        let request = parse(str.as_bytes()).unwrap();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url(), "/api/example");
        assert_eq!(request.headers().len(), 3);
        assert_eq!(request.headers().get("Host"), Some("127.0.0.1:8080"));
        assert_eq!(request.headers().get("User-Agent"), Some("curl/7.79.1"));
        assert_eq!(request.headers().get("Accept"), Some("*/*"));
        assert!(request.body().is_none());
        assert!(request.url_captures().is_empty());
    }

    #[test]
    fn parse_json_body() {
        let request = parse(JSON_REQUEST.as_bytes()).unwrap();

        assert_eq!(request.method(), Method::Post);
        let json = request.body().and_then(Body::as_json).unwrap();
        assert_eq!(json["username"], "u");
        assert_eq!(json["password"], "p");
    }

    #[test]
    fn every_split_point_gives_the_same_request() {
        let expected = parse(JSON_REQUEST.as_bytes()).unwrap();
        let bytes = JSON_REQUEST.as_bytes();

        for split in 0..=bytes.len() {
            let mut parser = RequestParser::new();
            parser.feed(&bytes[..split]).unwrap();
            parser.feed(&bytes[split..]).unwrap();
            assert_eq!(parser.take_request().as_ref(), Some(&expected), "split at {split}");
        }
    }

    #[test]
    fn byte_by_byte_gives_the_same_request() {
        let expected = parse(JSON_REQUEST.as_bytes()).unwrap();

        let mut parser = RequestParser::new();
        for byte in JSON_REQUEST.as_bytes() {
            assert!(!parser.is_done());
            parser.feed(std::slice::from_ref(byte)).unwrap();
        }
        assert_eq!(parser.take_request(), Some(expected));
    }

    #[test]
    fn long_url_fails_before_done() {
        let url = format!("/{}", "a".repeat(128));
        let mut parser = RequestParser::new();

        let result = parser.feed(format!("GET {url}").as_bytes());

        assert_eq!(result, Err(ParseError::UrlTooLong { max_size: 128 }));
        assert!(!parser.is_done());
        assert_eq!(parser.feed(b" HTTP/1.1\r\n\r\n"), Err(ParseError::Aborted));
        assert!(parser.take_request().is_none());
    }

    #[test]
    fn long_header_value_fails() {
        let value = "v".repeat(2049);
        let input = format!("GET / HTTP/1.1\r\nX-Big: {value}\r\n\r\n");

        assert_eq!(parse(input.as_bytes()), Err(ParseError::HeaderValueTooLarge { max_size: 2048 }));
    }

    #[test]
    fn header_value_at_limit_is_accepted() {
        let value = "v".repeat(2048);
        let input = format!("GET / HTTP/1.1\r\nX-Big: {value}\r\n\r\n");

        let request = parse(input.as_bytes()).unwrap();
        assert_eq!(request.headers().get("X-Big").map(str::len), Some(2048));
    }

    #[test]
    fn long_header_field_fails() {
        let field = "F".repeat(129);
        let input = format!("GET / HTTP/1.1\r\n{field}: v\r\n\r\n");

        assert_eq!(parse(input.as_bytes()), Err(ParseError::HeaderFieldTooLarge { max_size: 128 }));
    }

    #[test]
    fn too_many_headers_fail() {
        let limits = ParserLimits { max_headers: 2, ..ParserLimits::default() };
        let mut parser = RequestParser::with_config(limits, Arc::new(BodyDecoders::default()));

        let result = parser.feed(b"GET / HTTP/1.1\r\nA: 1\r\nB: 2\r\nC: 3\r\n\r\n");
        assert_eq!(result, Err(ParseError::TooManyHeaders { max_num: 2 }));
    }

    #[test]
    fn unsupported_method_fails() {
        let result = parse(b"PUT /api/example HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(result, Err(ParseError::UnsupportedMethod("PUT".into())));
    }

    #[test]
    fn malformed_json_fails() {
        let input = "POST / HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: 5\r\n\r\n{\"a\":";
        assert!(matches!(parse(input.as_bytes()), Err(ParseError::InvalidBody { .. })));
    }

    #[test]
    fn empty_json_body_is_none() {
        let request = parse(b"POST / HTTP/1.1\r\nContent-Type: application/json\r\n\r\n").unwrap();
        assert!(request.body().is_none());
    }

    #[test]
    fn unknown_content_type_keeps_raw_bytes() {
        let request = parse(b"POST / HTTP/1.1\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello").unwrap();
        assert!(matches!(request.body(), Some(Body::Unknown(raw)) if raw.as_ref() == b"hello"));
    }

    #[test]
    fn body_without_content_type_is_none() {
        let request = parse(b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello").unwrap();
        assert!(request.body().is_none());
    }

    #[test]
    fn chunked_transfer_encoding_fails() {
        let result = parse(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n0\r\n\r\n");
        assert_eq!(result, Err(ParseError::UnsupportedTransferEncoding));
    }

    #[test]
    fn oversized_content_length_fails() {
        let result = parse(b"POST / HTTP/1.1\r\nContent-Length: 2000000\r\n\r\n");
        assert_eq!(result, Err(ParseError::BodyTooLarge { current_size: 2_000_000, max_size: 1024 * 1024 }));
    }

    #[test]
    fn invalid_content_length_fails() {
        let result = parse(b"POST / HTTP/1.1\r\nContent-Length: ten\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidContentLength { .. })));
    }

    #[test]
    fn invalid_version_fails() {
        let result = parse(b"GET / HTTP/2.0\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidHeader { .. })));
    }

    #[test]
    fn bytes_after_completion_are_ignored() {
        let mut parser = RequestParser::new();
        parser.feed(b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n").unwrap();
        parser.feed(b"garbage").unwrap();

        assert!(parser.is_done());
        assert_eq!(parser.take_request().unwrap().url(), "/a");
        assert!(parser.take_request().is_none());
    }
}
