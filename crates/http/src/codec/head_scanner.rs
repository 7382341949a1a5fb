//! Byte-at-a-time scanner over the request line and header section.
//!
//! The scanner does not build anything; it tracks which token the current
//! byte belongs to and how long that token has grown so the configured
//! bounds are enforced on partial input, and it reports where the head ends.
//! State survives across calls, so the outcome does not depend on how the
//! bytes were chunked.

use crate::codec::ParserLimits;
use crate::ensure;
use crate::protocol::ParseError;
use HeadState::*;

/// Longest method token accepted before the request line is rejected.
const MAX_METHOD_SIZE: usize = 16;

/// Longest protocol version token, `HTTP/1.1` with room to spare.
const MAX_VERSION_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadState {
    /// Read the method token
    Method,
    /// Read the request target
    Url,
    /// Read the protocol version up to the end of the request line
    Version,
    /// Start of a header line, or the blank line closing the head
    LineStart,
    /// Read a header field name
    Field,
    /// Skip whitespace between the colon and the value
    ValueLws,
    /// Read a header value
    Value,
    /// The blank line has been read
    End,
}

#[derive(Debug, Clone)]
pub(crate) struct HeadScanner {
    state: HeadState,
    token_size: usize,
    header_count: usize,
}

impl HeadScanner {
    pub(crate) fn new() -> Self {
        Self { state: Method, token_size: 0, header_count: 0 }
    }

    pub(crate) fn header_count(&self) -> usize {
        self.header_count
    }

    /// Scans `src` and returns the number of bytes belonging to the head once
    /// its closing blank line is seen, `None` if more input is needed.
    pub(crate) fn scan(&mut self, src: &[u8], limits: &ParserLimits) -> Result<Option<usize>, ParseError> {
        for (index, &byte) in src.iter().enumerate() {
            self.state = self.step(byte, limits)?;
            if self.state == End {
                return Ok(Some(index + 1));
            }
        }
        Ok(None)
    }

    fn step(&mut self, byte: u8, limits: &ParserLimits) -> Result<HeadState, ParseError> {
        let next = match (self.state, byte) {
            (Method, b' ') => self.begin(Url),
            (Method, b'\r' | b'\n') => return Err(ParseError::InvalidMethod),
            (Method, _) => self.extend(Method, MAX_METHOD_SIZE).ok_or(ParseError::InvalidMethod)?,

            (Url, b' ') => self.begin(Version),
            (Url, b'\r' | b'\n') => return Err(ParseError::invalid_header("request line without version")),
            (Url, _) => self
                .extend(Url, limits.max_url_size)
                .ok_or(ParseError::UrlTooLong { max_size: limits.max_url_size })?,

            (Version, b'\r') => Version,
            (Version, b'\n') => self.begin(LineStart),
            (Version, _) => self
                .extend(Version, MAX_VERSION_SIZE)
                .ok_or_else(|| ParseError::invalid_header("http version too long"))?,

            (LineStart, b'\r') => LineStart,
            (LineStart, b'\n') => End,
            (LineStart, b':') => return Err(ParseError::invalid_header("empty header field")),
            (LineStart, _) => {
                self.token_size = 0;
                self.extend(Field, limits.max_header_field_size)
                    .ok_or(ParseError::HeaderFieldTooLarge { max_size: limits.max_header_field_size })?
            }

            (Field, b':') => self.begin(ValueLws),
            (Field, b'\r' | b'\n') => return Err(ParseError::invalid_header("header line without colon")),
            (Field, _) => self
                .extend(Field, limits.max_header_field_size)
                .ok_or(ParseError::HeaderFieldTooLarge { max_size: limits.max_header_field_size })?,

            (ValueLws, b' ' | b'\t' | b'\r') => ValueLws,
            (ValueLws, b'\n') => self.end_header(limits)?,
            (ValueLws, _) => {
                self.token_size = 0;
                self.extend(Value, limits.max_header_value_size)
                    .ok_or(ParseError::HeaderValueTooLarge { max_size: limits.max_header_value_size })?
            }

            (Value, b'\r') => Value,
            (Value, b'\n') => self.end_header(limits)?,
            (Value, _) => self
                .extend(Value, limits.max_header_value_size)
                .ok_or(ParseError::HeaderValueTooLarge { max_size: limits.max_header_value_size })?,

            (End, _) => End,
        };

        Ok(next)
    }

    #[inline]
    fn begin(&mut self, state: HeadState) -> HeadState {
        self.token_size = 0;
        state
    }

    #[inline]
    fn extend(&mut self, state: HeadState, max_size: usize) -> Option<HeadState> {
        self.token_size += 1;
        (self.token_size <= max_size).then_some(state)
    }

    fn end_header(&mut self, limits: &ParserLimits) -> Result<HeadState, ParseError> {
        self.header_count += 1;
        ensure!(self.header_count <= limits.max_headers, ParseError::TooManyHeaders { max_num: limits.max_headers });
        Ok(self.begin(LineStart))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(input: &[u8]) -> Result<Option<usize>, ParseError> {
        HeadScanner::new().scan(input, &ParserLimits::default())
    }

    #[test]
    fn finds_end_of_head() {
        let input = b"GET / HTTP/1.1\r\nHost: x\r\n\r\nbody";
        assert_eq!(scan_all(input), Ok(Some(input.len() - 4)));
    }

    #[test]
    fn accepts_bare_line_feeds() {
        let input = b"GET / HTTP/1.1\nHost: x\n\n";
        assert_eq!(scan_all(input), Ok(Some(input.len())));
    }

    #[test]
    fn needs_more_input() {
        assert_eq!(scan_all(b"GET / HTTP/1.1\r\nHost: x\r\n"), Ok(None));
    }

    #[test]
    fn counts_headers_with_empty_values() {
        let mut scanner = HeadScanner::new();
        let result = scanner.scan(b"GET / HTTP/1.1\r\nX-Empty:\r\nHost: x\r\n\r\n", &ParserLimits::default());
        assert!(matches!(result, Ok(Some(_))));
        assert_eq!(scanner.header_count(), 2);
    }

    #[test]
    fn url_at_limit_is_accepted() {
        let limits = ParserLimits { max_url_size: 4, ..ParserLimits::default() };
        let mut scanner = HeadScanner::new();
        assert!(scanner.scan(b"GET /abc HTTP/1.1\r\n\r\n", &limits).is_ok());

        let mut scanner = HeadScanner::new();
        assert_eq!(scanner.scan(b"GET /abcd", &limits), Err(ParseError::UrlTooLong { max_size: 4 }));
    }

    #[test]
    fn header_line_without_colon() {
        assert!(matches!(scan_all(b"GET / HTTP/1.1\r\nbroken\r\n\r\n"), Err(ParseError::InvalidHeader { .. })));
    }
}
