use std::io;
use thiserror::Error;

/// Terminal failures of the request parser.
///
/// Every variant ends parsing for the connection: the caller answers with
/// `400 Bad Request` and closes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("url exceeds the limit of {max_size} bytes")]
    UrlTooLong { max_size: usize },

    #[error("header field exceeds the limit of {max_size} bytes")]
    HeaderFieldTooLarge { max_size: usize },

    #[error("header value exceeds the limit of {max_size} bytes")]
    HeaderValueTooLarge { max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("body size {current_size} exceed the limit {max_size}")]
    BodyTooLarge { current_size: u64, max_size: usize },

    #[error("invalid http method")]
    InvalidMethod,

    #[error("unsupported http method: {0}")]
    UnsupportedMethod(String),

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("transfer-encoding is not supported")]
    UnsupportedTransferEncoding,

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("parser already failed")]
    Aborted,
}

impl ParseError {
    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Failure to convert route captures into typed values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("expected {expected} url captures, found {found}")]
    Arity { expected: usize, found: usize },

    #[error("url capture #{index} '{value}' is not a valid {kind}")]
    Invalid { index: usize, value: String, kind: &'static str },
}
