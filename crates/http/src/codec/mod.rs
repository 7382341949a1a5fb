//! Request parsing and response serialization.
//!
//! - [`RequestParser`]: incremental parser fed with raw chunks, bounded by [`ParserLimits`]
//! - [`ResponseEncoder`]: `tokio_util` encoder writing a [`Response`](crate::protocol::Response)
//!   in wire format

mod head_scanner;

mod limits;
pub use limits::ParserLimits;

mod request_parser;
pub use request_parser::RequestParser;

mod response_encoder;
pub use response_encoder::ResponseEncoder;
