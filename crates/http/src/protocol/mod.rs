//! Request and response data model.
//!
//! - [`Request`]: url, method, headers, url captures and an optional decoded [`Body`]
//! - [`Headers`]: the request header multimap, names kept as received
//! - [`Body`] / [`BodyDecoder`] / [`BodyDecoders`]: body variants and the decoders producing them
//! - [`Response`]: status, unique headers and a text message
//! - [`status`]: reason phrase table used for the status line
//! - Errors: [`ParseError`] for malformed input, [`SendError`] for write failures,
//!   [`CaptureError`] for typed capture conversion

mod body;
pub use body::Body;
pub use body::BodyDecoder;
pub use body::BodyDecoders;
pub use body::JsonDecoder;

pub mod captures;
pub use captures::FromCapture;
pub use captures::FromCaptures;

mod headers;
pub use headers::Headers;

mod method;
pub use method::Method;

mod request;
pub use request::Request;

mod response;
pub use response::Response;

pub mod status;

mod error;
pub use error::CaptureError;
pub use error::ParseError;
pub use error::SendError;
