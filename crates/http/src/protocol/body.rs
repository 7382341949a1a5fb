//! Request body variants and the pluggable decoders that produce them.
//!
//! The parser accumulates the raw body bytes and, once the message is
//! complete, hands them to the first [`BodyDecoder`] in a [`BodyDecoders`]
//! registry that claims the request's `Content-Type`. A decoder that claims
//! the type but fails to decode it turns the request into a parse error.
//! Content types nobody claims are kept as [`Body::Unknown`].

use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::trace;

use crate::protocol::ParseError;

/// A decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Raw bytes of a content type no decoder handled.
    Unknown(Bytes),
    Json(serde_json::Value),
}

impl Body {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Unknown(_) => None,
        }
    }

    /// Deserializes a JSON body into `T`.
    ///
    /// Fails for non-JSON bodies as well as for JSON that does not fit `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ParseError> {
        match self {
            Body::Json(value) => T::deserialize(value).map_err(ParseError::invalid_body),
            Body::Unknown(_) => Err(ParseError::invalid_body("body is not json")),
        }
    }
}

/// A body decoder plug-in.
pub trait BodyDecoder: Send + Sync {
    /// Returns `None` when this decoder does not handle `content_type`.
    fn decode(&self, content_type: &str, raw: &Bytes) -> Option<Result<Body, ParseError>>;
}

/// Decodes `application/json` bodies with `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl BodyDecoder for JsonDecoder {
    fn decode(&self, content_type: &str, raw: &Bytes) -> Option<Result<Body, ParseError>> {
        if !content_type.starts_with(mime::APPLICATION_JSON.as_ref()) {
            return None;
        }

        let result = serde_json::from_slice(raw).map(Body::Json).map_err(ParseError::invalid_body);
        Some(result)
    }
}

/// Ordered set of body decoders; the first one that claims a content type wins.
pub struct BodyDecoders {
    decoders: Vec<Box<dyn BodyDecoder>>,
}

impl BodyDecoders {
    pub fn empty() -> Self {
        Self { decoders: Vec::new() }
    }

    pub fn with<D: BodyDecoder + 'static>(mut self, decoder: D) -> Self {
        self.decoders.push(Box::new(decoder));
        self
    }

    pub fn decode(&self, content_type: &str, raw: Bytes) -> Result<Body, ParseError> {
        for decoder in &self.decoders {
            if let Some(result) = decoder.decode(content_type, &raw) {
                return result;
            }
        }

        trace!(content_type, "no decoder for content type, keep raw body");
        Ok(Body::Unknown(raw))
    }
}

impl Default for BodyDecoders {
    fn default() -> Self {
        Self::empty().with(JsonDecoder)
    }
}

impl fmt::Debug for BodyDecoders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyDecoders").field("len", &self.decoders.len()).finish()
    }
}
