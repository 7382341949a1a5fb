use serde::Deserialize;

/// Byte bounds enforced by the request parser.
///
/// Crossing any of them is a terminal parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserLimits {
    pub max_url_size: usize,
    pub max_header_field_size: usize,
    pub max_header_value_size: usize,
    pub max_headers: usize,
    pub max_body_size: usize,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_url_size: 128,
            max_header_field_size: 128,
            max_header_value_size: 2048,
            max_headers: 64,
            max_body_size: 1024 * 1024,
        }
    }
}
