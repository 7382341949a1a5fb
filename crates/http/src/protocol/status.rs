use http::StatusCode;

/// Reason phrase for `status`.
///
/// Covers the IANA registry through [`StatusCode::canonical_reason`] plus the
/// few non-standard codes that are common in the wild.
pub fn reason_phrase(status: StatusCode) -> Option<&'static str> {
    status.canonical_reason().or(match status.as_u16() {
        306 => Some("Switch Proxy"),
        444 => Some("Connection Closed Without Response"),
        499 => Some("Client Closed Request"),
        599 => Some("Network Connect Timeout Error"),
        _ => None,
    })
}

/// The `<code> <reason>` text used in the status line.
///
/// Codes without a known reason fall back to `500 Internal Server Error`.
pub fn status_line(status: StatusCode) -> (StatusCode, &'static str) {
    match reason_phrase(status) {
        Some(reason) => (status, reason),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
    }
}
