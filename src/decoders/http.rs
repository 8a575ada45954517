//! HTTP request heuristic for TCP payloads.

use crate::packet::HttpRequest;

const METHODS: &[&str] = &[
    "GET", "POST", "HEAD", "PUT", "DELETE", "OPTIONS", "CONNECT", "TRACE", "PATCH",
];

/// Parse the request line if `payload` starts like an HTTP request.
///
/// Only the method is required: `GET ` followed by anything qualifies, so a
/// request split across segments is still recognised on its first one.
pub fn parse_request_line(payload: &[u8]) -> Option<HttpRequest> {
    let space = payload.iter().position(|&b| b == b' ')?;
    let method = std::str::from_utf8(&payload[..space]).ok()?;

    if !METHODS.contains(&method) {
        return None;
    }

    let line_end = payload
        .windows(2)
        .position(|w| w == b"\r\n")
        .or_else(|| payload.iter().position(|&b| b == b'\n'))
        .unwrap_or(payload.len());

    let rest = if line_end > space {
        String::from_utf8_lossy(&payload[space + 1..line_end])
    } else {
        Default::default()
    };
    let mut parts = rest.split_whitespace();

    Some(HttpRequest {
        method: method.to_string(),
        uri: parts.next().map(str::to_string),
        version: parts.next().map(str::to_string),
    })
}
