//! The raw outcome of one transport attempt.

use http::{HeaderMap, StatusCode};

/// One transport exchange's result: status, headers, and the raw body bytes.
///
/// Produced once per attempt by the transport adapter and consumed
/// immediately by the response mapper; never retained by the runtime except
/// inside [`Error::Call`](crate::Error::Call) for debugging.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The raw body bytes, or `None` when the response carried no body.
    pub body: Option<Vec<u8>>,
    /// The response media type, parsed from the Content-Type header with
    /// parameters stripped.
    pub content_type: Option<String>,
}

impl ResponseEnvelope {
    /// Creates an envelope, deriving `content_type` from the headers.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Option<Vec<u8>>) -> Self {
        let content_type = parse_content_type(&headers);
        Self {
            status,
            headers,
            body,
            content_type,
        }
    }

    /// Returns `true` when the body is absent or zero-length.
    pub fn body_is_empty(&self) -> bool {
        self.body.as_ref().map_or(true, |b| b.is_empty())
    }

    /// Returns a header value by name, when present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

/// Extracts the media type from the Content-Type header, stripping
/// parameters like `; charset=utf-8`.
pub(crate) fn parse_content_type(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(http::header::CONTENT_TYPE)?.to_str().ok()?;
    let base = raw.split(';').next().unwrap_or(raw).trim();
    if base.is_empty() {
        None
    } else {
        Some(base.to_ascii_lowercase())
    }
}
