use crate::protocol::{HeaderMap, Method, Url};

/// A parsed request.
///
/// Everything in here is a view into the buffer the request was parsed
/// from, except for the normalized URL path. The server parses the header
/// block into the session's header buffer and binds `body` either to the
/// tail of that buffer or, when the body outgrew the initial read, to the
/// session's separate body buffer. The request is only valid while those
/// buffers are untouched, which the borrow checker enforces.
#[derive(Debug, Clone)]
pub struct Request<'a> {
    pub method: Method,
    pub url: Url<'a>,
    /// `"HTTP/1.0"` or `"HTTP/1.1"`, as received.
    pub version: &'a str,
    /// The full first line, kept for access logging.
    pub request_line: &'a str,
    pub headers: HeaderMap<&'a str>,
    pub body: &'a [u8],
}

impl<'a> Request<'a> {
    /// The raw `Content-Length` value, if the header is present. Parsing
    /// and validating the value is the caller's concern.
    pub fn content_length(&self) -> Option<&str> {
        self.headers.get("Content-Length")
    }
}
