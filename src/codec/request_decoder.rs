//! Request parsing.
//!
//! The input is presumed to hold at least the full request header block.
//! The decoder produces a [`Request`] of views into that input; bodies are
//! not interpreted here, the caller assembles them from `Content-Length`.

use crate::codec::{decode_headers, find_crlf};
use crate::ensure;
use crate::protocol::{Method, ParseError, Request, Url};

/// Parses a request from `src`.
///
/// The request line must use exactly one SP between its three fields
/// (RFC 2616 §5.1); the scan for the space terminating the request-target
/// is bounded by `max_url_length`, so longer targets fail to parse.
pub fn decode_request(src: &[u8], max_url_length: usize) -> Result<Request<'_>, ParseError> {
    // e.g.: GET /foobar/barbar HTTP/1.1\r\nHost: example.org\r\n\r\n
    let line_end = find_crlf(src, 0).ok_or(ParseError::Incomplete)?;
    let request_line = std::str::from_utf8(&src[..line_end])
        .map_err(|_| ParseError::invalid_request_line("not valid utf-8"))?;

    let method_end = request_line
        .find(' ')
        .ok_or_else(|| ParseError::invalid_request_line("missing space after method"))?;
    let method = Method::parse(&request_line[..method_end]).ok_or(ParseError::InvalidMethod)?;

    let target_start = method_end + 1;
    ensure!(
        target_start < request_line.len(),
        ParseError::invalid_request_line("missing request-target")
    );

    // A target longer than the bound fails as if the delimiter were
    // missing. RFC 2616 3.2.1 would rather see a 414 here.
    let bounded = &request_line[target_start..];
    let bounded = &bounded[..bounded.len().min(max_url_length)];
    let target_end = bounded
        .find(' ')
        .ok_or_else(|| ParseError::invalid_request_line("missing space after request-target"))?;
    let url = Url::parse(&bounded[..target_end]).ok_or(ParseError::InvalidUri)?;

    let version = &request_line[target_start + target_end + 1..];
    ensure!(
        version.len() == 8
            && version.starts_with("HTTP/1.")
            && matches!(version.as_bytes()[7], b'0' | b'1'),
        ParseError::InvalidVersion
    );

    let (headers, body_start) = decode_headers(src, line_end + 2)?;

    Ok(Request { method, url, version, request_line, headers, body: &src[body_start..] })
}
