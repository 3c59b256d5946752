//! Response parsing, used by the client.
//!
//! The status line is `HTTP/1.x SP code [SP reason] \r\n`; the reason
//! phrase is tolerated but ignored (our own serializer does not emit one).
//! Headers follow the same rules as request headers, and everything after
//! the empty line is taken as the (still unbounded) body.

use bytes::Bytes;

use crate::codec::{decode_headers, find_crlf};
use crate::ensure;
use crate::protocol::{HeaderMap, ParseError, Response, StatusCode};

/// Parses a response from `src` into an owned [`Response`].
pub fn decode_response(src: &[u8]) -> Result<Response, ParseError> {
    let line_end = find_crlf(src, 0).ok_or(ParseError::Incomplete)?;
    let status_line = std::str::from_utf8(&src[..line_end])
        .map_err(|_| ParseError::invalid_status_line("not valid utf-8"))?;

    let version_end = status_line
        .find(' ')
        .ok_or_else(|| ParseError::invalid_status_line("missing space after version"))?;
    let version = &status_line[..version_end];
    ensure!(
        version.len() == 8
            && version.starts_with("HTTP/1.")
            && matches!(version.as_bytes()[7], b'0' | b'1'),
        ParseError::InvalidVersion
    );

    let rest = &status_line[version_end + 1..];
    let code_text = match rest.find(' ') {
        Some(space) => &rest[..space],
        None => rest,
    };
    let code = code_text
        .parse::<u16>()
        .map_err(|_| ParseError::invalid_status_line("status code is not a number"))?;

    let (parsed_headers, body_start) = decode_headers(src, line_end + 2)?;
    let mut headers = HeaderMap::new();
    for (name, value) in parsed_headers.iter() {
        headers.add(name.to_owned(), value.to_owned());
    }

    Ok(Response {
        status: StatusCode::new(code),
        headers,
        body: Bytes::copy_from_slice(&src[body_start..]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_reason_phrase() {
        let raw = b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n";
        let response = decode_response(raw).unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.headers.get("content-length"), Some("0"));
        assert!(response.body.is_empty());
    }

    #[test]
    fn without_reason_phrase() {
        let raw = b"HTTP/1.1 200\r\nConnection: close\r\n\r\nhello";
        let response = decode_response(raw).unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(&response.body[..], b"hello");
    }

    #[test]
    fn malformed_status_lines() {
        assert!(decode_response(b"HTTP/1.1\r\n\r\n").is_err());
        assert!(decode_response(b"HTTP/1.1 abc\r\n\r\n").is_err());
        assert!(decode_response(b"ICY 200 OK\r\n\r\n").is_err());
        assert!(matches!(decode_response(b"HTTP/1.1 200"), Err(ParseError::Incomplete)));
    }
}
