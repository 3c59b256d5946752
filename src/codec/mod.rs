//! HTTP/1.1 wire codec.
//!
//! All decoding operates on borrowed byte slices that are expected to hold
//! at least the complete header block; there is no incremental framing.
//! Line endings are strictly `\r\n` and the request-line fields are
//! separated by exactly one SP.

mod request_decoder;
pub use request_decoder::decode_request;

mod request_encoder;
pub use request_encoder::encode_request;

mod response_decoder;
pub use response_decoder::decode_response;

mod response_encoder;
pub use response_encoder::encode_response;

use crate::protocol::{HeaderMap, ParseError};

pub(crate) fn find_crlf(src: &[u8], from: usize) -> Option<usize> {
    if from >= src.len() {
        return None;
    }
    src[from..].windows(2).position(|window| window == b"\r\n").map(|pos| pos + from)
}

pub(crate) fn is_http_whitespace(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

/// Decodes `name: value` header lines starting at `cursor` until the empty
/// line (or the end of the buffer), returning the headers and the offset of
/// the first body byte.
///
/// The value starts after any HTTP whitespace following the colon and ends
/// at the next HTTP whitespace byte. A value with internal whitespace is
/// therefore truncated at its first space; the full RFC value grammar is
/// not implemented.
pub(crate) fn decode_headers(src: &[u8], mut cursor: usize) -> Result<(HeaderMap<&str>, usize), ParseError> {
    let mut headers = HeaderMap::new();
    let mut body_start = src.len();

    while cursor < src.len() {
        let line_end = find_crlf(src, cursor).ok_or(ParseError::Incomplete)?;
        if line_end == cursor {
            // The empty line ends the header block.
            body_start = cursor + 2;
            break;
        }

        let line = std::str::from_utf8(&src[cursor..line_end])
            .map_err(|_| ParseError::invalid_header("header line is not valid utf-8"))?;
        let (name, value) = decode_header_line(line)?;
        headers.add(name, value);
        cursor = line_end + 2;
    }

    Ok((headers, body_start))
}

fn decode_header_line(line: &str) -> Result<(&str, &str), ParseError> {
    let colon = line.find(':').ok_or_else(|| ParseError::invalid_header("missing colon"))?;
    let name = &line[..colon];
    let rest = &line[colon + 1..];
    let value_start = rest.find(|ch| !is_http_whitespace(ch)).unwrap_or(rest.len());
    let rest = &rest[value_start..];
    let value_end = rest.find(is_http_whitespace).unwrap_or(rest.len());
    Ok((name, &rest[..value_end]))
}
