//! Response serialization.

use bytes::{BufMut, BytesMut};

use crate::protocol::Response;

/// Serializes `response` into `dst` as
/// `"<version> <code>\r\n"` + headers in insertion order + `"\r\n"` + body.
///
/// `version` is the literal taken from the request (`"HTTP/1.0"` or
/// `"HTTP/1.1"`). The status line carries the numeric code only, without a
/// reason phrase.
pub fn encode_response(response: &Response, version: &str, dst: &mut BytesMut) {
    let mut size = version.len() + 1 + 3 + 2;
    for (name, value) in response.headers.iter() {
        size += name.len() + value.len() + 4;
    }
    size += 2 + response.body.len();
    dst.reserve(size);

    dst.put_slice(version.as_bytes());
    dst.put_slice(b" ");
    dst.put_slice(response.status.as_u16().to_string().as_bytes());
    dst.put_slice(b"\r\n");
    response.headers.serialize(dst);
    dst.put_slice(b"\r\n");
    dst.put_slice(&response.body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_response;
    use crate::protocol::StatusCode;

    fn encoded(response: &Response, version: &str) -> BytesMut {
        let mut dst = BytesMut::new();
        encode_response(response, version, &mut dst);
        dst
    }

    #[test]
    fn exact_bytes_without_reason_phrase() {
        let response = Response::with_body(StatusCode::OK, "hi");
        let dst = encoded(&response, "HTTP/1.1");
        assert_eq!(
            &dst[..],
            b"HTTP/1.1 200\r\nConnection: close\r\nContent-Type: text/plain\r\n\r\nhi".as_slice()
        );
    }

    #[test]
    fn uses_the_given_version() {
        let response = Response::new(StatusCode::NO_CONTENT);
        let dst = encoded(&response, "HTTP/1.0");
        assert!(dst.starts_with(b"HTTP/1.0 204\r\n"));
    }

    #[test]
    fn round_trips_through_the_decoder() {
        let mut response = Response::with_body(StatusCode::CREATED, "payload");
        response.headers.add("X-Extra".to_owned(), "1".to_owned());
        let dst = encoded(&response, "HTTP/1.1");

        let parsed = decode_response(&dst).unwrap();
        assert_eq!(parsed.status, response.status);
        assert_eq!(parsed.body, response.body);
        assert_eq!(
            parsed.headers.iter().collect::<Vec<_>>(),
            response.headers.iter().collect::<Vec<_>>()
        );
    }
}
