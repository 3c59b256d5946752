//! Request serialization, used by the client.

use bytes::{BufMut, BytesMut};

use crate::protocol::{HeaderMap, Method};

/// Serializes a request as `"<METHOD> <target> HTTP/1.1\r\n"` + headers +
/// `"\r\n"` + body.
///
/// When the caller did not set a `Host` header, one is prepended from
/// `host` and `port`; the port is only written when it differs from the
/// scheme's default.
pub fn encode_request<S: AsRef<str>>(
    method: Method,
    target: &str,
    headers: &HeaderMap<S>,
    body: &[u8],
    host: &str,
    port: u16,
    default_port: u16,
    dst: &mut BytesMut,
) {
    dst.reserve(512 + body.len());
    dst.put_slice(method.as_str().as_bytes());
    dst.put_slice(b" ");
    dst.put_slice(target.as_bytes());
    dst.put_slice(b" HTTP/1.1\r\n");
    if !headers.contains("Host") {
        dst.put_slice(b"Host: ");
        dst.put_slice(host.as_bytes());
        if port != default_port {
            dst.put_slice(b":");
            dst.put_slice(port.to_string().as_bytes());
        }
        dst.put_slice(b"\r\n");
    }
    headers.serialize(dst);
    dst.put_slice(b"\r\n");
    dst.put_slice(body);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(headers: &HeaderMap, port: u16, body: &[u8]) -> BytesMut {
        let mut dst = BytesMut::new();
        encode_request(Method::Get, "/x", headers, body, "example.org", port, 80, &mut dst);
        dst
    }

    #[test]
    fn host_is_defaulted() {
        let dst = encoded(&HeaderMap::new(), 80, b"");
        assert_eq!(&dst[..], b"GET /x HTTP/1.1\r\nHost: example.org\r\n\r\n".as_slice());
    }

    #[test]
    fn non_default_port_is_written() {
        let dst = encoded(&HeaderMap::new(), 8080, b"");
        assert_eq!(&dst[..], b"GET /x HTTP/1.1\r\nHost: example.org:8080\r\n\r\n".as_slice());
    }

    #[test]
    fn explicit_host_wins() {
        let mut headers = HeaderMap::new();
        headers.add("Host".to_owned(), "other.example".to_owned());
        let dst = encoded(&headers, 8080, b"");
        assert_eq!(&dst[..], b"GET /x HTTP/1.1\r\nHost: other.example\r\n\r\n".as_slice());
    }

    #[test]
    fn body_follows_the_blank_line() {
        let mut headers = HeaderMap::new();
        headers.add("Content-Length".to_owned(), "5".to_owned());
        let dst = encoded(&headers, 80, b"hello");
        assert_eq!(
            &dst[..],
            b"GET /x HTTP/1.1\r\nHost: example.org\r\nContent-Length: 5\r\n\r\nhello".as_slice()
        );
    }
}
