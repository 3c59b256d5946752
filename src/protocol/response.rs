use bytes::Bytes;

use crate::protocol::{HeaderMap, StatusCode};

/// An owned response.
///
/// Every constructor defaults `Connection: close`; the ones that take a
/// body without an explicit content type also default
/// `Content-Type: text/plain`.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap<String>,
    pub body: Bytes,
}

impl Response {
    /// An empty response with the given status.
    pub fn new(status: StatusCode) -> Response {
        Response { status, headers: default_headers(), body: Bytes::new() }
    }

    /// A `text/plain` response.
    pub fn with_body(status: StatusCode, body: impl Into<Bytes>) -> Response {
        let mut response = Response { status, headers: default_headers(), body: body.into() };
        response.headers.add("Content-Type".to_owned(), "text/plain".to_owned());
        response
    }

    /// A response with an explicit content type.
    pub fn with_content_type(status: StatusCode, body: impl Into<Bytes>, content_type: &str) -> Response {
        let mut response = Response { status, headers: default_headers(), body: body.into() };
        response.headers.add("Content-Type".to_owned(), content_type.to_owned());
        response
    }
}

impl Default for Response {
    fn default() -> Response {
        Response::new(StatusCode::OK)
    }
}

impl From<&'static str> for Response {
    fn from(body: &'static str) -> Response {
        Response::with_body(StatusCode::OK, body)
    }
}

impl From<String> for Response {
    fn from(body: String) -> Response {
        Response::with_body(StatusCode::OK, body)
    }
}

fn default_headers() -> HeaderMap<String> {
    let mut headers = HeaderMap::new();
    headers.add("Connection".to_owned(), "close".to_owned());
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let response = Response::new(StatusCode::NO_CONTENT);
        assert_eq!(response.headers.get("Connection"), Some("close"));
        assert_eq!(response.headers.get("Content-Type"), None);
        assert!(response.body.is_empty());

        let response = Response::with_body(StatusCode::OK, "hi");
        assert_eq!(response.headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(&response.body[..], b"hi");

        let response = Response::with_content_type(StatusCode::OK, "{}", "application/json");
        assert_eq!(response.headers.get("Content-Type"), Some("application/json"));
    }
}
