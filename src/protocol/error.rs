//! Error types for HTTP message parsing.

use thiserror::Error;

/// Errors produced while parsing an HTTP request or response.
///
/// At the server boundary every variant collapses into the same fixed
/// `400 Bad Request` answer; the client surfaces the variant through its
/// completion result.
#[derive(Error, Debug)]
pub enum ParseError {
    /// A required `\r\n` delimiter was never found.
    #[error("unexpected end of message")]
    Incomplete,

    /// The request line is malformed.
    #[error("invalid request line: {reason}")]
    InvalidRequestLine { reason: String },

    /// The status line of a response is malformed.
    #[error("invalid status line: {reason}")]
    InvalidStatusLine { reason: String },

    /// Unknown or non-uppercase HTTP method.
    #[error("invalid http method")]
    InvalidMethod,

    /// The request-target could not be parsed.
    #[error("invalid http uri")]
    InvalidUri,

    /// The version field is not exactly `HTTP/1.0` or `HTTP/1.1`.
    #[error("invalid http version")]
    InvalidVersion,

    /// A header line is malformed.
    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },
}

impl ParseError {
    /// Creates a new InvalidRequestLine error
    pub fn invalid_request_line<S: ToString>(reason: S) -> Self {
        Self::InvalidRequestLine { reason: reason.to_string() }
    }

    /// Creates a new InvalidStatusLine error
    pub fn invalid_status_line<S: ToString>(reason: S) -> Self {
        Self::InvalidStatusLine { reason: reason.to_string() }
    }

    /// Creates a new InvalidHeader error
    pub fn invalid_header<S: ToString>(reason: S) -> Self {
        Self::InvalidHeader { reason: reason.to_string() }
    }
}
