//! The per-connection server session.
//!
//! One session owns one transport and serves requests on it until
//! keep-alive ends, a deadline expires or the transport fails. The state
//! machine per request is: read headers → (read body) → handle → send →
//! keep-alive or tear down. There is never more than one outstanding
//! transport operation per session.

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::codec::{decode_request, encode_response};
use crate::connection::{Connection, TransportError};
use crate::handler::Handler;
use crate::protocol::{Request, StatusCode};
use crate::server::metrics::{InProgressHandle, Metrics};
use crate::server::ServerConfig;

/// The one answer for requests the server refuses to interpret.
const BAD_REQUEST_RESPONSE: &[u8] = b"HTTP/1.1 400 Bad Request\r\nConnection: close\r\n\r\n";

enum NextStep {
    KeepAlive,
    Shutdown,
    Close,
}

enum SendOutcome {
    Sent,
    PeerClosed,
    Failed,
}

pub(crate) struct Session<H> {
    connection: Connection,
    handler: Arc<H>,
    remote_addr: String,
    // The parsed request is a bundle of views into the header buffer. That
    // buffer must never be resized while a request borrows it, which is why
    // a body that outgrows the initial read continues into the separate
    // body buffer.
    header_buf: BytesMut,
    body_buf: BytesMut,
    response_buf: BytesMut,
    config: Arc<ServerConfig>,
    _in_progress: InProgressHandle,
}

impl<H: Handler> Session<H> {
    pub(crate) fn new(
        connection: Connection,
        handler: Arc<H>,
        remote_addr: String,
        config: Arc<ServerConfig>,
    ) -> Session<H> {
        Session {
            connection,
            handler,
            remote_addr,
            header_buf: BytesMut::with_capacity(config.max_request_header_size),
            body_buf: BytesMut::with_capacity(config.max_request_body_size),
            response_buf: BytesMut::new(),
            config,
            _in_progress: Metrics::global().conn_active.track_in_progress(),
        }
    }

    /// Serves requests until the connection is done, then tears it down.
    /// Dropping the session closes the transport.
    pub(crate) async fn process(mut self) {
        loop {
            match self.serve_one().await {
                NextStep::KeepAlive => continue,
                NextStep::Shutdown => {
                    // There is no way to recover from a failed shutdown, so
                    // close either way.
                    let _ = self.connection.shutdown().await;
                    return;
                }
                NextStep::Close => return,
            }
        }
    }

    async fn serve_one(&mut self) -> NextStep {
        self.header_buf.clear();
        self.body_buf.clear();
        let request_start = Instant::now();
        let deadline = request_start + Duration::from_millis(self.config.full_read_timeout_ms);
        let config = &self.config;

        // One bounded read for the request line and all headers.
        self.header_buf.resize(config.max_request_header_size, 0);
        let read = match self.connection.recv(&mut self.header_buf[..], Some(deadline)).await {
            Ok(0) => return NextStep::Close,
            Ok(read) => read,
            Err(TransportError::TimedOut) => {
                Metrics::global().recv_errors.inc("timed out");
                debug!(remote = %self.remote_addr, "read deadline expired");
                return NextStep::Shutdown;
            }
            Err(e) => {
                // Among the errors here are resets and, on TLS, states in
                // which no further I/O (shutdown included) is safe.
                Metrics::global().recv_errors.inc(&e.to_string());
                error!(cause = %e, "error in recv (headers)");
                return NextStep::Close;
            }
        };
        self.header_buf.truncate(read);

        let mut request = match decode_request(&self.header_buf, config.max_url_length) {
            Ok(request) => request,
            Err(e) => {
                access_log(
                    config.access_log,
                    &self.remote_addr,
                    "INVALID REQUEST",
                    StatusCode::BAD_REQUEST,
                    0,
                );
                Metrics::global().req_errors.inc("parse error");
                debug!(cause = %e, "could not parse request");
                return send_bad_request(&mut self.connection, &mut self.response_buf).await;
            }
        };

        if let Some(value) = request.content_length() {
            let length = match value.parse::<u64>() {
                Ok(length) => length as usize,
                Err(_) => {
                    access_log(
                        config.access_log,
                        &self.remote_addr,
                        "INVALID REQUEST (Content-Length)",
                        StatusCode::BAD_REQUEST,
                        0,
                    );
                    Metrics::global().req_errors.inc("invalid length");
                    return send_bad_request(&mut self.connection, &mut self.response_buf).await;
                }
            };

            if length > config.max_request_body_size {
                access_log(
                    config.access_log,
                    &self.remote_addr,
                    "INVALID REQUEST (body size)",
                    StatusCode::BAD_REQUEST,
                    0,
                );
                Metrics::global().req_errors.inc("body too large");
                return send_bad_request(&mut self.connection, &mut self.response_buf).await;
            } else if request.body.len() < length {
                // Continue the body in its own buffer; growing the header
                // buffer would invalidate the request's views into it.
                self.body_buf.extend_from_slice(request.body);
                request.body = &[];

                while self.body_buf.len() < length {
                    let filled = self.body_buf.len();
                    self.body_buf.resize(length, 0);
                    let read = match self
                        .connection
                        .recv(&mut self.body_buf[filled..], Some(deadline))
                        .await
                    {
                        Ok(0) => return NextStep::Close,
                        Ok(read) => read,
                        Err(TransportError::TimedOut) => {
                            Metrics::global().recv_errors.inc("timed out");
                            debug!(remote = %self.remote_addr, "read deadline expired (body)");
                            return NextStep::Shutdown;
                        }
                        Err(e) => {
                            Metrics::global().recv_errors.inc(&e.to_string());
                            error!(cause = %e, "error in recv (body)");
                            return NextStep::Close;
                        }
                    };
                    self.body_buf.truncate(filled + read);
                }
                request.body = &self.body_buf[..];
            } else {
                let body = request.body;
                request.body = &body[..length];
            }
        }

        Metrics::global().reqs_total.inc();
        let response = self.handler.call(&request).await;

        access_log(
            config.access_log,
            &self.remote_addr,
            request.request_line,
            response.status,
            response.body.len(),
        );

        self.response_buf.clear();
        encode_response(&response, request.version, &mut self.response_buf);

        let keep_alive = wants_keep_alive(&request);
        let response_size = self.response_buf.len();
        let outcome = send_all(&mut self.connection, &self.response_buf).await;

        Metrics::global().resp_total.inc();
        Metrics::global().resp_bytes.add(response_size as u64);
        debug!(
            remote = %self.remote_addr,
            status = response.status.as_u16(),
            size = response_size,
            elapsed_ms = request_start.elapsed().as_millis() as u64,
            "request finished"
        );

        match outcome {
            SendOutcome::Sent => {
                if keep_alive {
                    NextStep::KeepAlive
                } else {
                    NextStep::Shutdown
                }
            }
            SendOutcome::PeerClosed | SendOutcome::Failed => NextStep::Close,
        }
    }
}

/// `Connection: close` wins over `keep-alive`; otherwise the version
/// decides. Values are matched by substring, lowercase only, which is what
/// peers send in practice.
fn wants_keep_alive(request: &Request<'_>) -> bool {
    if let Some(value) = request.headers.get("Connection") {
        if value.contains("close") {
            return false;
        }
        if value.contains("keep-alive") {
            return true;
        }
    }
    request.version == "HTTP/1.1"
}

fn access_log(
    enabled: bool,
    remote_addr: &str,
    request_line: &str,
    status: StatusCode,
    response_body_size: usize,
) {
    if enabled {
        info!("{} \"{}\" {} {}", remote_addr, request_line, status, response_body_size);
    }
}

async fn send_bad_request(connection: &mut Connection, response_buf: &mut BytesMut) -> NextStep {
    response_buf.clear();
    response_buf.extend_from_slice(BAD_REQUEST_RESPONSE);
    match send_all(connection, response_buf).await {
        SendOutcome::Sent => NextStep::Shutdown,
        SendOutcome::PeerClosed | SendOutcome::Failed => NextStep::Close,
    }
}

async fn send_all(connection: &mut Connection, buf: &[u8]) -> SendOutcome {
    let mut cursor = 0;
    while cursor < buf.len() {
        match connection.send(&buf[cursor..]).await {
            // A zero-byte send means the peer closed mid-write; shutdown is
            // not possible anymore.
            Ok(0) => return SendOutcome::PeerClosed,
            Ok(sent) => cursor += sent,
            Err(e) => {
                Metrics::global().send_errors.inc(&e.to_string());
                error!(cause = %e, "error in send");
                return SendOutcome::Failed;
            }
        }
    }
    SendOutcome::Sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_request;

    fn parsed(raw: &[u8]) -> Request<'_> {
        decode_request(raw, 512).unwrap()
    }

    #[test]
    fn keep_alive_follows_the_request() {
        assert!(wants_keep_alive(&parsed(b"GET / HTTP/1.1\r\n\r\n")));
        assert!(!wants_keep_alive(&parsed(b"GET / HTTP/1.0\r\n\r\n")));
        assert!(!wants_keep_alive(&parsed(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n")));
        assert!(wants_keep_alive(&parsed(b"GET / HTTP/1.0\r\nConnection: keep-alive\r\n\r\n")));
        // close wins when both appear
        assert!(!wants_keep_alive(&parsed(
            b"GET / HTTP/1.1\r\nConnection: keep-alive,close\r\n\r\n"
        )));
    }
}
