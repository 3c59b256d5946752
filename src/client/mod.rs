//! HTTP client.
//!
//! A [`ClientSession`] drives one request at a time through
//! resolve → connect → send → receive. There is no pipelining: `request`
//! borrows the session mutably, so a second request cannot start until the
//! current one completed. A session that completed an exchange keeps its
//! transport, and a later `request` on the same session reuses it.
//!
//! [`request`] is the one-shot entry point: it parses an absolute URL and
//! runs a fresh session for the `http` or `https` scheme.

use std::io;
use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, error};

use crate::codec::{decode_response, encode_request};
use crate::connection::{Connection, Connector, TransportError};
use crate::protocol::{HeaderMap, Method, ParseError, Response, Url};

const RECV_LEN: usize = 1024;

/// Errors delivered as the single completion of a request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The URL did not parse, or its scheme is unsupported.
    #[error("invalid url")]
    InvalidUrl,

    /// Name resolution returned an empty address list.
    #[error("host unreachable")]
    HostUnreachable,

    /// The peer closed the connection mid-exchange.
    #[error("connection closed by peer")]
    PeerClosed,

    /// The response bytes did not parse.
    #[error("invalid response: {source}")]
    InvalidResponse {
        #[from]
        source: ParseError,
    },

    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: TransportError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// A client session against one host and port.
pub struct ClientSession {
    connector: Connector,
    host: String,
    port: u16,
    target_addr: Option<SocketAddr>,
    connection: Option<Connection>,
    request_buf: BytesMut,
    response_buf: BytesMut,
}

impl ClientSession {
    /// Creates a session. Without an explicit port the connector's scheme
    /// default applies (80 plain, 443 TLS).
    pub fn new(connector: Connector, host: impl Into<String>, port: Option<u16>) -> ClientSession {
        let port = port.unwrap_or_else(|| connector.default_port());
        ClientSession {
            connector,
            host: host.into(),
            port,
            target_addr: None,
            connection: None,
            request_buf: BytesMut::with_capacity(512),
            response_buf: BytesMut::new(),
        }
    }

    /// Performs one request and delivers exactly one result.
    ///
    /// The first call resolves and connects; later calls on the same
    /// session reuse the open transport. Any error closes the transport.
    pub async fn request(
        &mut self,
        method: Method,
        target: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<Response, ClientError> {
        self.request_buf.clear();
        encode_request(
            method,
            target,
            headers,
            body,
            &self.host,
            self.port,
            self.connector.default_port(),
            &mut self.request_buf,
        );
        debug!(request = %String::from_utf8_lossy(&self.request_buf), "serialized request");

        let mut connection = match self.connection.take() {
            Some(connection) => connection,
            None => self.establish().await?,
        };

        match self.exchange(&mut connection).await {
            Ok(response) => {
                self.connection = Some(connection);
                Ok(response)
            }
            // Dropping the connection closes it.
            Err(e) => Err(e),
        }
    }

    async fn establish(&mut self) -> Result<Connection, ClientError> {
        let addr = match self.target_addr {
            Some(addr) => addr,
            None => {
                let addr = self.resolve().await?;
                self.target_addr = Some(addr);
                addr
            }
        };

        let stream = TcpStream::connect(addr).await.map_err(|e| {
            error!(cause = %e, "error connecting");
            ClientError::from(e)
        })?;
        Ok(self.connector.connect(stream, &self.host).await?)
    }

    /// Resolution runs on the runtime's blocking pool; only the first
    /// returned address is used.
    async fn resolve(&self) -> Result<SocketAddr, ClientError> {
        let mut addrs = lookup_host((self.host.as_str(), self.port)).await.map_err(|e| {
            error!(cause = %e, "error resolving");
            ClientError::from(e)
        })?;
        addrs.next().ok_or(ClientError::HostUnreachable)
    }

    async fn exchange(&mut self, connection: &mut Connection) -> Result<Response, ClientError> {
        let mut cursor = 0;
        while cursor < self.request_buf.len() {
            match connection.send(&self.request_buf[cursor..]).await {
                Ok(0) => return Err(ClientError::PeerClosed),
                Ok(sent) => cursor += sent,
                Err(e) => {
                    error!(cause = %e, "error sending request");
                    return Err(e.into());
                }
            }
        }

        self.response_buf.clear();
        self.response_buf.resize(RECV_LEN, 0);
        let read = connection.recv(&mut self.response_buf[..], None).await?;
        if read == 0 {
            return Err(ClientError::PeerClosed);
        }
        self.response_buf.truncate(read);

        let mut response = decode_response(&self.response_buf)?;

        if let Some(value) = response.headers.get("Content-Length") {
            let length = value.parse::<u64>().map_err(|_| ClientError::InvalidResponse {
                source: ParseError::invalid_header("content-length is not a number"),
            })? as usize;

            if response.body.len() > length {
                response.body = response.body.slice(..length);
            } else if response.body.len() < length {
                response.body = read_remaining_body(connection, &response.body, length).await?;
            }
        }

        Ok(response)
    }
}

/// Reads body bytes beyond what arrived with the header read, until the
/// declared length is reached.
async fn read_remaining_body(
    connection: &mut Connection,
    initial: &[u8],
    length: usize,
) -> Result<Bytes, ClientError> {
    let mut body = BytesMut::with_capacity(length);
    body.extend_from_slice(initial);
    while body.len() < length {
        let filled = body.len();
        body.resize(length, 0);
        let read = connection.recv(&mut body[filled..], None).await?;
        if read == 0 {
            return Err(ClientError::PeerClosed);
        }
        body.truncate(filled + read);
    }
    Ok(body.freeze())
}

/// Parses `url` and performs a single request against it.
///
/// Recognized schemes are `http` (port 80) and, with the `tls` feature,
/// `https` (port 443); anything else fails with
/// [`ClientError::InvalidUrl`].
pub async fn request(
    method: Method,
    url: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response, ClientError> {
    let url = match Url::parse_absolute(url) {
        Some(url) => url,
        None => {
            error!("could not parse request url");
            return Err(ClientError::InvalidUrl);
        }
    };
    let host = url.host.ok_or(ClientError::InvalidUrl)?;

    match url.scheme {
        Some("http") => {
            let mut session = ClientSession::new(Connector::Plain, host, url.port);
            session.request(method, url.target_raw, headers, body).await
        }
        #[cfg(feature = "tls")]
        Some("https") => {
            let connector = Connector::Tls(crate::connection::tls::client_connector());
            let mut session = ClientSession::new(connector, host, url.port);
            session.request(method, url.target_raw, headers, body).await
        }
        _ => {
            error!("invalid scheme in request url");
            Err(ClientError::InvalidUrl)
        }
    }
}
